//! Form encoding and response shapes for `POST /v1/checkout/sessions`.

use serde::Deserialize;

use crate::domain::CheckoutSessionRequest;

/// Flatten a session request into Stripe's bracketed form keys.
pub(super) fn session_form(request: &CheckoutSessionRequest) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "subscription".to_owned()),
        ("payment_method_types[0]", "card".to_owned()),
        (
            "line_items[0][price_data][currency]",
            request.currency.to_owned(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            request.product_name.clone(),
        ),
        (
            "line_items[0][price_data][product_data][description]",
            request.product_description.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]",
            request.unit_amount.value().to_string(),
        ),
        (
            "line_items[0][price_data][recurring][interval]",
            request.interval.as_str().to_owned(),
        ),
        ("line_items[0][quantity]", request.quantity.to_string()),
        ("customer_email", request.customer_email.as_str().to_owned()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
    ]
}

#[derive(Debug, Deserialize)]
pub(super) struct CheckoutSessionDto {
    pub(super) id: String,
    pub(super) url: Option<String>,
}

/// `{ "error": { "message": ..., "type": ... } }`
#[derive(Debug, Deserialize)]
pub(super) struct StripeErrorEnvelopeDto {
    pub(super) error: StripeErrorDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct StripeErrorDto {
    pub(super) message: Option<String>,
    #[serde(rename = "type")]
    pub(super) kind: Option<String>,
}
