//! Reqwest-backed `CheckoutGateway` creating Stripe Checkout sessions.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{CheckoutSessionDto, StripeErrorEnvelopeDto, session_form};
use crate::domain::ports::{CheckoutGateway, CheckoutGatewayError};
use crate::domain::{CheckoutSession, CheckoutSessionId, CheckoutSessionRequest, TraceId};
use crate::outbound::http_support::{client_with_timeout, status_message};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";
const IDEMPOTENCY_OPERATION: &str = "checkout-session";

/// Secret key and API root for the Stripe REST API.
#[derive(Clone)]
pub struct StripeSettings {
    pub secret_key: Zeroizing<String>,
    /// Normally `https://api.stripe.com`.
    pub api_base: Url,
    pub timeout: Duration,
}

/// Creates subscription-mode Checkout sessions.
pub struct StripeCheckoutGateway {
    client: Client,
    endpoint: Url,
    secret_key: Zeroizing<String>,
}

impl StripeCheckoutGateway {
    /// # Errors
    ///
    /// Returns [`CheckoutGatewayError::Transport`] when the endpoint or the
    /// client cannot be built.
    pub fn new(settings: StripeSettings) -> Result<Self, CheckoutGatewayError> {
        let endpoint = sessions_endpoint(&settings.api_base)?;
        let client = client_with_timeout(settings.timeout)
            .map_err(|err| CheckoutGatewayError::transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            secret_key: settings.secret_key,
        })
    }
}

#[async_trait]
impl CheckoutGateway for StripeCheckoutGateway {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, CheckoutGatewayError> {
        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.secret_key.as_str())
            .form(&session_form(request));
        if let Some(key) = TraceId::current().map(|id| id.idempotency_key(IDEMPOTENCY_OPERATION)) {
            builder = builder.header(IDEMPOTENCY_HEADER, key);
        }
        let response = builder.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        decode_session(body.as_ref())
    }
}

fn sessions_endpoint(api_base: &Url) -> Result<Url, CheckoutGatewayError> {
    let base = api_base.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/v1/checkout/sessions")).map_err(|err| {
        CheckoutGatewayError::transport(format!("invalid checkout endpoint: {err}"))
    })
}

fn decode_session(body: &[u8]) -> Result<CheckoutSession, CheckoutGatewayError> {
    let dto: CheckoutSessionDto = serde_json::from_slice(body).map_err(|err| {
        CheckoutGatewayError::decode(format!("invalid checkout session payload: {err}"))
    })?;
    let id = CheckoutSessionId::new(dto.id)
        .map_err(|err| CheckoutGatewayError::decode(err.to_string()))?;
    let url = dto
        .url
        .map(|raw| Url::parse(&raw))
        .transpose()
        .map_err(|err| CheckoutGatewayError::decode(format!("invalid hosted page url: {err}")))?;
    Ok(CheckoutSession { id, url })
}

fn map_transport_error(error: reqwest::Error) -> CheckoutGatewayError {
    if error.is_timeout() {
        CheckoutGatewayError::timeout(error.to_string())
    } else {
        CheckoutGatewayError::transport(error.to_string())
    }
}

/// Stripe error envelopes surface their own message; anything else is
/// reported by status.
fn map_status_error(status: StatusCode, body: &[u8]) -> CheckoutGatewayError {
    if let Ok(envelope) = serde_json::from_slice::<StripeErrorEnvelopeDto>(body) {
        let message = envelope
            .error
            .message
            .or(envelope.error.kind)
            .unwrap_or_else(|| status_message(status, &[]));
        return CheckoutGatewayError::rejected(message);
    }
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            CheckoutGatewayError::timeout(status_message(status, body))
        }
        _ if status.is_client_error() => CheckoutGatewayError::rejected(status_message(status, body)),
        _ => CheckoutGatewayError::transport(status_message(status, body)),
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for form encoding and response mapping helpers.

    use super::*;
    use crate::domain::{CheckoutDraft, CheckoutPlan, CheckoutRequest, EmailAddress, PaidTier};
    use rstest::rstest;
    use std::collections::HashMap;

    fn session_request() -> CheckoutSessionRequest {
        let draft = CheckoutDraft::for_plan(
            &CheckoutPlan::for_tier(PaidTier::Premium),
            &EmailAddress::new("ada@example.com").expect("email"),
        );
        let request = CheckoutRequest::try_from(draft).expect("valid request");
        let base = Url::parse("https://app.example.test").expect("url");
        CheckoutSessionRequest::monthly_subscription(&request, &base).expect("session request")
    }

    #[test]
    fn form_encodes_a_single_monthly_line_item() {
        let form: HashMap<_, _> = session_form(&session_request()).into_iter().collect();

        assert_eq!(form["mode"], "subscription");
        assert_eq!(form["payment_method_types[0]"], "card");
        assert_eq!(form["line_items[0][price_data][currency]"], "usd");
        assert_eq!(
            form["line_items[0][price_data][product_data][name]"],
            "Premium Plan"
        );
        assert_eq!(form["line_items[0][price_data][unit_amount]"], "1999");
        assert_eq!(
            form["line_items[0][price_data][recurring][interval]"],
            "month"
        );
        assert_eq!(form["line_items[0][quantity]"], "1");
        assert_eq!(form["customer_email"], "ada@example.com");
        assert_eq!(
            form["success_url"],
            "https://app.example.test/checkout/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(form["cancel_url"], "https://app.example.test/checkout/cancel");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let base = Url::parse("https://api.stripe.com/").expect("url");
        assert_eq!(
            sessions_endpoint(&base).expect("endpoint").as_str(),
            "https://api.stripe.com/v1/checkout/sessions"
        );
    }

    #[test]
    fn decodes_session_id_and_hosted_url() {
        let session = decode_session(
            br#"{"id": "cs_test_123", "url": "https://checkout.stripe.com/c/pay/cs_test_123", "object": "checkout.session"}"#,
        )
        .expect("session");
        assert_eq!(session.id.as_str(), "cs_test_123");
        assert_eq!(
            session.url.map(String::from).as_deref(),
            Some("https://checkout.stripe.com/c/pay/cs_test_123")
        );
    }

    #[rstest]
    #[case(br#"{"url": null}"#.as_slice())]
    #[case(br#"{"id": "", "url": null}"#.as_slice())]
    #[case(br#"{"id": "cs_1", "url": "not a url"}"#.as_slice())]
    fn malformed_sessions_map_to_decode(#[case] body: &[u8]) {
        assert!(matches!(
            decode_session(body),
            Err(CheckoutGatewayError::Decode { .. })
        ));
    }

    #[test]
    fn error_envelopes_keep_stripe_message_verbatim() {
        let error = map_status_error(
            StatusCode::BAD_REQUEST,
            br#"{"error": {"message": "No such price", "type": "invalid_request_error"}}"#,
        );
        assert_eq!(error, CheckoutGatewayError::rejected("No such price"));
        assert_eq!(error.to_string(), "No such price");
    }

    #[rstest]
    #[case(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case(StatusCode::UNAUTHORIZED, "Rejected")]
    #[case(StatusCode::BAD_GATEWAY, "Transport")]
    fn non_envelope_statuses_map_by_class(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, b"<html>oops</html>");
        let matched = match expected {
            "Timeout" => matches!(error, CheckoutGatewayError::Timeout { .. }),
            "Rejected" => matches!(error, CheckoutGatewayError::Rejected { .. }),
            "Transport" => matches!(error, CheckoutGatewayError::Transport { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} mapped to {error:?}");
    }
}
