//! Checkout endpoints.
//!
//! ```text
//! POST /api/stripe/checkout-session {"plan":{"name":"Standard","price":9.99},"userEmail":"ada@example.com"}
//! GET  /api/v1/checkout/plans
//! GET  /api/v1/checkout/config
//! POST /api/v1/checkout/premium
//! ```
//!
//! The first route keeps the browser-facing `{ sessionId }` / `{ error }`
//! contract; the versioned routes use the shared error envelope.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::domain::{CheckoutDraft, CheckoutError, CheckoutPlan, Error, PaidTier};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error};

const MISSING_INPUT_MESSAGE: &str = "Missing plan information or user email.";
const MISSING_SECRET_MESSAGE: &str = "Server configuration error: Stripe secret key is not set.";
const PLAN: FieldName = FieldName::new("plan");

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PlanPayload {
    #[schema(example = "Standard")]
    pub name: Option<String>,
    /// Monthly price in dollars.
    #[schema(example = 9.99)]
    pub price: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionBody {
    pub plan: Option<PlanPayload>,
    #[schema(example = "ada@example.com")]
    pub user_email: Option<String>,
}

impl From<CheckoutSessionBody> for CheckoutDraft {
    fn from(body: CheckoutSessionBody) -> Self {
        let plan = body.plan.unwrap_or_default();
        Self {
            plan_name: plan.name,
            price: plan.price,
            customer_email: body.user_email,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionCreated {
    #[schema(example = "cs_test_a1b2c3")]
    pub session_id: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CheckoutSessionFailure {
    pub error: String,
}

fn failure(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(CheckoutSessionFailure {
        error: message.into(),
    })
}

/// Create a hosted subscription checkout session.
///
/// Malformed JSON is treated like missing input.
#[utoipa::path(
    post,
    path = "/api/stripe/checkout-session",
    request_body = CheckoutSessionBody,
    responses(
        (status = 200, description = "Session created", body = CheckoutSessionCreated),
        (status = 400, description = "Missing plan information or email", body = CheckoutSessionFailure),
        (status = 500, description = "Missing secret key or gateway failure", body = CheckoutSessionFailure)
    ),
    tags = ["checkout"],
    operation_id = "createCheckoutSession",
    security([])
)]
#[post("/api/stripe/checkout-session")]
pub async fn create_checkout_session(state: web::Data<HttpState>, body: web::Bytes) -> HttpResponse {
    let draft = serde_json::from_slice::<CheckoutSessionBody>(&body)
        .map(CheckoutDraft::from)
        .unwrap_or_else(|err| {
            warn!(error = %err, "unreadable checkout body");
            CheckoutDraft::default()
        });

    match state.checkout.start_checkout(draft).await {
        Ok(session) => HttpResponse::Ok().json(CheckoutSessionCreated {
            session_id: session.id.to_string(),
        }),
        Err(CheckoutError::Configuration) => {
            error!("payment gateway secret key is not set");
            failure(StatusCode::INTERNAL_SERVER_ERROR, MISSING_SECRET_MESSAGE)
        }
        Err(CheckoutError::Validation { message }) => {
            warn!(%message, "checkout input rejected");
            failure(StatusCode::BAD_REQUEST, MISSING_INPUT_MESSAGE)
        }
        Err(gateway) => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Stripe Error: {gateway}"),
        ),
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    #[schema(value_type = String, example = "standard")]
    pub id: PaidTier,
    #[schema(example = "Standard")]
    pub name: String,
    #[schema(example = 9.99)]
    pub monthly_price: f64,
}

impl From<CheckoutPlan> for PlanView {
    fn from(plan: CheckoutPlan) -> Self {
        Self {
            id: plan.id(),
            name: plan.name().as_str().to_owned(),
            monthly_price: plan.monthly_price().value(),
        }
    }
}

/// The paid plans on offer.
#[utoipa::path(
    get,
    path = "/api/v1/checkout/plans",
    responses((status = 200, description = "Plan catalogue", body = [PlanView])),
    tags = ["checkout"],
    operation_id = "listPlans",
    security([])
)]
#[get("/checkout/plans")]
pub async fn list_plans() -> web::Json<Vec<PlanView>> {
    web::Json(
        CheckoutPlan::catalogue()
            .into_iter()
            .map(PlanView::from)
            .collect(),
    )
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutConfig {
    #[schema(example = "pk_test_123")]
    pub publishable_key: String,
}

/// Client-side gateway key.
#[utoipa::path(
    get,
    path = "/api/v1/checkout/config",
    responses(
        (status = 200, description = "Publishable key", body = CheckoutConfig),
        (status = 500, description = "Key not configured", body = Error)
    ),
    tags = ["checkout"],
    operation_id = "checkoutConfig",
    security([])
)]
#[get("/checkout/config")]
pub async fn checkout_config(state: web::Data<HttpState>) -> ApiResult<web::Json<CheckoutConfig>> {
    let publishable_key = state.checkout.publishable_key().ok_or_else(|| {
        Error::from(CheckoutError::client_redirect(
            "payment gateway publishable key is not configured",
        ))
    })?;
    Ok(web::Json(CheckoutConfig { publishable_key }))
}

/// Start checkout for the signed-in user and redirect to the hosted page.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/{plan}",
    params(("plan" = String, Path, description = "`standard` or `premium`")),
    responses(
        (status = 303, description = "Redirect to the hosted checkout page"),
        (status = 400, description = "Unknown plan", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 500, description = "Checkout not configured", body = Error),
        (status = 502, description = "Gateway failure", body = Error)
    ),
    tags = ["checkout"],
    operation_id = "startCheckout"
)]
#[post("/checkout/{plan}")]
pub async fn start_checkout(
    state: web::Data<HttpState>,
    session: SessionContext,
    plan: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let identity = session.require_identity()?;
    let tier = plan
        .parse::<PaidTier>()
        .map_err(|err| invalid_field_error(PLAN, err.to_string()))?;
    let draft = CheckoutDraft::for_plan(&CheckoutPlan::for_tier(tier), identity.email());
    let checkout = state.checkout.start_checkout(draft).await?;
    let target = state.checkout.redirect_url(&checkout)?;
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, target.as_str()))
        .finish())
}
