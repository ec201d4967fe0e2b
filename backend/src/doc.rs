//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint, the shared error envelope and the
//! session cookie security scheme. Swagger UI serves it in debug builds and
//! `openapi-dump` prints it for external tooling. The WebSocket stream at
//! `/ws/profile` is not described here.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, SubscriptionTier, UserProfile};
use crate::inbound::http::accounts::CredentialsRequest;
use crate::inbound::http::checkout::{
    CheckoutConfig, CheckoutSessionBody, CheckoutSessionCreated, CheckoutSessionFailure,
    PlanPayload, PlanView,
};
use crate::inbound::http::profile::SubscriptionChangeRequest;
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;
use crate::inbound::http::symptoms::{NormalizeSymptomsRequest, NormalizeSymptomsResponse};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE_NAME,
                "Encrypted session cookie issued by POST /api/v1/login or /api/v1/register.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Healthsyntra backend API",
        description = "Symptom normalization, account and subscription management, and hosted checkout."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::symptoms::normalize_symptoms,
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::profile::current_profile,
        crate::inbound::http::profile::update_subscription,
        crate::inbound::http::profile::delete_account,
        crate::inbound::http::checkout::create_checkout_session,
        crate::inbound::http::checkout::list_plans,
        crate::inbound::http::checkout::checkout_config,
        crate::inbound::http::checkout::start_checkout,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        UserProfile,
        SubscriptionTier,
        CredentialsRequest,
        SubscriptionChangeRequest,
        NormalizeSymptomsRequest,
        NormalizeSymptomsResponse,
        CheckoutSessionBody,
        PlanPayload,
        CheckoutSessionCreated,
        CheckoutSessionFailure,
        PlanView,
        CheckoutConfig,
    )),
    tags(
        (name = "symptoms", description = "Symptom normalization"),
        (name = "accounts", description = "Sign-up, sign-in and sign-out"),
        (name = "profile", description = "The signed-in user's profile and subscription"),
        (name = "checkout", description = "Hosted subscription checkout"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
