//! Profile and subscription handlers for the signed-in user.
//!
//! ```text
//! GET    /api/v1/users/me/profile
//! PUT    /api/v1/users/me/subscription {"plan":"premium"}
//! DELETE /api/v1/users/me
//! ```

use actix_web::{HttpResponse, delete, get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, PaidTier, UserProfile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error, require};

const PLAN: FieldName = FieldName::new("plan");

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SubscriptionChangeRequest {
    /// `standard` or `premium`.
    #[schema(example = "premium")]
    pub plan: Option<String>,
}

/// Current profile document.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/profile",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "No profile document", body = Error),
        (status = 503, description = "Profile store unavailable", body = Error)
    ),
    tags = ["profile"],
    operation_id = "currentProfile"
)]
#[get("/users/me/profile")]
pub async fn current_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserProfile>> {
    let identity = session.require_identity()?;
    let profile = state
        .accounts
        .profile(&identity)
        .await?
        .ok_or_else(|| Error::not_found("Profile not found."))?;
    Ok(web::Json(profile))
}

/// Move the signed-in user to a paid tier.
#[utoipa::path(
    put,
    path = "/api/v1/users/me/subscription",
    request_body = SubscriptionChangeRequest,
    responses(
        (status = 204, description = "Tier updated"),
        (status = 400, description = "Missing or unknown plan", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Write rejected by the store", body = Error),
        (status = 404, description = "No profile document", body = Error)
    ),
    tags = ["profile"],
    operation_id = "updateSubscription"
)]
#[put("/users/me/subscription")]
pub async fn update_subscription(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SubscriptionChangeRequest>,
) -> ApiResult<HttpResponse> {
    let identity = session.require_identity()?;
    let raw = require(payload.into_inner().plan, PLAN)?;
    let tier = raw
        .parse::<PaidTier>()
        .map_err(|err| invalid_field_error(PLAN, err.to_string()))?;
    state.accounts.set_tier(&identity, tier).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete the identity and its profile, then sign out.
///
/// Needs a recent sign-in; otherwise `401` with code
/// `reauthentication_required` and nothing is deleted.
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Not signed in or sign-in too old", body = Error),
        (status = 502, description = "Identity provider failure", body = Error)
    ),
    tags = ["profile"],
    operation_id = "deleteAccount"
)]
#[delete("/users/me")]
pub async fn delete_account(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let identity = session.require_identity()?;
    state.accounts.delete_account(&identity).await?;
    session.clear();
    Ok(HttpResponse::NoContent().finish())
}
