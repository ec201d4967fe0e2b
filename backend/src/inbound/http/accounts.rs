//! Account handlers.
//!
//! ```text
//! POST /api/v1/register {"email":"ada@example.com","password":"hunter22"}
//! POST /api/v1/login {"email":"ada@example.com","password":"hunter22"}
//! POST /api/v1/logout
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{
    Credentials, CredentialsValidationError, Error, SignedIn, UserProfile,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, empty_field_error, invalid_field_error, require};

const EMAIL: FieldName = FieldName::new("email");
const PASSWORD: FieldName = FieldName::new("password");

/// Sign-up and sign-in request body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CredentialsRequest {
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    #[schema(example = "hunter22")]
    pub password: Option<String>,
}

impl TryFrom<CredentialsRequest> for Credentials {
    type Error = Error;

    fn try_from(value: CredentialsRequest) -> Result<Self, Self::Error> {
        let email = require(value.email, EMAIL)?;
        let password = require(value.password, PASSWORD)?;
        Credentials::try_from_parts(&email, &password).map_err(map_credentials_error)
    }
}

fn map_credentials_error(err: CredentialsValidationError) -> Error {
    match err {
        CredentialsValidationError::EmptyPassword => empty_field_error(PASSWORD),
        CredentialsValidationError::Email(inner) => invalid_field_error(EMAIL, inner.to_string()),
    }
}

fn establish(session: &SessionContext, signed_in: SignedIn) -> ApiResult<web::Json<UserProfile>> {
    session.persist_identity(&signed_in.session)?;
    Ok(web::Json(signed_in.profile))
}

/// Create an account with a free-tier profile and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Registered", body = UserProfile,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid input or weak password", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 502, description = "Identity provider failure", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<web::Json<UserProfile>> {
    let credentials = Credentials::try_from(payload.into_inner())?;
    let signed_in = state.accounts.register(&credentials).await?;
    establish(&session, signed_in)
}

/// Sign in, creating the free-tier profile on first login.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = UserProfile,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid input", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 502, description = "Identity provider failure", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<web::Json<UserProfile>> {
    let credentials = Credentials::try_from(payload.into_inner())?;
    let signed_in = state.accounts.login(&credentials).await?;
    establish(&session, signed_in)
}

/// Drop the signed-in identity.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Signed out")),
    tags = ["accounts"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> ApiResult<HttpResponse> {
    if let Some(identity) = session.identity()? {
        info!(user_id = %identity.user_id(), "signed out");
    }
    session.clear();
    Ok(HttpResponse::NoContent().finish())
}
