//! HTTP inbound adapter exposing REST endpoints.

pub mod accounts;
pub mod checkout;
pub mod error;
pub mod health;
pub mod profile;
pub mod session;
pub mod session_config;
pub mod state;
pub mod symptoms;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

use actix_web::{HttpRequest, error::JsonPayloadError, web};

use crate::domain::Error;

pub use error::ApiResult;

/// JSON extractor settings shared by every handler.
///
/// Unreadable bodies surface as `invalid_request` in the shared error
/// envelope instead of actix's plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error_handler)
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid JSON body: {err}")).into()
}

/// Register the versioned REST handlers on an `/api/v1` scope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(symptoms::normalize_symptoms)
        .service(accounts::register)
        .service(accounts::login)
        .service(accounts::logout)
        .service(profile::current_profile)
        .service(profile::update_subscription)
        .service(profile::delete_account)
        .service(checkout::list_plans)
        .service(checkout::checkout_config)
        .service(checkout::start_checkout);
}
