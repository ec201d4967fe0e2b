//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::{HttpResponse, web};

use crate::domain::Error;
use crate::domain::ports::{MockAccountCommand, MockCheckoutInitiator, MockSymptomNormalizer};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::test_support::session_for;

/// Path of the fixture sign-in route added by [`fixture_login_route`].
pub const FIXTURE_LOGIN_PATH: &str = "/test/login";

/// Session middleware with a fresh key, cookie name `session` and `Secure`
/// disabled for plain-HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// `GET /test/login/{uid}` signs `uid` in with [`session_for`].
pub fn fixture_login_route(cfg: &mut web::ServiceConfig) {
    cfg.route(
        &format!("{FIXTURE_LOGIN_PATH}/{{uid}}"),
        web::get().to(|session: SessionContext, uid: web::Path<String>| async move {
            session.persist_identity(&session_for(&uid))?;
            Ok::<_, Error>(HttpResponse::Ok().finish())
        }),
    );
}

/// The `session` cookie set by `response`.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Mocks to install in [`http_state`]; absent entries get a mock with no
/// expectations, so any call fails the test.
#[derive(Default)]
pub struct StateOverrides {
    pub symptoms: Option<MockSymptomNormalizer>,
    pub checkout: Option<MockCheckoutInitiator>,
    pub accounts: Option<MockAccountCommand>,
}

/// Handler state built from mocks.
pub fn http_state(overrides: StateOverrides) -> HttpState {
    HttpState::new(
        Arc::new(overrides.symptoms.unwrap_or_default()),
        Arc::new(overrides.checkout.unwrap_or_default()),
        Arc::new(overrides.accounts.unwrap_or_default()),
    )
}
