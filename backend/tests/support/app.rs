//! Adapter wiring shared by the integration test crates.
//!
//! Integration tests compile as separate crates; each one pulls this file in
//! with `#[path]` and uses the parts it needs.
#![allow(dead_code)]

use std::sync::Arc;

use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::ServiceResponse;
use healthsyntra::domain::ports::{CheckoutGateway, SymptomModel};
use healthsyntra::domain::{
    AccountService, CheckoutService, CheckoutSettings, SymptomNormalizationService,
};
use healthsyntra::inbound::http::session_config::{SESSION_COOKIE_NAME, SessionSettings};
use healthsyntra::inbound::http::state::HttpState;
use healthsyntra::inbound::ws::state::{OriginAllowList, WsState};
use healthsyntra::outbound::memory::{InMemoryIdentityProvider, InMemoryProfileStore};
use mockable::DefaultClock;
use url::Url;
use zeroize::Zeroizing;

pub const APP_BASE_URL: &str = "https://app.example";

/// Process-local identity provider and profile store.
pub struct Accounts {
    pub identity: Arc<InMemoryIdentityProvider>,
    pub store: Arc<InMemoryProfileStore>,
}

impl Accounts {
    pub fn in_memory() -> Self {
        Self {
            identity: Arc::new(InMemoryIdentityProvider::new(Arc::new(DefaultClock))),
            store: Arc::new(InMemoryProfileStore::new()),
        }
    }

    pub fn ws_state(&self, origins: &[&str]) -> WsState {
        let origins = OriginAllowList::parse(origins).expect("valid test origins");
        WsState::new(self.store.clone(), self.identity.clone(), origins)
    }
}

/// Insecure cookie settings so plain-HTTP test requests keep the session.
pub fn session_settings() -> SessionSettings {
    SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
        fingerprint: String::from("test"),
    }
}

pub fn checkout_settings() -> CheckoutSettings {
    CheckoutSettings {
        app_base_url: Url::parse(APP_BASE_URL).expect("base url"),
        publishable_key: Some(Zeroizing::new("pk_test_123".to_owned())),
    }
}

/// Handler state with no symptom model and the given checkout gateway.
pub fn http_state(accounts: &Accounts, gateway: Option<Arc<dyn CheckoutGateway>>) -> HttpState {
    let symptoms = Arc::new(SymptomNormalizationService::<dyn SymptomModel>::unconfigured());
    let checkout = Arc::new(CheckoutService::new(gateway, checkout_settings()));
    let service = Arc::new(AccountService::new(
        accounts.identity.clone(),
        accounts.store.clone(),
    ));
    HttpState::new(symptoms, checkout, service)
}

pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
}
