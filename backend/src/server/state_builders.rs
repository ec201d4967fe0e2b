//! Builders for handler state from application settings.
//!
//! Each collaborator degrades rather than failing startup: a missing Gemini
//! key leaves symptom normalization unconfigured, a missing Stripe key leaves
//! checkout unconfigured and missing Firebase credentials select the
//! process-local identity provider and profile store.

use std::io;
use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use healthsyntra::config::AppSettings;
use healthsyntra::domain::ports::{
    CheckoutGateway, IdentityProvider, ProfileStore, SymptomNormalizer,
};
use healthsyntra::domain::{
    AccountService, CheckoutService, CheckoutSettings, SymptomNormalizationService,
};
use healthsyntra::inbound::http::state::HttpState;
use healthsyntra::inbound::ws::state::{OriginAllowList, WsState};
use healthsyntra::outbound::firebase::{
    FirebaseIdentityProvider, FirebaseSettings, FirestoreProfileStore,
};
use healthsyntra::outbound::gemini::{GeminiSettings, GeminiSymptomModel};
use healthsyntra::outbound::memory::{InMemoryIdentityProvider, InMemoryProfileStore};
use healthsyntra::outbound::profile_feed::ProfileFeed;
use healthsyntra::outbound::stripe::{StripeCheckoutGateway, StripeSettings};

/// Handler state for both inbound adapters.
pub(crate) struct AppStates {
    pub(crate) http: HttpState,
    pub(crate) ws: WsState,
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("{context}: {err}"))
}

fn build_symptoms(settings: &AppSettings) -> io::Result<Arc<dyn SymptomNormalizer>> {
    let Some(api_key) = settings.gemini_api_key() else {
        warn!("gemini api key not set; symptom normalization disabled");
        return Ok(Arc::new(SymptomNormalizationService::<GeminiSymptomModel>::unconfigured()));
    };
    let model = GeminiSymptomModel::new(GeminiSettings {
        api_key,
        model: settings.gemini_model().to_owned(),
        api_base: settings
            .gemini_api_base()
            .map_err(|err| startup_error("gemini settings", err))?,
        timeout: settings.outbound_timeout(),
    })
    .map_err(|err| startup_error("gemini model", err))?;
    info!(model = settings.gemini_model(), "symptom model configured");
    Ok(Arc::new(SymptomNormalizationService::new(Arc::new(model))))
}

fn build_checkout_gateway(settings: &AppSettings) -> io::Result<Option<Arc<dyn CheckoutGateway>>> {
    let Some(secret_key) = settings.stripe_secret_key() else {
        warn!("stripe secret key not set; checkout disabled");
        return Ok(None);
    };
    let gateway = StripeCheckoutGateway::new(StripeSettings {
        secret_key,
        api_base: settings
            .stripe_api_base()
            .map_err(|err| startup_error("stripe settings", err))?,
        timeout: settings.outbound_timeout(),
    })
    .map_err(|err| startup_error("stripe gateway", err))?;
    Ok(Some(Arc::new(gateway)))
}

type Accounts = (Arc<dyn IdentityProvider>, Arc<dyn ProfileStore>);

fn build_accounts(settings: &AppSettings, clock: Arc<dyn Clock>) -> io::Result<Accounts> {
    let (Some(api_key), Some(project_id)) =
        (settings.firebase_api_key(), settings.firebase_project_id())
    else {
        warn!("firebase credentials not set; using in-memory accounts");
        let identity = InMemoryIdentityProvider::with_recent_login_window(
            clock,
            settings.recent_login_window(),
        );
        return Ok((Arc::new(identity), Arc::new(InMemoryProfileStore::new())));
    };

    let firebase = FirebaseSettings {
        api_key,
        project_id: project_id.to_owned(),
        identity_api_base: settings
            .firebase_identity_api_base()
            .map_err(|err| startup_error("firebase settings", err))?,
        firestore_api_base: settings
            .firebase_firestore_api_base()
            .map_err(|err| startup_error("firebase settings", err))?,
        timeout: settings.outbound_timeout(),
        recent_login_window: settings.recent_login_window(),
    };
    let feed = Arc::new(ProfileFeed::default().with_refresh(settings.profile_refresh()));
    let identity = FirebaseIdentityProvider::new(&firebase, clock)
        .map_err(|err| startup_error("firebase identity", err))?;
    let store = FirestoreProfileStore::new(&firebase, feed)
        .map_err(|err| startup_error("firestore store", err))?;
    info!(project_id, "firebase accounts configured");
    Ok((Arc::new(identity), Arc::new(store)))
}

/// Construct handler state from settings.
///
/// # Errors
/// Returns [`io::Error`] when a configured value is malformed or an adapter
/// cannot build its HTTP client.
pub(crate) fn build_states(settings: &AppSettings) -> io::Result<AppStates> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let app_base_url = settings
        .app_base_url()
        .map_err(|err| startup_error("app settings", err))?;

    let symptoms = build_symptoms(settings)?;
    let checkout = Arc::new(CheckoutService::new(
        build_checkout_gateway(settings)?,
        CheckoutSettings {
            app_base_url,
            publishable_key: settings.stripe_publishable_key(),
        },
    ));
    let (identity, store) = build_accounts(settings, clock)?;
    let accounts = Arc::new(AccountService::new(identity.clone(), store.clone()));

    let origins = settings
        .allowed_origins()
        .map_err(|err| startup_error("app settings", err))?;
    let origins =
        OriginAllowList::parse(&origins).map_err(|err| startup_error("allowed origins", err))?;

    Ok(AppStates {
        http: HttpState::new(symptoms, checkout, accounts),
        ws: WsState::new(store, identity, origins),
    })
}
