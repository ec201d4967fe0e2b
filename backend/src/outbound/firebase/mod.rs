//! Firebase adapters: Identity Toolkit for accounts, Firestore for profiles.
//!
//! Both speak the public REST APIs with the project's web API key. Firestore
//! calls authenticate as the signed-in user with their id token so security
//! rules apply per user.

mod dto;
mod firestore;
mod identity;

use std::time::Duration;

use reqwest::Url;
use zeroize::Zeroizing;

pub use firestore::FirestoreProfileStore;
pub use identity::FirebaseIdentityProvider;

/// Project credentials and API roots shared by both adapters.
#[derive(Clone)]
pub struct FirebaseSettings {
    pub api_key: Zeroizing<String>,
    pub project_id: String,
    /// Normally `https://identitytoolkit.googleapis.com/v1`.
    pub identity_api_base: Url,
    /// Normally `https://firestore.googleapis.com/v1`.
    pub firestore_api_base: Url,
    pub timeout: Duration,
    pub recent_login_window: Duration,
}

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Transport failure text with the request URL stripped.
fn transport_message(error: reqwest::Error) -> String {
    error.without_url().to_string()
}
