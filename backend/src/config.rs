//! Application settings loaded via OrthoConfig.
//!
//! The service starts with nothing configured: fields are either optional,
//! with accessors supplying defaults, or carry an OrthoConfig default. Values
//! come from `HEALTHSYNTRA_*` environment variables, the command line or a
//! configuration file.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};
use url::Url;
use zeroize::Zeroizing;

use crate::domain::DEFAULT_RECENT_LOGIN_WINDOW;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_APP_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_IDENTITY_API_BASE: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_PROFILE_REFRESH_SECS: u64 = 30;

/// Invalid setting value.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl ToString) -> SettingsError {
    SettingsError::Invalid {
        name,
        reason: reason.to_string(),
    }
}

/// Origins arrive as a comma-separated string from the environment, or as a
/// list from a configuration file.
#[derive(Deserialize)]
#[serde(untagged)]
enum OriginList {
    Joined(String),
    Listed(Vec<String>),
}

fn origin_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<OriginList>::deserialize(deserializer)?.map(|origins| match origins {
            OriginList::Joined(raw) => raw.split(',').map(str::to_owned).collect(),
            OriginList::Listed(entries) => entries,
        }),
    )
}

/// Service configuration.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HEALTHSYNTRA")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Public origin of the web application; checkout redirects return here.
    pub app_base_url: Option<String>,
    /// Origins allowed to open the profile WebSocket.
    #[serde(default, deserialize_with = "origin_list")]
    pub allowed_origins: Option<Vec<String>>,
    pub stripe_secret_key: Option<String>,
    pub stripe_publishable_key: Option<String>,
    pub stripe_api_base: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_api_base: Option<String>,
    pub firebase_api_key: Option<String>,
    pub firebase_project_id: Option<String>,
    pub firebase_identity_api_base: Option<String>,
    pub firebase_firestore_api_base: Option<String>,
    /// Timeout for every outbound HTTP call.
    #[ortho_config(default = 10)]
    pub outbound_timeout_secs: u64,
    /// How long a sign-in counts as recent for account deletion.
    pub recent_login_window_secs: Option<u64>,
    /// Interval between profile refetches for live subscriptions; `0`
    /// disables polling.
    pub profile_refresh_secs: Option<u64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: None,
            app_base_url: None,
            allowed_origins: None,
            stripe_secret_key: None,
            stripe_publishable_key: None,
            stripe_api_base: None,
            gemini_api_key: None,
            gemini_model: None,
            gemini_api_base: None,
            firebase_api_key: None,
            firebase_project_id: None,
            firebase_identity_api_base: None,
            firebase_firestore_api_base: None,
            outbound_timeout_secs: 10,
            recent_login_window_secs: None,
            profile_refresh_secs: None,
        }
    }
}

/// Trimmed, non-empty secret.
fn secret(value: Option<&String>) -> Option<Zeroizing<String>> {
    value
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(|raw| Zeroizing::new(raw.to_owned()))
}

fn url_setting(
    name: &'static str,
    value: Option<&String>,
    fallback: &str,
) -> Result<Url, SettingsError> {
    Url::parse(value.map_or(fallback, String::as_str)).map_err(|err| invalid(name, err))
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
            .map_err(|err| invalid("bind_addr", err))
    }

    pub fn app_base_url(&self) -> Result<Url, SettingsError> {
        url_setting("app_base_url", self.app_base_url.as_ref(), DEFAULT_APP_BASE_URL)
    }

    /// Allowed WebSocket origins; defaults to the application origin.
    pub fn allowed_origins(&self) -> Result<Vec<String>, SettingsError> {
        let listed: Vec<String> = self
            .allowed_origins
            .iter()
            .flatten()
            .map(|entry| entry.trim())
            .filter(|entry| !entry.is_empty())
            .map(str::to_owned)
            .collect();
        if listed.is_empty() {
            return Ok(vec![self.app_base_url()?.origin().ascii_serialization()]);
        }
        Ok(listed)
    }

    pub fn stripe_secret_key(&self) -> Option<Zeroizing<String>> {
        secret(self.stripe_secret_key.as_ref())
    }

    pub fn stripe_publishable_key(&self) -> Option<Zeroizing<String>> {
        secret(self.stripe_publishable_key.as_ref())
    }

    pub fn stripe_api_base(&self) -> Result<Url, SettingsError> {
        url_setting("stripe_api_base", self.stripe_api_base.as_ref(), DEFAULT_STRIPE_API_BASE)
    }

    pub fn gemini_api_key(&self) -> Option<Zeroizing<String>> {
        secret(self.gemini_api_key.as_ref())
    }

    pub fn gemini_model(&self) -> &str {
        self.gemini_model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    pub fn gemini_api_base(&self) -> Result<Url, SettingsError> {
        url_setting("gemini_api_base", self.gemini_api_base.as_ref(), DEFAULT_GEMINI_API_BASE)
    }

    pub fn firebase_api_key(&self) -> Option<Zeroizing<String>> {
        secret(self.firebase_api_key.as_ref())
    }

    pub fn firebase_project_id(&self) -> Option<&str> {
        self.firebase_project_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn firebase_identity_api_base(&self) -> Result<Url, SettingsError> {
        url_setting(
            "firebase_identity_api_base",
            self.firebase_identity_api_base.as_ref(),
            DEFAULT_IDENTITY_API_BASE,
        )
    }

    pub fn firebase_firestore_api_base(&self) -> Result<Url, SettingsError> {
        url_setting(
            "firebase_firestore_api_base",
            self.firebase_firestore_api_base.as_ref(),
            DEFAULT_FIRESTORE_API_BASE,
        )
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }

    /// Polling interval for live profile subscriptions, if enabled.
    pub fn profile_refresh(&self) -> Option<Duration> {
        match self.profile_refresh_secs.unwrap_or(DEFAULT_PROFILE_REFRESH_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn recent_login_window(&self) -> Duration {
        self.recent_login_window_secs
            .map_or(DEFAULT_RECENT_LOGIN_WINDOW, Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 9] = [
        "HEALTHSYNTRA_BIND_ADDR",
        "HEALTHSYNTRA_APP_BASE_URL",
        "HEALTHSYNTRA_ALLOWED_ORIGINS",
        "HEALTHSYNTRA_STRIPE_SECRET_KEY",
        "HEALTHSYNTRA_GEMINI_MODEL",
        "HEALTHSYNTRA_RECENT_LOGIN_WINDOW_SECS",
        "HEALTHSYNTRA_OUTBOUND_TIMEOUT_SECS",
        "HEALTHSYNTRA_PROFILE_REFRESH_SECS",
        "HEALTHSYNTRA_FIREBASE_API_KEY",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("healthsyntra")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("bind addr"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(settings.app_base_url().expect("url").as_str(), "http://localhost:3000/");
        assert_eq!(
            settings.allowed_origins().expect("origins"),
            vec!["http://localhost:3000".to_owned()]
        );
        assert!(settings.stripe_secret_key().is_none());
        assert_eq!(settings.gemini_model(), DEFAULT_GEMINI_MODEL);
        assert_eq!(settings.recent_login_window(), DEFAULT_RECENT_LOGIN_WINDOW);
        assert_eq!(settings.outbound_timeout(), Duration::from_secs(10));
        assert_eq!(
            settings.profile_refresh(),
            Some(Duration::from_secs(DEFAULT_PROFILE_REFRESH_SECS))
        );
    }

    #[rstest]
    fn a_single_allowed_origin_loads() {
        let mut vars = VARS.map(|name| (name, None::<String>));
        vars[2].1 = Some("https://app.healthsyntra.example".to_owned());
        let _guard = lock_env(vars);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.allowed_origins().expect("origins"),
            vec!["https://app.healthsyntra.example".to_owned()]
        );
    }

    #[rstest]
    #[case(None, Some(Duration::from_secs(DEFAULT_PROFILE_REFRESH_SECS)))]
    #[case(Some(5), Some(Duration::from_secs(5)))]
    #[case(Some(0), None)]
    fn profile_refresh_can_be_tuned_or_disabled(
        #[case] secs: Option<u64>,
        #[case] expected: Option<Duration>,
    ) {
        let settings = AppSettings {
            profile_refresh_secs: secs,
            ..AppSettings::default()
        };
        assert_eq!(settings.profile_refresh(), expected);
    }

    #[rstest]
    fn blank_origin_entries_fall_back_to_the_app_origin() {
        let settings = AppSettings {
            allowed_origins: Some(vec![" ".to_owned(), String::new()]),
            app_base_url: Some("https://app.example/path".to_owned()),
            ..AppSettings::default()
        };
        assert_eq!(
            settings.allowed_origins().expect("origins"),
            vec!["https://app.example".to_owned()]
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("HEALTHSYNTRA_OUTBOUND_TIMEOUT_SECS", Some("3".to_owned())),
            ("HEALTHSYNTRA_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            ("HEALTHSYNTRA_APP_BASE_URL", Some("https://app.healthsyntra.example".to_owned())),
            (
                "HEALTHSYNTRA_ALLOWED_ORIGINS",
                Some("https://app.healthsyntra.example, http://localhost:3000".to_owned()),
            ),
            ("HEALTHSYNTRA_STRIPE_SECRET_KEY", Some("sk_test_123".to_owned())),
            ("HEALTHSYNTRA_GEMINI_MODEL", Some("gemini-1.5-pro".to_owned())),
            ("HEALTHSYNTRA_RECENT_LOGIN_WINDOW_SECS", Some("60".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr().expect("addr").port(), 9000);
        assert_eq!(
            settings.allowed_origins().expect("origins"),
            vec![
                "https://app.healthsyntra.example".to_owned(),
                "http://localhost:3000".to_owned()
            ]
        );
        assert_eq!(
            settings.stripe_secret_key().as_deref().map(String::as_str),
            Some("sk_test_123")
        );
        assert_eq!(settings.gemini_model(), "gemini-1.5-pro");
        assert_eq!(settings.recent_login_window(), Duration::from_secs(60));
        assert_eq!(settings.outbound_timeout(), Duration::from_secs(3));
    }

    #[rstest]
    #[case(Some("   "), None)]
    #[case(Some(" sk_live "), Some("sk_live"))]
    #[case(None, None)]
    fn blank_secrets_count_as_absent(#[case] raw: Option<&str>, #[case] expected: Option<&str>) {
        let settings = AppSettings {
            stripe_secret_key: raw.map(str::to_owned),
            ..AppSettings::default()
        };
        assert_eq!(
            settings.stripe_secret_key().as_deref().map(String::as_str),
            expected
        );
    }

    #[rstest]
    fn malformed_values_name_the_setting() {
        let settings = AppSettings {
            bind_addr: Some("not-an-address".to_owned()),
            app_base_url: Some("::".to_owned()),
            ..AppSettings::default()
        };
        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::Invalid { name: "bind_addr", .. })
        ));
        assert!(matches!(
            settings.app_base_url(),
            Err(SettingsError::Invalid { name: "app_base_url", .. })
        ));
    }
}
