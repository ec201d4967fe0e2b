//! Session settings loader tests.

use super::test_utils::TempKeyFile;
use super::*;
use mockable::MockEnv;
use rstest::{fixture, rstest};
use std::collections::HashMap;

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

#[fixture]
fn key_file() -> TempKeyFile {
    TempKeyFile::new(SESSION_KEY_MIN_LEN).expect("key file")
}

fn release_vars(key_file: &TempKeyFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key_file.path_str()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

fn release_error(vars: HashMap<&'static str, String>) -> SessionConfigError {
    match session_settings_from_env(&mock_env(vars), BuildMode::Release) {
        Ok(_) => panic!("release settings should be rejected"),
        Err(error) => error,
    }
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(key_file: TempKeyFile, #[case] missing: &'static str) {
    let mut vars = release_vars(&key_file);
    vars.remove(missing);

    let error = release_error(vars);
    assert!(matches!(error, SessionConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(ALLOW_EPHEMERAL_ENV, "")]
#[case(SAMESITE_ENV, "sometimes")]
fn release_rejects_garbage_values(
    key_file: TempKeyFile,
    #[case] name: &'static str,
    #[case] value: &str,
) {
    let mut vars = release_vars(&key_file);
    vars.insert(name, value.to_owned());

    let error = release_error(vars);
    assert!(matches!(error, SessionConfigError::InvalidEnv { name: got, .. } if got == name));
}

#[rstest]
fn release_refuses_ephemeral_keys(key_file: TempKeyFile) {
    let mut vars = release_vars(&key_file);
    vars.insert(ALLOW_EPHEMERAL_ENV, "true".to_owned());
    assert!(matches!(release_error(vars), SessionConfigError::EphemeralNotAllowed));
}

#[rstest]
fn release_refuses_insecure_same_site_none(key_file: TempKeyFile) {
    let mut vars = release_vars(&key_file);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());
    assert!(matches!(release_error(vars), SessionConfigError::InsecureSameSiteNone));
}

#[rstest]
fn release_needs_a_readable_long_key() {
    let short = TempKeyFile::new(32).expect("short key");
    assert!(matches!(
        release_error(release_vars(&short)),
        SessionConfigError::KeyTooShort { length: 32, .. }
    ));

    let mut vars = release_vars(&short);
    vars.insert(
        KEY_FILE_ENV,
        std::env::temp_dir()
            .join("healthsyntra-no-such-key")
            .to_string_lossy()
            .into_owned(),
    );
    assert!(matches!(release_error(vars), SessionConfigError::KeyRead { .. }));
}

#[rstest]
fn release_settings_carry_the_key_fingerprint(key_file: TempKeyFile) {
    let settings = session_settings_from_env(&mock_env(release_vars(&key_file)), BuildMode::Release)
        .expect("valid release settings");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(
        settings.fingerprint,
        key_fingerprint(&Key::derive_from(&[b'a'; SESSION_KEY_MIN_LEN]))
    );
}

#[rstest]
fn debug_builds_fall_back_to_lenient_defaults() {
    let vars = HashMap::from([
        (SAMESITE_ENV, "whatever".to_owned()),
        (COOKIE_SECURE_ENV, "perhaps".to_owned()),
    ]);
    let settings = session_settings_from_env(&mock_env(vars), BuildMode::Debug)
        .expect("debug builds tolerate bad toggles");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
    assert_eq!(settings.fingerprint.len(), 16);
}

#[rstest]
fn debug_builds_accept_short_keys() {
    let short = TempKeyFile::filled(40, b'z').expect("short key");
    let vars = HashMap::from([(KEY_FILE_ENV, short.path_str())]);
    let settings = session_settings_from_env(&mock_env(vars), BuildMode::Debug)
        .expect("short keys are fine in debug");
    assert_eq!(settings.fingerprint, key_fingerprint(&Key::derive_from(&[b'z'; 40])));
}

#[rstest]
fn debug_builds_replace_underivable_keys() {
    let tiny = TempKeyFile::filled(16, b'z').expect("tiny key");
    let vars = HashMap::from([(KEY_FILE_ENV, tiny.path_str())]);
    let first = session_settings_from_env(&mock_env(vars.clone()), BuildMode::Debug)
        .expect("debug falls back");
    let second = session_settings_from_env(&mock_env(vars), BuildMode::Debug)
        .expect("debug falls back");
    assert_ne!(first.fingerprint, second.fingerprint);
}
