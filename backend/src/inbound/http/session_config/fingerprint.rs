//! Loggable fingerprint of the session signing key.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

const FINGERPRINT_BYTES: usize = 8;

/// First eight bytes of the SHA-256 of the signing key, as lowercase hex.
///
/// Lets operators tell which key a deployment uses without exposing it.
///
/// ```rust
/// use actix_web::cookie::Key;
/// use healthsyntra::inbound::http::session_config::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::derive_from(&[7u8; 64]));
/// assert_eq!(fp.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
