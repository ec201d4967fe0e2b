//! Driven port for the identity provider.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Credentials, IdentitySession};

define_port_error! {
    /// Failures raised by identity provider adapters.
    pub enum IdentityProviderError {
        InvalidCredentials => "invalid email or password",
        EmailInUse => "email address is already registered",
        WeakPassword { message: String } => "password is too weak: {message}",
        /// The provider demands a fresh sign-in before this operation.
        RequiresRecentLogin => "a recent sign-in is required",
        /// The id token is expired or revoked.
        SessionExpired => "identity session has expired",
        Transport { message: String } => "identity provider unreachable: {message}",
        Rejected { message: String } => "identity provider rejected the request: {message}",
        Decode { message: String } => "identity provider response could not be decoded: {message}",
    }
}

/// Signs users up and in, and manages the account lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials)
    -> Result<IdentitySession, IdentityProviderError>;

    async fn sign_in(&self, credentials: &Credentials)
    -> Result<IdentitySession, IdentityProviderError>;

    /// Whether `session` was re-verified recently enough for a sensitive
    /// operation.
    fn is_session_fresh(&self, session: &IdentitySession) -> bool;

    /// Permanently delete the identity behind `session`.
    async fn delete_account(&self, session: &IdentitySession) -> Result<(), IdentityProviderError>;
}
