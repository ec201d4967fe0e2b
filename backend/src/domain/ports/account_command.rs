//! Driving port for account and subscription use-cases.
//!
//! HTTP handlers depend on this trait rather than the concrete service so they
//! can be exercised with a test double.

use async_trait::async_trait;

use crate::domain::{
    AccountError, Credentials, IdentitySession, PaidTier, SignedIn, SubscriptionError, UserProfile,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an identity and its free-tier profile.
    async fn register(&self, credentials: &Credentials) -> Result<SignedIn, AccountError>;

    /// Sign in, creating the free-tier profile when it is missing.
    async fn login(&self, credentials: &Credentials) -> Result<SignedIn, AccountError>;

    async fn profile(&self, session: &IdentitySession)
    -> Result<Option<UserProfile>, SubscriptionError>;

    async fn set_tier(&self, session: &IdentitySession, tier: PaidTier)
    -> Result<(), SubscriptionError>;

    async fn delete_account(&self, session: &IdentitySession) -> Result<(), SubscriptionError>;
}
