//! Account lifecycle service backing the [`AccountCommand`] port.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use super::ports::{
    AccountCommand, IdentityProvider, IdentityProviderError, ProfileStore, ProfileStoreError,
};
use super::subscription::{self, SubscriptionError, persistence_error};
use super::{Credentials, Error, IdentitySession, PaidTier, UserProfile};

/// Result of a successful sign-up or sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub session: IdentitySession,
    pub profile: UserProfile,
}

/// Registration and sign-in failures, phrased for end users.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid email or password. Please try again.")]
    InvalidCredentials,
    #[error("This email address is already registered. Please login or use a different email.")]
    EmailInUse,
    #[error("The password is too weak. Please use at least 6 characters.")]
    WeakPassword,
    #[error("An unexpected authentication error occurred. Please try again later.")]
    Identity(IdentityProviderError),
    #[error(transparent)]
    Persistence(#[from] ProfileStoreError),
}

impl From<IdentityProviderError> for AccountError {
    fn from(value: IdentityProviderError) -> Self {
        match value {
            IdentityProviderError::InvalidCredentials => Self::InvalidCredentials,
            IdentityProviderError::EmailInUse => Self::EmailInUse,
            IdentityProviderError::WeakPassword { .. } => Self::WeakPassword,
            other => Self::Identity(other),
        }
    }
}

impl From<AccountError> for Error {
    fn from(value: AccountError) -> Self {
        let message = value.to_string();
        match value {
            AccountError::InvalidCredentials => Error::unauthorized(message),
            AccountError::EmailInUse => Error::conflict(message),
            AccountError::WeakPassword => Error::invalid_request(message)
                .with_details(json!({ "field": "password", "code": "weak_password" })),
            AccountError::Identity(err) => Error::upstream_failure(message)
                .with_details(json!({ "code": "identity_provider", "reason": err.to_string() })),
            AccountError::Persistence(err) => persistence_error(err),
        }
    }
}

/// Account use-cases over the identity provider and profile store.
pub struct AccountService<I: ?Sized, S: ?Sized> {
    identity: Arc<I>,
    store: Arc<S>,
}

impl<I: ?Sized, S: ?Sized> AccountService<I, S> {
    pub fn new(identity: Arc<I>, store: Arc<S>) -> Self {
        Self { identity, store }
    }
}

impl<I, S> AccountService<I, S>
where
    I: IdentityProvider + ?Sized,
    S: ProfileStore + ?Sized,
{
    async fn ensure_profile(&self, session: &IdentitySession) -> Result<UserProfile, AccountError> {
        if let Some(existing) = self.store.fetch(session).await? {
            return Ok(existing);
        }
        let profile = UserProfile::registered(session.user_id().clone(), session.email().clone());
        match self.store.create(session, &profile).await {
            Ok(()) => {
                info!(user_id = %session.user_id(), "created free-tier profile");
                Ok(profile)
            }
            // Another sign-in for the same user created it first.
            Err(ProfileStoreError::AlreadyExists) => self
                .store
                .fetch(session)
                .await?
                .ok_or(AccountError::Persistence(ProfileStoreError::NotFound)),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl<I, S> AccountCommand for AccountService<I, S>
where
    I: IdentityProvider + ?Sized,
    S: ProfileStore + ?Sized,
{
    async fn register(&self, credentials: &Credentials) -> Result<SignedIn, AccountError> {
        let session = self.identity.sign_up(credentials).await.map_err(|err| {
            warn!(error = %err, "sign-up rejected");
            AccountError::from(err)
        })?;
        let profile = UserProfile::registered(session.user_id().clone(), session.email().clone());
        self.store.create(&session, &profile).await?;
        info!(user_id = %session.user_id(), "account registered");
        Ok(SignedIn { session, profile })
    }

    async fn login(&self, credentials: &Credentials) -> Result<SignedIn, AccountError> {
        let session = self.identity.sign_in(credentials).await.map_err(|err| {
            warn!(error = %err, "sign-in rejected");
            AccountError::from(err)
        })?;
        let profile = self.ensure_profile(&session).await?;
        Ok(SignedIn { session, profile })
    }

    async fn profile(
        &self,
        session: &IdentitySession,
    ) -> Result<Option<UserProfile>, SubscriptionError> {
        Ok(self.store.fetch(session).await?)
    }

    async fn set_tier(
        &self,
        session: &IdentitySession,
        tier: PaidTier,
    ) -> Result<(), SubscriptionError> {
        subscription::update_tier(self.store.as_ref(), Some(session), tier).await
    }

    async fn delete_account(&self, session: &IdentitySession) -> Result<(), SubscriptionError> {
        subscription::delete_account(self.identity.as_ref(), self.store.as_ref(), Some(session))
            .await
    }
}
