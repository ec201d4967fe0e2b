//! Driven port for the profile document store.
//!
//! Every call is scoped by the signed-in [`IdentitySession`] so adapters can
//! authenticate as that user and the store can enforce per-user access.
//! Live reads use an explicit observer registration: [`ProfileStore::subscribe`]
//! returns a [`SubscriptionHandle`] that stops delivery when cancelled or
//! dropped.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{IdentitySession, SubscriptionTier, UserProfile};

define_port_error! {
    /// Failures raised by profile store adapters.
    pub enum ProfileStoreError {
        /// The store could not be reached.
        Connection { message: String } => "profile store connection failed: {message}",
        /// The store no longer accepts this identity's credentials.
        SessionExpired { message: String } => "profile store rejected the session: {message}",
        /// The store refused access for this identity.
        PermissionDenied { message: String } => "profile store denied access: {message}",
        /// The profile document does not exist.
        NotFound => "profile document not found",
        /// A profile document already exists for this identity.
        AlreadyExists => "profile document already exists",
        /// The store answered with something unusable.
        Query { message: String } => "profile store query failed: {message}",
    }
}

/// One observation of a profile document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSnapshot {
    Present(UserProfile),
    Missing,
}

impl From<Option<UserProfile>> for ProfileSnapshot {
    fn from(value: Option<UserProfile>) -> Self {
        value.map_or(Self::Missing, Self::Present)
    }
}

/// Callback invoked with every observed snapshot or subscription error.
pub type ProfileListener = Arc<dyn Fn(Result<ProfileSnapshot, ProfileStoreError>) + Send + Sync>;

/// Cancellation handle for a live profile subscription.
///
/// Cancelling is idempotent; dropping the handle cancels it.
pub struct SubscriptionHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle with nothing to cancel.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Stop delivery to the listener.
    pub fn cancel(mut self) {
        self.cancel_in_place();
    }

    fn cancel_in_place(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel_in_place();
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Per-user profile documents keyed by user id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Read the signed-in user's profile, if it exists.
    async fn fetch(&self, session: &IdentitySession)
    -> Result<Option<UserProfile>, ProfileStoreError>;

    /// Create the signed-in user's profile; fails when one already exists.
    async fn create(
        &self,
        session: &IdentitySession,
        profile: &UserProfile,
    ) -> Result<(), ProfileStoreError>;

    /// Partial update of the `subscriptionPlan` field only.
    async fn update_tier(
        &self,
        session: &IdentitySession,
        tier: SubscriptionTier,
    ) -> Result<(), ProfileStoreError>;

    async fn delete(&self, session: &IdentitySession) -> Result<(), ProfileStoreError>;

    /// Register `listener` for the initial snapshot and every later change.
    fn subscribe(
        &self,
        session: &IdentitySession,
        listener: ProfileListener,
    ) -> Result<SubscriptionHandle, ProfileStoreError>;
}
