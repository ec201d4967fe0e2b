//! Subscription tier synchronisation.
//!
//! [`SubscriptionSynchronizer`] keeps a push-updated view of the signed-in
//! user's profile. The account commands in this module are shared with the
//! HTTP adapter so both paths enforce the same authentication and freshness
//! rules.

mod commands;
mod synchronizer;

pub use commands::{delete_account, update_tier};
pub use synchronizer::SubscriptionSynchronizer;

use serde_json::json;

use super::ports::{IdentityProviderError, ProfileStoreError};
use super::{Error, UserProfile};

/// Message shown when a sensitive operation needs a fresh sign-in.
pub const REAUTHENTICATION_MESSAGE: &str =
    "This is a sensitive operation. Please log out and log back in before deleting your account.";

/// Observable state of the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProfileState {
    #[default]
    SignedOut,
    ProfileLoading,
    ProfileReady(UserProfile),
    ProfileMissing,
}

impl ProfileState {
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::ProfileReady(profile) => Some(profile),
            _ => None,
        }
    }
}

/// Failures of profile reads, tier changes and account deletion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("no identity is established")]
    NotAuthenticated,
    #[error("the session is too old for this operation")]
    ReauthenticationRequired,
    #[error(transparent)]
    Persistence(#[from] ProfileStoreError),
    #[error(transparent)]
    Identity(#[from] IdentityProviderError),
}

impl From<SubscriptionError> for Error {
    fn from(value: SubscriptionError) -> Self {
        match value {
            SubscriptionError::NotAuthenticated => Error::unauthorized("No user is logged in."),
            SubscriptionError::ReauthenticationRequired => {
                Error::reauthentication_required(REAUTHENTICATION_MESSAGE)
            }
            SubscriptionError::Persistence(err) => persistence_error(err),
            SubscriptionError::Identity(err) => Error::upstream_failure(
                "An unexpected authentication error occurred. Please try again later.",
            )
            .with_details(json!({ "code": "identity_provider", "reason": err.to_string() })),
        }
    }
}

pub(crate) fn persistence_error(err: ProfileStoreError) -> Error {
    match err {
        ProfileStoreError::SessionExpired { .. } => {
            Error::unauthorized("Your session has expired. Please log in again.")
        }
        ProfileStoreError::PermissionDenied { .. } => {
            Error::forbidden("You do not have permission to change this profile.")
        }
        ProfileStoreError::Connection { .. } => {
            Error::service_unavailable("The profile store is unavailable. Please try again later.")
        }
        ProfileStoreError::NotFound => Error::not_found("Profile not found."),
        ProfileStoreError::AlreadyExists => Error::conflict("Profile already exists."),
        ProfileStoreError::Query { message } => {
            Error::internal(format!("profile store query failed: {message}"))
        }
    }
}
