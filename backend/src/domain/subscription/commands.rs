//! Account commands shared by the synchronizer and the HTTP adapter.

use tracing::{info, warn};

use super::SubscriptionError;
use crate::domain::ports::{IdentityProvider, IdentityProviderError, ProfileStore, ProfileStoreError};
use crate::domain::{IdentitySession, PaidTier};

/// Change the signed-in user's tier with a single partial-field write.
///
/// Without an identity the call fails before the store is touched.
pub async fn update_tier<S>(
    store: &S,
    session: Option<&IdentitySession>,
    tier: PaidTier,
) -> Result<(), SubscriptionError>
where
    S: ProfileStore + ?Sized,
{
    let session = session.ok_or(SubscriptionError::NotAuthenticated)?;
    store
        .update_tier(session, tier.into())
        .await
        .map_err(|err| {
            warn!(user_id = %session.user_id(), error = %err, "subscription update rejected");
            SubscriptionError::Persistence(err)
        })?;
    info!(user_id = %session.user_id(), tier = %tier, "subscription tier updated");
    Ok(())
}

/// Delete the identity and then its profile document.
///
/// A stale session, or a provider demanding a fresh sign-in, fails with
/// [`SubscriptionError::ReauthenticationRequired`] and leaves the profile
/// untouched.
pub async fn delete_account<I, S>(
    identity: &I,
    store: &S,
    session: Option<&IdentitySession>,
) -> Result<(), SubscriptionError>
where
    I: IdentityProvider + ?Sized,
    S: ProfileStore + ?Sized,
{
    let session = session.ok_or(SubscriptionError::NotAuthenticated)?;
    if !identity.is_session_fresh(session) {
        info!(user_id = %session.user_id(), "account deletion refused for stale session");
        return Err(SubscriptionError::ReauthenticationRequired);
    }

    identity
        .delete_account(session)
        .await
        .map_err(|err| match err {
            IdentityProviderError::RequiresRecentLogin | IdentityProviderError::SessionExpired => {
                SubscriptionError::ReauthenticationRequired
            }
            other => {
                warn!(user_id = %session.user_id(), error = %other, "identity deletion failed");
                SubscriptionError::Identity(other)
            }
        })?;

    match store.delete(session).await {
        Ok(()) | Err(ProfileStoreError::NotFound) => {
            info!(user_id = %session.user_id(), "account deleted");
            Ok(())
        }
        Err(err) => {
            warn!(
                user_id = %session.user_id(),
                error = %err,
                "identity deleted but profile document removal failed"
            );
            Err(SubscriptionError::Persistence(err))
        }
    }
}
