//! Live profile view for one signed-in identity at a time.
//!
//! Every identity change bumps a generation counter under the same lock that
//! guards state publication. Listener deliveries carry the generation they
//! were registered with and are dropped once it is no longer current, so a
//! late snapshot for a previous identity can never overwrite the view of the
//! next one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tracing::{debug, warn};

use super::{ProfileState, SubscriptionError, commands};
use crate::domain::ports::{
    IdentityProvider, ProfileListener, ProfileSnapshot, ProfileStore, SubscriptionHandle,
};
use crate::domain::{IdentitySession, PaidTier, UserProfile};

#[derive(Default)]
struct SyncInner {
    generation: u64,
    session: Option<IdentitySession>,
    handle: Option<SubscriptionHandle>,
}

fn lock(inner: &Mutex<SyncInner>) -> MutexGuard<'_, SyncInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Explicit profile context for a signed-in user.
///
/// Construct one per consumer (a WebSocket connection, a CLI session) and
/// hand it the identity once sign-in succeeds. Dropping it tears down the
/// live subscription.
pub struct SubscriptionSynchronizer {
    store: Arc<dyn ProfileStore>,
    identity: Arc<dyn IdentityProvider>,
    inner: Arc<Mutex<SyncInner>>,
    state: Arc<watch::Sender<ProfileState>>,
}

impl SubscriptionSynchronizer {
    pub fn new(store: Arc<dyn ProfileStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(ProfileState::SignedOut);
        Self {
            store,
            identity,
            inner: Arc::new(Mutex::new(SyncInner::default())),
            state: Arc::new(state),
        }
    }

    /// Switch to `session`, replacing any previous subscription.
    ///
    /// # Errors
    /// Returns [`SubscriptionError::Persistence`] when the store refuses the
    /// subscription; the state then resolves to `ProfileMissing`.
    pub fn establish_identity(&self, session: IdentitySession) -> Result<(), SubscriptionError> {
        let (generation, previous) = {
            let mut inner = lock(&self.inner);
            inner.generation += 1;
            inner.session = Some(session.clone());
            self.state.send_replace(ProfileState::ProfileLoading);
            (inner.generation, inner.handle.take())
        };
        drop(previous);

        let listener = self.listener_for(generation);
        match self.store.subscribe(&session, listener) {
            Ok(handle) => {
                let mut inner = lock(&self.inner);
                if inner.generation == generation {
                    inner.handle = Some(handle);
                }
                // A newer identity won the race; `handle` is dropped (and
                // cancelled) when this scope ends.
                Ok(())
            }
            Err(err) => {
                warn!(user_id = %session.user_id(), error = %err, "profile subscription failed");
                let inner = lock(&self.inner);
                if inner.generation == generation {
                    self.state.send_replace(ProfileState::ProfileMissing);
                }
                Err(SubscriptionError::Persistence(err))
            }
        }
    }

    /// Sign out: cancel the subscription and publish `SignedOut`.
    pub fn clear_identity(&self) {
        let previous = {
            let mut inner = lock(&self.inner);
            inner.generation += 1;
            inner.session = None;
            self.state.send_replace(ProfileState::SignedOut);
            inner.handle.take()
        };
        drop(previous);
    }

    pub fn session(&self) -> Option<IdentitySession> {
        lock(&self.inner).session.clone()
    }

    pub fn state(&self) -> ProfileState {
        self.state.borrow().clone()
    }

    pub fn current_profile(&self) -> Option<UserProfile> {
        self.state.borrow().profile().cloned()
    }

    /// Receiver that observes every published state.
    pub fn watch(&self) -> watch::Receiver<ProfileState> {
        self.state.subscribe()
    }

    /// Change the current identity's tier.
    pub async fn set_tier(&self, tier: PaidTier) -> Result<(), SubscriptionError> {
        let session = self.session();
        commands::update_tier(self.store.as_ref(), session.as_ref(), tier).await
    }

    /// Delete the current identity's account, then sign out.
    pub async fn delete_account(&self) -> Result<(), SubscriptionError> {
        let session = self.session();
        commands::delete_account(self.identity.as_ref(), self.store.as_ref(), session.as_ref())
            .await?;
        self.clear_identity();
        Ok(())
    }

    fn listener_for(&self, generation: u64) -> ProfileListener {
        let inner: Weak<Mutex<SyncInner>> = Arc::downgrade(&self.inner);
        let state: Weak<watch::Sender<ProfileState>> = Arc::downgrade(&self.state);
        Arc::new(move |delivery| {
            let (Some(inner), Some(state)) = (inner.upgrade(), state.upgrade()) else {
                return;
            };
            let guard = lock(&inner);
            if guard.generation != generation {
                debug!(generation, current = guard.generation, "discarding stale profile delivery");
                return;
            }
            let next = match delivery {
                Ok(ProfileSnapshot::Present(profile)) => {
                    let belongs = guard
                        .session
                        .as_ref()
                        .is_some_and(|session| session.user_id() == profile.uid());
                    if !belongs {
                        warn!(uid = %profile.uid(), "discarding profile for a different identity");
                        return;
                    }
                    ProfileState::ProfileReady(profile)
                }
                Ok(ProfileSnapshot::Missing) => ProfileState::ProfileMissing,
                Err(err) => {
                    warn!(error = %err, "profile subscription reported an error");
                    if *state.borrow() == ProfileState::ProfileLoading {
                        ProfileState::ProfileMissing
                    } else {
                        return;
                    }
                }
            };
            state.send_replace(next);
        })
    }
}

impl Drop for SubscriptionSynchronizer {
    fn drop(&mut self) {
        self.clear_identity();
    }
}
