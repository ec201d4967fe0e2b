//! `ProfileStore` backed by a process-local map.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{
    ProfileListener, ProfileSnapshot, ProfileStore, ProfileStoreError, SubscriptionHandle,
};
use crate::domain::{IdentitySession, SubscriptionTier, UserId, UserProfile};
use crate::outbound::profile_feed::ProfileFeed;

/// Profile documents keyed by user id, with live updates for every write.
#[derive(Clone, Default)]
pub struct InMemoryProfileStore {
    documents: Arc<Mutex<HashMap<UserId, UserProfile>>>,
    feed: Arc<ProfileFeed>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> MutexGuard<'_, HashMap<UserId, UserProfile>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self, uid: &UserId) -> Option<UserProfile> {
        self.documents().get(uid).cloned()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch(
        &self,
        session: &IdentitySession,
    ) -> Result<Option<UserProfile>, ProfileStoreError> {
        Ok(self.read(session.user_id()))
    }

    async fn create(
        &self,
        session: &IdentitySession,
        profile: &UserProfile,
    ) -> Result<(), ProfileStoreError> {
        if profile.uid() != session.user_id() {
            return Err(ProfileStoreError::permission_denied(
                "profiles may only be created for the signed-in user",
            ));
        }
        {
            let mut documents = self.documents();
            if documents.contains_key(profile.uid()) {
                return Err(ProfileStoreError::already_exists());
            }
            documents.insert(profile.uid().clone(), profile.clone());
        }
        self.feed
            .publish(profile.uid(), ProfileSnapshot::Present(profile.clone()));
        Ok(())
    }

    async fn update_tier(
        &self,
        session: &IdentitySession,
        tier: SubscriptionTier,
    ) -> Result<(), ProfileStoreError> {
        let updated = {
            let mut documents = self.documents();
            let profile = documents
                .get_mut(session.user_id())
                .ok_or_else(ProfileStoreError::not_found)?;
            *profile = profile.with_tier(tier);
            profile.clone()
        };
        self.feed
            .publish(session.user_id(), ProfileSnapshot::Present(updated));
        Ok(())
    }

    async fn delete(&self, session: &IdentitySession) -> Result<(), ProfileStoreError> {
        self.documents().remove(session.user_id());
        self.feed
            .publish(session.user_id(), ProfileSnapshot::Missing);
        Ok(())
    }

    fn subscribe(
        &self,
        session: &IdentitySession,
        listener: ProfileListener,
    ) -> Result<SubscriptionHandle, ProfileStoreError> {
        let uid = session.user_id().clone();
        let documents = Arc::clone(&self.documents);
        let key = uid.clone();
        self.feed.subscribe(
            uid,
            move || {
                let current = documents
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&key)
                    .cloned();
                async move { Ok(current) }
            },
            listener,
        )
    }
}
