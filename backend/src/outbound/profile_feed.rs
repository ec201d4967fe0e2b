//! In-process change feed driving live profile subscriptions.
//!
//! Store adapters publish every snapshot they write; subscribers receive an
//! initial snapshot from the adapter's own fetch followed by each published
//! change. Writes made outside this process only arrive through the optional
//! refresh interval, which refetches and delivers the snapshot when it differs
//! from the last one delivered.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;

use crate::domain::UserId;
use crate::domain::UserProfile;
use crate::domain::ports::{ProfileListener, ProfileSnapshot, ProfileStoreError, SubscriptionHandle};

const DEFAULT_CAPACITY: usize = 16;

type Channels = Mutex<HashMap<UserId, broadcast::Sender<ProfileSnapshot>>>;

fn lock(channels: &Channels) -> MutexGuard<'_, HashMap<UserId, broadcast::Sender<ProfileSnapshot>>> {
    channels.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-user broadcast channels for profile snapshots.
pub struct ProfileFeed {
    channels: Arc<Channels>,
    capacity: usize,
    refresh: Option<Duration>,
}

impl Default for ProfileFeed {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

/// Subscriber side of a channel; dropping it removes the channel once no
/// receivers remain.
struct FeedReceiver {
    receiver: Option<broadcast::Receiver<ProfileSnapshot>>,
    channels: Arc<Channels>,
    uid: UserId,
}

impl FeedReceiver {
    async fn recv(&mut self) -> Result<ProfileSnapshot, RecvError> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => Err(RecvError::Closed),
        }
    }
}

impl Drop for FeedReceiver {
    fn drop(&mut self) {
        drop(self.receiver.take());
        let mut channels = lock(&self.channels);
        if channels
            .get(&self.uid)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(&self.uid);
        }
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

impl ProfileFeed {
    /// Feed whose subscribers resync after falling `capacity` snapshots behind.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
            refresh: None,
        }
    }

    /// Refetch every `period` so changes written elsewhere reach subscribers.
    #[must_use]
    pub fn with_refresh(mut self, period: Option<Duration>) -> Self {
        self.refresh = period.filter(|period| !period.is_zero());
        self
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<UserId, broadcast::Sender<ProfileSnapshot>>> {
        lock(&self.channels)
    }

    /// Deliver `snapshot` to every live subscriber of `uid`.
    pub fn publish(&self, uid: &UserId, snapshot: ProfileSnapshot) {
        let mut channels = self.channels();
        let Some(sender) = channels.get(uid) else {
            return;
        };
        if sender.send(snapshot).is_err() {
            channels.remove(uid);
        }
    }

    /// Number of live subscribers for `uid`.
    pub fn subscriber_count(&self, uid: &UserId) -> usize {
        self.channels()
            .get(uid)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of users with an open channel.
    pub fn channel_count(&self) -> usize {
        self.channels().len()
    }

    /// Spawn a delivery task for `uid`.
    ///
    /// The receiver is registered before the initial `fetch`, so a write that
    /// lands while the fetch is in flight is delivered afterwards rather than
    /// lost. The channel is removed once its last subscriber is gone.
    ///
    /// # Errors
    /// Fails when called outside a Tokio runtime.
    pub fn subscribe<F, Fut>(
        &self,
        uid: UserId,
        fetch: F,
        listener: ProfileListener,
    ) -> Result<SubscriptionHandle, ProfileStoreError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<UserProfile>, ProfileStoreError>> + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|err| {
            ProfileStoreError::connection(format!("live updates need an async runtime: {err}"))
        })?;
        let receiver = {
            let mut channels = self.channels();
            channels
                .entry(uid.clone())
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .subscribe()
        };
        let mut receiver = FeedReceiver {
            receiver: Some(receiver),
            channels: Arc::clone(&self.channels),
            uid: uid.clone(),
        };
        let mut refresh = self.refresh.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        let task = runtime.spawn(async move {
            let deliver = |delivery: Result<ProfileSnapshot, ProfileStoreError>,
                           last: &mut Option<ProfileSnapshot>| {
                *last = delivery.as_ref().ok().cloned();
                listener(delivery);
            };
            let mut last = None;
            deliver(fetch().await.map(ProfileSnapshot::from), &mut last);
            loop {
                tokio::select! {
                    received = receiver.recv() => match received {
                        Ok(snapshot) => deliver(Ok(snapshot), &mut last),
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(uid = %uid, skipped, "profile feed lagged; resyncing");
                            deliver(fetch().await.map(ProfileSnapshot::from), &mut last);
                        }
                        Err(RecvError::Closed) => break,
                    },
                    () = next_tick(&mut refresh) => {
                        let fetched = fetch().await.map(ProfileSnapshot::from);
                        if fetched.as_ref().ok() != last.as_ref() {
                            deliver(fetched, &mut last);
                        }
                    }
                }
            }
        });
        Ok(SubscriptionHandle::new(move || task.abort()))
    }
}
