//! Shared doubles for unit tests.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{EmailAddress, IdToken, IdentitySession, UserId};

/// Fixed instant used as "now" across unit tests.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single() {
        Some(now) => now,
        None => panic!("fixture timestamp is valid"),
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => panic!("failed to convert Duration to TimeDelta: {error}"),
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Signed-in session for `uid` authenticated at [`fixed_now`].
pub fn session_for(uid: &str) -> IdentitySession {
    let (Ok(user_id), Ok(email)) = (UserId::new(uid), EmailAddress::new(format!("{uid}@example.com")))
    else {
        panic!("fixture identity is valid");
    };
    IdentitySession::new(user_id, email, IdToken::new(format!("token-{uid}")), fixed_now())
}
