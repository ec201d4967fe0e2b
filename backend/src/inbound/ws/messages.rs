//! Wire-level frames for the live profile stream.
//!
//! ```text
//! server -> {"state":"loading"}
//! server -> {"state":"ready","profile":{"uid":"u1","email":"ada@example.com","subscriptionPlan":"free"}}
//! client -> {"type":"setTier","plan":"premium"}
//! server -> {"error":{"code":"invalid_request","message":"..."}}
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{Error, ProfileState, UserProfile};

/// Snapshot of the connection's profile view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum StateFrame {
    SignedOut,
    Loading,
    Ready { profile: UserProfile },
    Missing,
}

impl From<&ProfileState> for StateFrame {
    fn from(value: &ProfileState) -> Self {
        match value {
            ProfileState::SignedOut => Self::SignedOut,
            ProfileState::ProfileLoading => Self::Loading,
            ProfileState::ProfileReady(profile) => Self::Ready {
                profile: profile.clone(),
            },
            ProfileState::ProfileMissing => Self::Missing,
        }
    }
}

/// Failure of a client command; the connection stays open.
#[derive(Debug, Serialize)]
pub struct ErrorFrame {
    pub error: Error,
}

/// Commands accepted from the client.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    SetTier { plan: String },
}
