//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The signed-in identity is stored in the private (encrypted) session cookie
//! so each request can act on the user's behalf against the identity provider
//! and the profile store.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use chrono::{DateTime, Utc};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{EmailAddress, Error, IdToken, IdentitySession, UserId};

pub(crate) const IDENTITY_KEY: &str = "identity";

/// Cookie representation of an [`IdentitySession`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredIdentity {
    uid: String,
    email: String,
    id_token: String,
    authenticated_at: DateTime<Utc>,
}

impl From<&IdentitySession> for StoredIdentity {
    fn from(session: &IdentitySession) -> Self {
        Self {
            uid: session.user_id().as_str().to_owned(),
            email: session.email().as_str().to_owned(),
            id_token: session.id_token().expose().to_owned(),
            authenticated_at: session.authenticated_at(),
        }
    }
}

impl StoredIdentity {
    fn into_session(self) -> Option<IdentitySession> {
        let user_id = UserId::new(self.uid).ok()?;
        let email = EmailAddress::new(self.email).ok()?;
        if self.id_token.is_empty() {
            return None;
        }
        Some(IdentitySession::new(
            user_id,
            email,
            IdToken::new(self.id_token),
            self.authenticated_at,
        ))
    }
}

/// Newtype wrapper that exposes identity-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the signed-in identity, rotating the session id.
    pub fn persist_identity(&self, identity: &IdentitySession) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(IDENTITY_KEY, StoredIdentity::from(identity))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Signed-in identity, if the cookie carries a well-formed one.
    pub fn identity(&self) -> Result<Option<IdentitySession>, Error> {
        let stored = match self.0.get::<StoredIdentity>(IDENTITY_KEY) {
            Ok(stored) => stored,
            Err(error) => {
                warn!(%error, "discarding unreadable identity in session cookie");
                None
            }
        };
        Ok(stored.and_then(|stored| {
            let session = stored.into_session();
            if session.is_none() {
                warn!("discarding malformed identity in session cookie");
            }
            session
        }))
    }

    /// Signed-in identity or `401 Unauthorized`.
    pub fn require_identity(&self) -> Result<IdentitySession, Error> {
        self.identity()?
            .ok_or_else(|| Error::unauthorized("No user is logged in."))
    }

    /// Forget the identity and invalidate the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
