//! `IdentityProvider` holding accounts in process memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{
    Credentials, DEFAULT_RECENT_LOGIN_WINDOW, EmailAddress, IdToken, IdentitySession, UserId,
};

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 6;

struct Account {
    user_id: UserId,
    password_digest: [u8; 32],
}

fn digest(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

/// Email/password accounts with opaque random tokens.
///
/// Passwords are kept only as SHA-256 digests. This adapter is not meant for
/// production traffic.
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<EmailAddress, Account>>,
    clock: Arc<dyn Clock>,
    recent_login_window: Duration,
}

impl InMemoryIdentityProvider {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_recent_login_window(clock, DEFAULT_RECENT_LOGIN_WINDOW)
    }

    pub fn with_recent_login_window(clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            clock,
            recent_login_window: window,
        }
    }

    fn accounts(&self) -> MutexGuard<'_, HashMap<EmailAddress, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue(&self, user_id: UserId, email: EmailAddress) -> IdentitySession {
        let token = IdToken::new(Uuid::new_v4().simple().to_string());
        IdentitySession::new(user_id, email, token, self.clock.utc())
    }

    fn owns(&self, session: &IdentitySession) -> bool {
        self.accounts()
            .get(session.email())
            .is_some_and(|account| &account.user_id == session.user_id())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> Result<IdentitySession, IdentityProviderError> {
        let password = credentials.password().expose();
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(IdentityProviderError::weak_password(format!(
                "Password should be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        let email = credentials.email().clone();
        let user_id = UserId::new(Uuid::new_v4().simple().to_string())
            .map_err(|err| IdentityProviderError::decode(err.to_string()))?;
        {
            let mut accounts = self.accounts();
            if accounts.contains_key(&email) {
                return Err(IdentityProviderError::email_in_use());
            }
            accounts.insert(
                email.clone(),
                Account {
                    user_id: user_id.clone(),
                    password_digest: digest(password),
                },
            );
        }
        Ok(self.issue(user_id, email))
    }

    async fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> Result<IdentitySession, IdentityProviderError> {
        let user_id = {
            let accounts = self.accounts();
            let account = accounts
                .get(credentials.email())
                .filter(|account| account.password_digest == digest(credentials.password().expose()))
                .ok_or_else(IdentityProviderError::invalid_credentials)?;
            account.user_id.clone()
        };
        Ok(self.issue(user_id, credentials.email().clone()))
    }

    fn is_session_fresh(&self, session: &IdentitySession) -> bool {
        session.is_recent(self.clock.utc(), self.recent_login_window)
    }

    async fn delete_account(&self, session: &IdentitySession) -> Result<(), IdentityProviderError> {
        if !self.owns(session) {
            return Err(IdentityProviderError::session_expired());
        }
        if !self.is_session_fresh(session) {
            return Err(IdentityProviderError::requires_recent_login());
        }
        self.accounts().remove(session.email());
        Ok(())
    }
}
