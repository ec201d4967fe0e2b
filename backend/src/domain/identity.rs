//! Identity-provider session primitives.
//!
//! Sign-in produces an [`IdentitySession`]: the user id and email the provider
//! vouches for, the bearer token used to act on the user's behalf, and the
//! moment the credentials were last checked. Sensitive operations compare that
//! moment against the recent-login window.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use zeroize::Zeroizing;

use super::{EmailAddress, UserId, UserValidationError};

/// Default window within which a sign-in counts as recent.
pub const DEFAULT_RECENT_LOGIN_WINDOW: Duration = Duration::from_secs(300);

/// Validation failures for sign-in and sign-up payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    #[error(transparent)]
    Email(#[from] UserValidationError),
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Password held only for the duration of one provider call.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    pub fn new(raw: impl Into<String>) -> Result<Self, CredentialsValidationError> {
        let raw = Zeroizing::new(raw.into());
        if raw.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self(raw))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Email and password pair submitted to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    email: EmailAddress,
    password: Password,
}

impl Credentials {
    /// Validate raw sign-in input.
    ///
    /// ```
    /// use healthsyntra::domain::Credentials;
    ///
    /// let creds = Credentials::try_from_parts("ada@example.com", "hunter22").expect("valid");
    /// assert_eq!(creds.email().as_str(), "ada@example.com");
    /// assert!(Credentials::try_from_parts("ada@example.com", "").is_err());
    /// ```
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        Ok(Self {
            email: EmailAddress::new(email)?,
            password: Password::new(password)?,
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &Password {
        &self.password
    }
}

/// Bearer token minted by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct IdToken(Zeroizing<String>);

impl IdToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdToken(<redacted>)")
    }
}

/// An authenticated identity as vouched for by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySession {
    user_id: UserId,
    email: EmailAddress,
    id_token: IdToken,
    authenticated_at: DateTime<Utc>,
}

impl IdentitySession {
    pub fn new(
        user_id: UserId,
        email: EmailAddress,
        id_token: IdToken,
        authenticated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            email,
            id_token,
            authenticated_at,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn id_token(&self) -> &IdToken {
        &self.id_token
    }

    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }

    /// Whether the sign-in happened within `window` of `now`.
    ///
    /// Timestamps in the future count as recent; clock skew between nodes
    /// should not lock users out of their own account.
    pub fn is_recent(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.authenticated_at) <= window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn session_at(authenticated_at: DateTime<Utc>) -> IdentitySession {
        IdentitySession::new(
            UserId::new("uid-1").expect("uid"),
            EmailAddress::new("ada@example.com").expect("email"),
            IdToken::new("token"),
            authenticated_at,
        )
    }

    #[rstest]
    #[case(0, true)]
    #[case(299, true)]
    #[case(300, true)]
    #[case(301, false)]
    #[case(-30, true)]
    fn recent_login_window_is_inclusive(#[case] elapsed_secs: i64, #[case] expected: bool) {
        let signed_in = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        let now = signed_in + TimeDelta::seconds(elapsed_secs);
        assert_eq!(
            session_at(signed_in).is_recent(now, DEFAULT_RECENT_LOGIN_WINDOW),
            expected
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let session = session_at(Utc::now());
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("\"token\""));
        assert!(rendered.contains("<redacted>"));

        let creds = Credentials::try_from_parts("ada@example.com", "s3cret").expect("creds");
        assert!(!format!("{creds:?}").contains("s3cret"));
    }

    #[test]
    fn rejects_blank_email_in_credentials() {
        let result = Credentials::try_from_parts("   ", "pw");
        assert!(matches!(result, Err(CredentialsValidationError::Email(_))));
    }
}
