//! Account identity and subscription profile model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum length accepted for identity-provider user ids.
pub const USER_ID_MAX: usize = 128;
/// Maximum length accepted for email addresses.
pub const EMAIL_MAX: usize = 254;

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must not contain surrounding whitespace or slashes")]
    InvalidId,
    #[error("user id must be at most {max} characters")]
    IdTooLong { max: usize },
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email must be at most {max} characters")]
    EmailTooLong { max: usize },
}

/// Opaque identifier issued by the identity provider.
///
/// The value doubles as the profile document key, so it must not contain path
/// separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    ///
    /// ```
    /// use healthsyntra::domain::UserId;
    ///
    /// assert!(UserId::new("Yp3mZ0c1").is_ok());
    /// assert!(UserId::new(" padded ").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id || id.contains('/') {
            return Err(UserValidationError::InvalidId);
        }
        if id.chars().count() > USER_ID_MAX {
            return Err(UserValidationError::IdTooLong { max: USER_ID_MAX });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Email address used for sign-in and as the checkout customer email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    ///
    /// Only presence and length are checked. Syntax and deliverability belong
    /// to the identity provider and the payment gateway.
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into();
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if trimmed.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Subscription level recorded on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Standard,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a tier name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown subscription tier '{value}'")]
pub struct TierParseError {
    pub value: String,
}

impl FromStr for SubscriptionTier {
    type Err = TierParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "free" => Ok(Self::Free),
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            other => Err(TierParseError {
                value: other.to_owned(),
            }),
        }
    }
}

/// Tiers that can be purchased through checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaidTier {
    Standard,
    Premium,
}

impl PaidTier {
    pub const ALL: [PaidTier; 2] = [PaidTier::Standard, PaidTier::Premium];

    pub fn as_str(self) -> &'static str {
        SubscriptionTier::from(self).as_str()
    }
}

impl From<PaidTier> for SubscriptionTier {
    fn from(value: PaidTier) -> Self {
        match value {
            PaidTier::Standard => Self::Standard,
            PaidTier::Premium => Self::Premium,
        }
    }
}

impl FromStr for PaidTier {
    type Err = TierParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.parse::<SubscriptionTier>()? {
            SubscriptionTier::Standard => Ok(Self::Standard),
            SubscriptionTier::Premium => Ok(Self::Premium),
            SubscriptionTier::Free => Err(TierParseError {
                value: value.to_owned(),
            }),
        }
    }
}

impl fmt::Display for PaidTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted account profile, keyed by the identity-provider user id.
///
/// ## Invariants
/// - `uid` matches the identity the profile belongs to.
/// - `subscription_plan` is one of the closed [`SubscriptionTier`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[schema(value_type = String, example = "Yp3mZ0c1Qh")]
    uid: UserId,
    #[schema(value_type = String, example = "ada@example.com")]
    email: EmailAddress,
    subscription_plan: SubscriptionTier,
}

impl UserProfile {
    pub fn new(uid: UserId, email: EmailAddress, subscription_plan: SubscriptionTier) -> Self {
        Self {
            uid,
            email,
            subscription_plan,
        }
    }

    /// Profile created on first sign-up.
    pub fn registered(uid: UserId, email: EmailAddress) -> Self {
        Self::new(uid, email, SubscriptionTier::Free)
    }

    pub fn uid(&self) -> &UserId {
        &self.uid
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn subscription_plan(&self) -> SubscriptionTier {
        self.subscription_plan
    }

    /// Return a copy with only the tier replaced.
    #[must_use]
    pub fn with_tier(&self, tier: SubscriptionTier) -> Self {
        Self {
            subscription_plan: tier,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case(" abc", UserValidationError::InvalidId)]
    #[case("users/abc", UserValidationError::InvalidId)]
    fn rejects_invalid_user_ids(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[test]
    fn rejects_overlong_user_ids() {
        let raw = "a".repeat(USER_ID_MAX + 1);
        assert_eq!(
            UserId::new(raw),
            Err(UserValidationError::IdTooLong { max: USER_ID_MAX })
        );
    }

    #[rstest]
    #[case("ada@example.com", Ok("ada@example.com"))]
    #[case("  ada@example.com  ", Ok("ada@example.com"))]
    #[case("not-an-address", Ok("not-an-address"))]
    #[case("   ", Err(UserValidationError::EmptyEmail))]
    fn email_only_requires_presence(
        #[case] raw: &str,
        #[case] expected: Result<&str, UserValidationError>,
    ) {
        let parsed = EmailAddress::new(raw);
        assert_eq!(parsed.as_ref().map(EmailAddress::as_str), expected.as_ref().map(|s| *s));
    }

    #[rstest]
    #[case("free", Some(SubscriptionTier::Free))]
    #[case("standard", Some(SubscriptionTier::Standard))]
    #[case("premium", Some(SubscriptionTier::Premium))]
    #[case("Premium", None)]
    #[case("gold", None)]
    fn parses_tiers(#[case] raw: &str, #[case] expected: Option<SubscriptionTier>) {
        assert_eq!(raw.parse::<SubscriptionTier>().ok(), expected);
    }

    #[test]
    fn free_is_not_a_paid_tier() {
        assert!("free".parse::<PaidTier>().is_err());
        assert_eq!("premium".parse::<PaidTier>(), Ok(PaidTier::Premium));
    }

    #[test]
    fn profile_serialises_with_camel_case_fields() {
        let profile = UserProfile::registered(
            UserId::new("uid-1").expect("uid"),
            EmailAddress::new("ada@example.com").expect("email"),
        );
        let value = serde_json::to_value(&profile).expect("serialise profile");
        assert_eq!(
            value,
            json!({ "uid": "uid-1", "email": "ada@example.com", "subscriptionPlan": "free" })
        );
    }

    #[test]
    fn with_tier_keeps_identity_fields() {
        let profile = UserProfile::registered(
            UserId::new("uid-1").expect("uid"),
            EmailAddress::new("ada@example.com").expect("email"),
        );
        let upgraded = profile.with_tier(SubscriptionTier::Premium);
        assert_eq!(upgraded.uid(), profile.uid());
        assert_eq!(upgraded.email(), profile.email());
        assert_eq!(upgraded.subscription_plan(), SubscriptionTier::Premium);
    }
}
