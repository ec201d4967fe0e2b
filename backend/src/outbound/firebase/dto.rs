//! Wire shapes for Identity Toolkit and Firestore documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{EmailAddress, SubscriptionTier, UserId, UserProfile};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PasswordAuthRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DeleteAccountRequestDto<'a> {
    pub(super) id_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PasswordAuthResponseDto {
    pub(super) id_token: String,
    pub(super) local_id: String,
    pub(super) email: Option<String>,
}

/// Google API error envelope, shared by both services.
#[derive(Debug, Deserialize)]
pub(super) struct GoogleErrorEnvelopeDto {
    pub(super) error: GoogleErrorDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct GoogleErrorDto {
    #[serde(default)]
    pub(super) message: String,
    pub(super) status: Option<String>,
}

impl GoogleErrorDto {
    /// Identity Toolkit codes look like `WEAK_PASSWORD : Password should be ...`.
    pub(super) fn code_and_detail(&self) -> (&str, Option<&str>) {
        match self.message.split_once(" : ") {
            Some((code, detail)) => (code.trim(), Some(detail.trim())),
            None => (self.message.trim(), None),
        }
    }
}

pub(super) const FIELD_UID: &str = "uid";
pub(super) const FIELD_EMAIL: &str = "email";
pub(super) const FIELD_PLAN: &str = "subscriptionPlan";

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct DocumentDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) name: Option<String>,
    #[serde(default)]
    pub(super) fields: BTreeMap<String, ValueDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ValueDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) string_value: Option<String>,
}

impl ValueDto {
    fn string(value: &str) -> Self {
        Self {
            string_value: Some(value.to_owned()),
        }
    }
}

impl DocumentDto {
    pub(super) fn from_profile(profile: &UserProfile) -> Self {
        let fields = BTreeMap::from([
            (FIELD_UID.to_owned(), ValueDto::string(profile.uid().as_str())),
            (FIELD_EMAIL.to_owned(), ValueDto::string(profile.email().as_str())),
            (
                FIELD_PLAN.to_owned(),
                ValueDto::string(profile.subscription_plan().as_str()),
            ),
        ]);
        Self { name: None, fields }
    }

    pub(super) fn tier_only(tier: SubscriptionTier) -> Self {
        let fields = BTreeMap::from([(FIELD_PLAN.to_owned(), ValueDto::string(tier.as_str()))]);
        Self { name: None, fields }
    }

    fn string_field(&self, key: &str) -> Result<&str, String> {
        self.fields
            .get(key)
            .and_then(|value| value.string_value.as_deref())
            .ok_or_else(|| format!("profile document is missing string field `{key}`"))
    }

    pub(super) fn into_profile(self) -> Result<UserProfile, String> {
        let uid = UserId::new(self.string_field(FIELD_UID)?).map_err(|err| err.to_string())?;
        let email =
            EmailAddress::new(self.string_field(FIELD_EMAIL)?).map_err(|err| err.to_string())?;
        let tier = self
            .string_field(FIELD_PLAN)?
            .parse::<SubscriptionTier>()
            .map_err(|err| err.to_string())?;
        Ok(UserProfile::new(uid, email, tier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn documents_round_trip_profiles_as_string_values() {
        let profile = UserProfile::new(
            UserId::new("uid-1").expect("uid"),
            EmailAddress::new("ada@example.com").expect("email"),
            SubscriptionTier::Standard,
        );
        let encoded = serde_json::to_value(DocumentDto::from_profile(&profile)).expect("json");
        assert_eq!(
            encoded,
            json!({"fields": {
                "email": {"stringValue": "ada@example.com"},
                "subscriptionPlan": {"stringValue": "standard"},
                "uid": {"stringValue": "uid-1"},
            }})
        );

        let decoded: DocumentDto = serde_json::from_value(encoded).expect("decode");
        assert_eq!(decoded.into_profile(), Ok(profile));
    }

    #[test]
    fn documents_with_unknown_tiers_fail_to_decode() {
        let document: DocumentDto = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/users/uid-1",
            "fields": {
                "uid": {"stringValue": "uid-1"},
                "email": {"stringValue": "ada@example.com"},
                "subscriptionPlan": {"stringValue": "gold"},
            }
        }))
        .expect("decode");
        assert!(document.into_profile().is_err());
    }

    #[test]
    fn identity_error_codes_split_detail() {
        let error = GoogleErrorDto {
            message: "WEAK_PASSWORD : Password should be at least 6 characters".to_owned(),
            status: None,
        };
        assert_eq!(
            error.code_and_detail(),
            ("WEAK_PASSWORD", Some("Password should be at least 6 characters"))
        );
    }
}
