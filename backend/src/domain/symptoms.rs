//! Symptom normalization request and response model.
//!
//! The normalizer hands a fixed instruction to a hosted language model and
//! accepts only a JSON object with exactly one string property,
//! [`NORMALIZED_SYMPTOMS_FIELD`]. Anything else is a schema failure; the raw
//! output is never coerced into shape.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value, json};

use super::Error;

/// Name of the only property the model may return.
pub const NORMALIZED_SYMPTOMS_FIELD: &str = "normalizedSymptoms";

const PROMPT_TEMPLATE: &str = "You are a medical AI assistant responsible for normalizing \
user-reported symptoms into standardized medical terminology.

User Symptoms: {symptoms}

Convert the user's symptoms into a concise, clear, and standardized string. \
Your response MUST be a JSON object with a single key \"normalizedSymptoms\".

Example:
User Symptoms: \"my head is pounding and my nose is runny\"
Output: {\"normalizedSymptoms\": \"Severe headache, rhinorrhea\"}

Now, process the provided user symptoms.";

/// Input validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymptomValidationError {
    #[error("symptoms must not be empty")]
    Empty,
}

/// Free-text symptom description exactly as the user typed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomDescription(String);

impl SymptomDescription {
    /// ```
    /// use healthsyntra::domain::SymptomDescription;
    ///
    /// assert!(SymptomDescription::new("  sore throat ").is_ok());
    /// assert!(SymptomDescription::new(" \n ").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, SymptomValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(SymptomValidationError::Empty);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Clinically styled paraphrase returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedSymptoms(String);

impl NormalizedSymptoms {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for NormalizedSymptoms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content-safety categories the model service can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyCategory {
    DangerousContent,
    SexuallyExplicit,
}

/// Filter thresholds; only the relaxed setting is needed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyThreshold {
    BlockNone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyOverride {
    pub category: SafetyCategory,
    pub threshold: SafetyThreshold,
}

/// Everything a model adapter needs to issue one normalization call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPrompt {
    text: String,
    output_field: &'static str,
    safety_overrides: Vec<SafetyOverride>,
}

impl ModelPrompt {
    /// Build the normalization prompt for `symptoms`.
    ///
    /// The symptoms are embedded verbatim. Two safety filters are relaxed for
    /// this call because symptom descriptions routinely mention injuries,
    /// overdoses and sexual health.
    pub fn for_symptoms(symptoms: &SymptomDescription) -> Self {
        Self {
            text: PROMPT_TEMPLATE.replacen("{symptoms}", symptoms.as_str(), 1),
            output_field: NORMALIZED_SYMPTOMS_FIELD,
            safety_overrides: vec![
                SafetyOverride {
                    category: SafetyCategory::DangerousContent,
                    threshold: SafetyThreshold::BlockNone,
                },
                SafetyOverride {
                    category: SafetyCategory::SexuallyExplicit,
                    threshold: SafetyThreshold::BlockNone,
                },
            ],
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// The single required string property of the expected output object.
    pub fn output_field(&self) -> &'static str {
        self.output_field
    }

    pub fn safety_overrides(&self) -> &[SafetyOverride] {
        &self.safety_overrides
    }
}

/// Failure taxonomy for the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymptomNormalizationError {
    #[error(transparent)]
    Validation(#[from] SymptomValidationError),
    #[error("symptom normalization is not configured")]
    Configuration,
    #[error("model output did not match the required shape: {reason}")]
    SchemaValidation { reason: String },
    #[error("model service failed: {message}")]
    UpstreamService { message: String },
}

impl SymptomNormalizationError {
    pub fn schema_validation(reason: impl Into<String>) -> Self {
        Self::SchemaValidation {
            reason: reason.into(),
        }
    }

    pub fn upstream_service(message: impl Into<String>) -> Self {
        Self::UpstreamService {
            message: message.into(),
        }
    }
}

impl From<SymptomNormalizationError> for Error {
    fn from(value: SymptomNormalizationError) -> Self {
        match value {
            SymptomNormalizationError::Validation(err) => Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "symptoms", "code": "empty_symptoms" })),
            SymptomNormalizationError::Configuration => {
                Error::internal("symptom normalization is not configured")
            }
            SymptomNormalizationError::SchemaValidation { .. } => Error::upstream_failure(
                "The symptom service returned an unexpected response. Please try again.",
            )
            .with_details(json!({ "code": "schema_validation" })),
            SymptomNormalizationError::UpstreamService { .. } => Error::upstream_failure(
                "The symptom service is currently unavailable. Please try again later.",
            )
            .with_details(json!({ "code": "upstream_service" })),
        }
    }
}

/// Validate raw model output against the single-key schema.
///
/// ```
/// use healthsyntra::domain::parse_normalized_output;
///
/// let parsed = parse_normalized_output(r#"{"normalizedSymptoms":"Headache"}"#).expect("valid");
/// assert_eq!(parsed.as_str(), "Headache");
/// assert!(parse_normalized_output(r#"{"normalizedSymptoms":"x","extra":1}"#).is_err());
/// ```
pub fn parse_normalized_output(raw: &str) -> Result<NormalizedSymptoms, SymptomNormalizationError> {
    let object: Map<String, Value> = serde_json::from_str(raw.trim()).map_err(|err| {
        SymptomNormalizationError::schema_validation(format!("not a JSON object: {err}"))
    })?;
    if object.len() != 1 {
        return Err(SymptomNormalizationError::schema_validation(format!(
            "expected exactly one key, found {}",
            object.len()
        )));
    }
    match object.get(NORMALIZED_SYMPTOMS_FIELD) {
        Some(Value::String(text)) if !text.trim().is_empty() => {
            Ok(NormalizedSymptoms(text.clone()))
        }
        Some(Value::String(_)) => Err(SymptomNormalizationError::schema_validation(
            "normalizedSymptoms is empty",
        )),
        Some(_) => Err(SymptomNormalizationError::schema_validation(
            "normalizedSymptoms is not a string",
        )),
        None => Err(SymptomNormalizationError::schema_validation(
            "missing normalizedSymptoms",
        )),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for prompt construction and output validation.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[test]
    fn prompt_embeds_symptoms_verbatim() {
        let symptoms =
            SymptomDescription::new("my knee {clicks} when I\nclimb stairs").expect("symptoms");
        let prompt = ModelPrompt::for_symptoms(&symptoms);
        assert!(
            prompt
                .text()
                .contains("User Symptoms: my knee {clicks} when I\nclimb stairs")
        );
        assert!(prompt.text().contains("\"Severe headache, rhinorrhea\""));
        assert_eq!(prompt.output_field(), "normalizedSymptoms");
    }

    #[test]
    fn prompt_relaxes_exactly_two_safety_filters() {
        let symptoms = SymptomDescription::new("cough").expect("symptoms");
        let prompt = ModelPrompt::for_symptoms(&symptoms);
        let categories: Vec<_> = prompt
            .safety_overrides()
            .iter()
            .map(|o| (o.category, o.threshold))
            .collect();
        assert_eq!(
            categories,
            vec![
                (SafetyCategory::DangerousContent, SafetyThreshold::BlockNone),
                (SafetyCategory::SexuallyExplicit, SafetyThreshold::BlockNone),
            ]
        );
    }

    #[rstest]
    #[case::not_json("Severe headache")]
    #[case::array(r#"["Severe headache"]"#)]
    #[case::wrong_key(r#"{"normalized":"Severe headache"}"#)]
    #[case::extra_key(r#"{"normalizedSymptoms":"Severe headache","confidence":0.9}"#)]
    #[case::number(r#"{"normalizedSymptoms":42}"#)]
    #[case::blank(r#"{"normalizedSymptoms":"  "}"#)]
    #[case::fenced("```json\n{\"normalizedSymptoms\":\"Severe headache\"}\n```")]
    fn rejects_nonconforming_output(#[case] raw: &str) {
        let err = parse_normalized_output(raw).expect_err("output should be rejected");
        assert!(matches!(
            err,
            SymptomNormalizationError::SchemaValidation { .. }
        ));
    }

    #[test]
    fn accepts_single_key_output_with_whitespace() {
        let parsed = parse_normalized_output("\n{ \"normalizedSymptoms\": \"Severe headache, rhinorrhea\" }\n")
            .expect("valid output");
        assert_eq!(parsed.as_str(), "Severe headache, rhinorrhea");
    }

    #[rstest]
    #[case(SymptomNormalizationError::Validation(SymptomValidationError::Empty), ErrorCode::InvalidRequest, None)]
    #[case(SymptomNormalizationError::Configuration, ErrorCode::InternalError, None)]
    #[case(SymptomNormalizationError::schema_validation("x"), ErrorCode::UpstreamFailure, Some("schema_validation"))]
    #[case(SymptomNormalizationError::upstream_service("x"), ErrorCode::UpstreamFailure, Some("upstream_service"))]
    fn maps_to_domain_errors(
        #[case] err: SymptomNormalizationError,
        #[case] code: ErrorCode,
        #[case] detail_code: Option<&str>,
    ) {
        let mapped = Error::from(err);
        assert_eq!(mapped.code(), code);
        if let Some(expected) = detail_code {
            let details = mapped.details().expect("details present");
            assert_eq!(details["code"], expected);
        }
    }
}
