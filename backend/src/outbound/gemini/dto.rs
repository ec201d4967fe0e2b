//! Wire shapes for `models/{model}:generateContent`.
//!
//! Requests are built from a domain `ModelPrompt`; responses are reduced to
//! the text of the first candidate or a block reason.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::{ModelPrompt, SafetyCategory, SafetyThreshold};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentRequestDto {
    pub(super) contents: Vec<ContentDto>,
    pub(super) safety_settings: Vec<SafetySettingDto>,
    pub(super) generation_config: GenerationConfigDto,
}

#[derive(Debug, Serialize)]
pub(super) struct ContentDto {
    pub(super) role: &'static str,
    pub(super) parts: Vec<TextPartDto>,
}

#[derive(Debug, Serialize)]
pub(super) struct TextPartDto {
    pub(super) text: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SafetySettingDto {
    pub(super) category: &'static str,
    pub(super) threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerationConfigDto {
    pub(super) response_mime_type: &'static str,
    pub(super) response_schema: Value,
}

fn category_name(category: SafetyCategory) -> &'static str {
    match category {
        SafetyCategory::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        SafetyCategory::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    }
}

fn threshold_name(threshold: SafetyThreshold) -> &'static str {
    match threshold {
        SafetyThreshold::BlockNone => "BLOCK_NONE",
    }
}

/// Object schema with one required string property.
fn single_string_schema(field: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": { field: { "type": "STRING" } },
        "required": [field],
    })
}

impl From<&ModelPrompt> for GenerateContentRequestDto {
    fn from(prompt: &ModelPrompt) -> Self {
        Self {
            contents: vec![ContentDto {
                role: "user",
                parts: vec![TextPartDto {
                    text: prompt.text().to_owned(),
                }],
            }],
            safety_settings: prompt
                .safety_overrides()
                .iter()
                .map(|item| SafetySettingDto {
                    category: category_name(item.category),
                    threshold: threshold_name(item.threshold),
                })
                .collect(),
            generation_config: GenerationConfigDto {
                response_mime_type: "application/json",
                response_schema: single_string_schema(prompt.output_field()),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentResponseDto {
    #[serde(default)]
    pub(super) candidates: Vec<CandidateDto>,
    pub(super) prompt_feedback: Option<PromptFeedbackDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CandidateDto {
    pub(super) content: Option<CandidateContentDto>,
    pub(super) finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CandidateContentDto {
    #[serde(default)]
    pub(super) parts: Vec<CandidatePartDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CandidatePartDto {
    pub(super) text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PromptFeedbackDto {
    pub(super) block_reason: Option<String>,
}

/// What a decoded response amounts to.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum GenerateOutcome {
    Text(String),
    Blocked(String),
    Empty,
}

impl GenerateContentResponseDto {
    pub(super) fn into_outcome(self) -> GenerateOutcome {
        if let Some(reason) = self.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            return GenerateOutcome::Blocked(reason);
        }
        let Some(candidate) = self.candidates.into_iter().next() else {
            return GenerateOutcome::Empty;
        };
        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();
        if !text.is_empty() {
            return GenerateOutcome::Text(text);
        }
        match candidate.finish_reason {
            Some(reason) if matches!(reason.as_str(), "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST") => {
                GenerateOutcome::Blocked(reason)
            }
            _ => GenerateOutcome::Empty,
        }
    }
}

/// `{ "error": { "message": ... } }` envelope on non-success statuses.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    pub(super) message: String,
}
