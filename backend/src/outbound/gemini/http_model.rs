//! Reqwest-backed `SymptomModel` calling `generateContent`.
//!
//! The adapter owns transport concerns only: request serialisation, timeout
//! and status mapping, and reducing the envelope to candidate text. Whether
//! that text satisfies the output schema is decided by the domain service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{ErrorEnvelopeDto, GenerateContentRequestDto, GenerateContentResponseDto, GenerateOutcome};
use crate::domain::ModelPrompt;
use crate::domain::ports::{SymptomModel, SymptomModelError};
use crate::outbound::http_support::{body_preview, client_with_timeout, status_message};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for the Generative Language API.
#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: Zeroizing<String>,
    /// Model id, for example `gemini-2.0-flash`.
    pub model: String,
    /// API root including the version segment.
    pub api_base: Url,
    pub timeout: Duration,
}

/// Symptom model backed by one Gemini model.
pub struct GeminiSymptomModel {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
}

impl GeminiSymptomModel {
    /// # Errors
    ///
    /// Returns [`SymptomModelError::Rejected`] when the endpoint cannot be
    /// derived from the settings and [`SymptomModelError::Transport`] when the
    /// client cannot be built.
    pub fn new(settings: GeminiSettings) -> Result<Self, SymptomModelError> {
        let endpoint = generate_endpoint(&settings.api_base, &settings.model)?;
        let client = client_with_timeout(settings.timeout)
            .map_err(|err| SymptomModelError::transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key,
        })
    }
}

#[async_trait]
impl SymptomModel for GeminiSymptomModel {
    async fn generate(&self, prompt: &ModelPrompt) -> Result<String, SymptomModelError> {
        let body = GenerateContentRequestDto::from(prompt);
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        decode_text(bytes.as_ref())
    }
}

fn generate_endpoint(api_base: &Url, model: &str) -> Result<Url, SymptomModelError> {
    let model = model.trim();
    if model.is_empty() || model.contains('/') {
        return Err(SymptomModelError::rejected(format!(
            "invalid model id {model:?}"
        )));
    }
    let base = api_base.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/models/{model}:generateContent"))
        .map_err(|err| SymptomModelError::rejected(format!("invalid model endpoint: {err}")))
}

fn decode_text(body: &[u8]) -> Result<String, SymptomModelError> {
    let decoded: GenerateContentResponseDto = serde_json::from_slice(body).map_err(|err| {
        SymptomModelError::decode(format!("invalid generateContent payload: {err}"))
    })?;
    match decoded.into_outcome() {
        GenerateOutcome::Text(text) => Ok(text),
        GenerateOutcome::Blocked(reason) => {
            debug!(%reason, "model blocked symptom prompt");
            Err(SymptomModelError::blocked(reason))
        }
        GenerateOutcome::Empty => Err(SymptomModelError::decode(format!(
            "response carried no candidate text: {}",
            body_preview(body)
        ))),
    }
}

fn map_transport_error(error: reqwest::Error) -> SymptomModelError {
    if error.is_timeout() {
        SymptomModelError::timeout(error.to_string())
    } else {
        SymptomModelError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> SymptomModelError {
    let message = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .map(|envelope| format!("status {}: {}", status.as_u16(), envelope.error.message))
        .unwrap_or_else(|_| status_message(status, body));
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            SymptomModelError::timeout(message)
        }
        _ if status.is_client_error() => SymptomModelError::rejected(message),
        _ => SymptomModelError::transport(message),
    }
}
