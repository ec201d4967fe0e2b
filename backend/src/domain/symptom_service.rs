//! Symptom normalization use-case.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ports::{SymptomModel, SymptomNormalizer};
use super::{
    ModelPrompt, NormalizedSymptoms, SymptomDescription, SymptomNormalizationError,
    parse_normalized_output,
};

/// Normalizer backed by a hosted language model.
///
/// Built without a model when no API key is configured; every call then fails
/// with [`SymptomNormalizationError::Configuration`].
pub struct SymptomNormalizationService<M: ?Sized> {
    model: Option<Arc<M>>,
}

impl<M: ?Sized> SymptomNormalizationService<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self { model: Some(model) }
    }

    pub fn unconfigured() -> Self {
        Self { model: None }
    }
}

#[async_trait]
impl<M> SymptomNormalizer for SymptomNormalizationService<M>
where
    M: SymptomModel + ?Sized,
{
    async fn normalize(
        &self,
        symptoms: &SymptomDescription,
    ) -> Result<NormalizedSymptoms, SymptomNormalizationError> {
        let model = self
            .model
            .as_ref()
            .ok_or(SymptomNormalizationError::Configuration)?;
        let prompt = ModelPrompt::for_symptoms(symptoms);
        let raw = model.generate(&prompt).await.map_err(|err| {
            warn!(error = %err, "symptom model call failed");
            SymptomNormalizationError::upstream_service(err.to_string())
        })?;
        parse_normalized_output(&raw).inspect_err(|err| {
            debug!(error = %err, output_len = raw.len(), "symptom model output rejected");
        })
    }
}
