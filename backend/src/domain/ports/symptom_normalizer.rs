//! Driving port for symptom normalization.

use async_trait::async_trait;

use crate::domain::{NormalizedSymptoms, SymptomDescription, SymptomNormalizationError};

/// Use-case port called by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SymptomNormalizer: Send + Sync {
    async fn normalize(
        &self,
        symptoms: &SymptomDescription,
    ) -> Result<NormalizedSymptoms, SymptomNormalizationError>;
}
