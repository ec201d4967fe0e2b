//! Driven port for the hosted language model.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::ModelPrompt;

define_port_error! {
    /// Failures raised by language-model adapters.
    pub enum SymptomModelError {
        /// The request could not be delivered or the connection failed.
        Transport { message: String } => "model transport failed: {message}",
        /// The service did not answer within the configured timeout.
        Timeout { message: String } => "model request timed out: {message}",
        /// The service refused the request (bad key, quota, malformed request).
        Rejected { message: String } => "model request rejected: {message}",
        /// The prompt or every candidate was stopped by a safety filter.
        Blocked { reason: String } => "model blocked the prompt: {reason}",
        /// The service envelope could not be decoded.
        Decode { message: String } => "model response could not be decoded: {message}",
    }
}

/// Generates raw text for a prompt; validation is the caller's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SymptomModel: Send + Sync {
    async fn generate(&self, prompt: &ModelPrompt) -> Result<String, SymptomModelError>;
}
