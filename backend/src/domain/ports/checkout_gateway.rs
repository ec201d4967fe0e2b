//! Driven port for the payment gateway.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{CheckoutSession, CheckoutSessionRequest};

define_port_error! {
    /// Failures raised by payment gateway adapters.
    pub enum CheckoutGatewayError {
        Transport { message: String } => "payment gateway unreachable: {message}",
        Timeout { message: String } => "payment gateway timed out: {message}",
        /// The gateway answered with an error envelope; `message` is its own text.
        Rejected { message: String } => "{message}",
        Decode { message: String } => "payment gateway response could not be decoded: {message}",
    }
}

/// Creates hosted checkout sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, CheckoutGatewayError>;
}
