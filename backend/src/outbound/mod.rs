//! Outbound adapters implementing the domain's driven ports.
//!
//! - **gemini**: hosted language model for symptom normalization
//! - **stripe**: hosted checkout sessions
//! - **firebase**: Identity Toolkit accounts and Firestore profile documents
//! - **memory**: process-local stand-ins used when Firebase is not configured
//!
//! Adapters translate between domain types and wire formats; they hold no
//! business rules.

pub mod firebase;
pub mod gemini;
pub(crate) mod http_support;
pub mod memory;
pub mod profile_feed;
pub mod stripe;
