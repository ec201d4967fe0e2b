//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see driving ports, so
//! they can be exercised with test doubles.

use std::sync::Arc;

use crate::domain::ports::{AccountCommand, CheckoutInitiator, SymptomNormalizer};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub symptoms: Arc<dyn SymptomNormalizer>,
    pub checkout: Arc<dyn CheckoutInitiator>,
    pub accounts: Arc<dyn AccountCommand>,
}

impl HttpState {
    pub fn new(
        symptoms: Arc<dyn SymptomNormalizer>,
        checkout: Arc<dyn CheckoutInitiator>,
        accounts: Arc<dyn AccountCommand>,
    ) -> Self {
        Self {
            symptoms,
            checkout,
            accounts,
        }
    }
}
