//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports (`SymptomModel`, `CheckoutGateway`, `ProfileStore`,
//! `IdentityProvider`) describe what the domain needs from external services.
//! Driving ports (`SymptomNormalizer`, `CheckoutInitiator`, `AccountCommand`)
//! are what inbound adapters call. Each driven port carries its own typed
//! error so adapters map failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod checkout_gateway;
mod checkout_initiator;
mod identity_provider;
mod profile_store;
mod symptom_model;
mod symptom_normalizer;

#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_command::AccountCommand;
#[cfg(test)]
pub use checkout_gateway::MockCheckoutGateway;
pub use checkout_gateway::{CheckoutGateway, CheckoutGatewayError};
#[cfg(test)]
pub use checkout_initiator::MockCheckoutInitiator;
pub use checkout_initiator::CheckoutInitiator;
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{IdentityProvider, IdentityProviderError};
#[cfg(test)]
pub use profile_store::MockProfileStore;
pub use profile_store::{
    ProfileListener, ProfileSnapshot, ProfileStore, ProfileStoreError, SubscriptionHandle,
};
#[cfg(test)]
pub use symptom_model::MockSymptomModel;
pub use symptom_model::{SymptomModel, SymptomModelError};
#[cfg(test)]
pub use symptom_normalizer::MockSymptomNormalizer;
pub use symptom_normalizer::SymptomNormalizer;
