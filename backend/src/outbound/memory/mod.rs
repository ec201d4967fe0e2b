//! Process-local adapters for development and tests.
//!
//! These stand in for Firebase when no project is configured. State lives for
//! the lifetime of the process.

mod identity;
mod profile_store;

pub use identity::InMemoryIdentityProvider;
pub use profile_store::InMemoryProfileStore;
