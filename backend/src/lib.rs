//! Healthsyntra backend library.
//!
//! The domain core lives in [`domain`]; [`inbound`] exposes it over HTTP and
//! WebSocket and [`outbound`] talks to Gemini, Stripe and Firebase. The
//! `healthsyntra` binary wires the pieces together from [`config`].

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
