//! Stripe Checkout adapter for the payment gateway port.

mod dto;
mod http_gateway;

pub use http_gateway::{StripeCheckoutGateway, StripeSettings};
