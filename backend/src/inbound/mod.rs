//! Inbound adapters that translate external requests into domain calls while
//! keeping framework details at the edge.
//!
//! REST handlers live under [`http`]; the live profile stream under [`ws`].

pub mod http;
pub mod ws;
