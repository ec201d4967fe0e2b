//! Google Generative Language adapter for the symptom model port.

mod dto;
mod http_model;

pub use http_model::{GeminiSettings, GeminiSymptomModel};
