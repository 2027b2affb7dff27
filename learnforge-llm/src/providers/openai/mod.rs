//! OpenAI-compatible chat completions backend
//!
//! Works against any server exposing `/v1/chat/completions` with JSON mode.

pub mod client;
pub mod types;

pub use client::{OpenAIClient, DEFAULT_BASE_URL, DEFAULT_MODEL, PROVIDER_ID};
