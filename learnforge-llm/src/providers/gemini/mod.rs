//! Gemini `generateContent` backend

pub mod client;
pub mod types;

pub use client::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_MODEL, PROVIDER_ID};
