//! pulsecheck - customer feedback analysis service.
//!
//! Accepts raw feedback text, classifies it into structured themes via an
//! LLM API, and persists the result keyed by a content fingerprint so
//! identical submissions never pay for a second classification call.

pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod rate_limit;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
