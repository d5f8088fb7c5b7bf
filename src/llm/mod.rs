//! Classification layer: turns raw feedback text into a structured
//! analysis payload via an OpenAI-compatible chat-completions API.

mod client;

pub use client::{AnalysisError, LlmConfig, OpenAiClient, DEFAULT_ANALYSIS_PROMPT};

use async_trait::async_trait;

use crate::models::AnalysisPayload;

/// Classification capability.
///
/// A trait seam so the handler and its tests can swap the real API client
/// for a counting mock.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Classify feedback text into themes.
    async fn analyze(&self, text: &str) -> Result<AnalysisPayload, AnalysisError>;
}
