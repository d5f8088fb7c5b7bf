//! Report models for persisted feedback analysis results.
//!
//! Reports are content-addressed: the SHA-256 fingerprint of the submitted
//! text is the deduplication key, so identical submissions resolve to the
//! same stored report without a second classification call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current analysis payload schema version. Increment when changing the
/// payload shape so old rows can be detected on read.
pub const SCHEMA_VERSION: u32 = 1;

/// Sentiment of a feedback theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Priority of a feedback theme.
///
/// High is reserved for critical issues: data loss, crashes, security
/// flaws, or anything blocking a user's core workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A single theme identified in the submitted feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    /// Free-form category label (e.g. "Bug Report", "Feature Request").
    pub category: String,
    pub sentiment: Sentiment,
    /// One-sentence summary of the theme.
    pub summary: String,
    /// The single most representative user quote.
    pub quote: String,
    /// Number of times the theme was mentioned.
    pub count: u32,
    pub priority: Priority,
}

/// Structured classification result, validated on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPayload {
    /// Payload schema version (absent in upstream responses, set on write).
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub themes: Vec<Theme>,
    pub overall_summary: String,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A persisted analysis report.
///
/// Created once on a dedup miss, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Report {
    /// Generated identifier (UUID v4), used in retrieval URLs.
    pub id: String,
    /// SHA-256 hex fingerprint of the submitted text.
    pub fingerprint: String,
    /// Structured classification result.
    pub payload: AnalysisPayload,
    /// Original submission, kept so quotes can be highlighted later.
    pub source_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Compute the SHA-256 fingerprint of submitted text.
    ///
    /// Deterministic over the exact byte content: identical text always
    /// yields the same fingerprint. Used for dedup, not security.
    pub fn fingerprint_of(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Create a new report for a submission with a fresh identifier.
    pub fn new(text: &str, mut payload: AnalysisPayload) -> Self {
        payload.schema_version = SCHEMA_VERSION;
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            fingerprint: Self::fingerprint_of(text),
            payload,
            source_text: Some(text.to_string()),
            created_at: Utc::now(),
        }
    }
}
