//! Domain models.

mod report;

pub use report::{AnalysisPayload, Priority, Report, Sentiment, Theme, SCHEMA_VERSION};
