//! Service layer for pulsecheck business logic.
//!
//! Domain logic separated from transport concerns, usable from both the
//! web server and the CLI.

pub mod analysis;

pub use analysis::{AnalysisService, SubmitError, SubmitOutcome};
