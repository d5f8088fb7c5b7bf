//! Feedback analysis service.
//!
//! Runs the submission pipeline: fingerprint the text, look for an
//! existing report with that fingerprint, classify on a miss, persist the
//! result. The dedup lookup guarantees at most one external call per
//! unique text (barring concurrent identical submissions, which may each
//! pay for a call; the reports table's UNIQUE constraint then fails the
//! losing insert rather than writing a second row).

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::llm::{AnalysisError, Analyzer};
use crate::models::Report;
use crate::repository::{DieselError, ReportRepository};

/// Failure modes of a submission, each terminal for the current call.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Input text is required.")]
    EmptyInput,
    #[error("Feedback text exceeds the {0} word limit.")]
    TooLong(usize),
    #[error("classification failed: {0}")]
    Classification(#[from] AnalysisError),
    #[error("storage failed: {0}")]
    Storage(#[from] DieselError),
}

/// Result of a submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// Identifier of the report (existing on a dedup hit, fresh otherwise).
    pub report_id: String,
    /// Whether an existing report was returned instead of a new one.
    pub deduplicated: bool,
}

/// Maximum submission length in words.
pub const MAX_SUBMISSION_WORDS: usize = 2000;

/// Service that turns feedback text into persisted reports.
pub struct AnalysisService {
    reports: ReportRepository,
    analyzer: Arc<dyn Analyzer>,
}

impl AnalysisService {
    /// Create a new analysis service.
    pub fn new(reports: ReportRepository, analyzer: Arc<dyn Analyzer>) -> Self {
        Self { reports, analyzer }
    }

    /// Submit feedback text for analysis.
    ///
    /// Either a report is fully written or nothing is: the only write is a
    /// single insert after classification succeeds.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, SubmitError> {
        if text.trim().is_empty() {
            return Err(SubmitError::EmptyInput);
        }
        if text.split_whitespace().count() > MAX_SUBMISSION_WORDS {
            return Err(SubmitError::TooLong(MAX_SUBMISSION_WORDS));
        }

        // Fingerprint covers the exact submitted string
        let fingerprint = Report::fingerprint_of(text);

        // Dedup lookup: only a definitive "no matching row" proceeds to
        // classification. Any other failure aborts without an external call.
        if let Some(id) = self.reports.find_id_by_fingerprint(&fingerprint).await? {
            debug!("Deduplication hit, returning existing report {}", id);
            return Ok(SubmitOutcome {
                report_id: id,
                deduplicated: true,
            });
        }

        let payload = self.analyzer.analyze(text).await?;

        let report = Report::new(text, payload);
        self.reports.insert(&report).await?;

        info!("Saved new report {}", report.id);
        Ok(SubmitOutcome {
            report_id: report.id,
            deduplicated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::tempdir;

    use crate::models::AnalysisPayload;
    use crate::repository::AsyncSqlitePool;

    /// Analyzer stub that counts invocations and can be set to fail.
    struct MockAnalyzer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MockAnalyzer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Analyzer for MockAnalyzer {
        async fn analyze(&self, _text: &str) -> Result<AnalysisPayload, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AnalysisError::Api {
                    status: 503,
                    detail: "overloaded".to_string(),
                });
            }
            Ok(AnalysisPayload {
                schema_version: crate::models::SCHEMA_VERSION,
                themes: vec![],
                overall_summary: "Nothing notable.".to_string(),
            })
        }
    }

    async fn setup_service(
        analyzer: Arc<MockAnalyzer>,
    ) -> (AnalysisService, ReportRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let pool = AsyncSqlitePool::from_path(&dir.path().join("test.db"));
        let repo = ReportRepository::new(pool);
        repo.init_schema().await.unwrap();

        let service = AnalysisService::new(repo.clone(), analyzer);
        (service, repo, dir)
    }

    #[tokio::test]
    async fn test_fresh_submission_creates_report() {
        let analyzer = Arc::new(MockAnalyzer::new());
        let (service, repo, _dir) = setup_service(analyzer.clone()).await;

        let outcome = service.submit("Crashes on export").await.unwrap();
        assert!(!outcome.deduplicated);
        assert_eq!(analyzer.calls(), 1);

        // Exactly one row, keyed by the text's fingerprint
        assert_eq!(repo.count().await.unwrap(), 1);
        let id = repo
            .find_id_by_fingerprint(&Report::fingerprint_of("Crashes on export"))
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some(outcome.report_id.as_str()));
    }

    #[tokio::test]
    async fn test_duplicate_submission_skips_classification() {
        let analyzer = Arc::new(MockAnalyzer::new());
        let (service, repo, _dir) = setup_service(analyzer.clone()).await;

        let first = service.submit("Crashes on export").await.unwrap();
        let second = service.submit("Crashes on export").await.unwrap();

        assert_eq!(first.report_id, second.report_id);
        assert!(second.deduplicated);
        assert_eq!(analyzer.calls(), 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_blank_input_touches_nothing() {
        let analyzer = Arc::new(MockAnalyzer::new());
        let (service, repo, _dir) = setup_service(analyzer.clone()).await;

        for text in ["", "   ", "\n\t"] {
            let err = service.submit(text).await.unwrap_err();
            assert!(matches!(err, SubmitError::EmptyInput));
        }

        assert_eq!(analyzer.calls(), 0);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_over_word_limit_rejected() {
        let analyzer = Arc::new(MockAnalyzer::new());
        let (service, _repo, _dir) = setup_service(analyzer.clone()).await;

        let long_text = "word ".repeat(MAX_SUBMISSION_WORDS + 1);
        let err = service.submit(&long_text).await.unwrap_err();
        assert!(matches!(err, SubmitError::TooLong(_)));
        assert_eq!(analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_skips_classification() {
        let analyzer = Arc::new(MockAnalyzer::new());
        let dir = tempdir().unwrap();
        // A directory is not a valid database file, so the dedup lookup
        // fails with a storage error rather than "not found"
        let pool = AsyncSqlitePool::from_path(dir.path());
        let repo = ReportRepository::new(pool);
        let service = AnalysisService::new(repo, analyzer.clone());

        let err = service.submit("Crashes on export").await.unwrap_err();
        assert!(matches!(err, SubmitError::Storage(_)));
        assert_eq!(analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn test_classification_failure_writes_nothing() {
        let analyzer = Arc::new(MockAnalyzer::failing());
        let (service, repo, _dir) = setup_service(analyzer.clone()).await;

        let err = service.submit("Crashes on export").await.unwrap_err();
        assert!(matches!(err, SubmitError::Classification(_)));
        assert_eq!(analyzer.calls(), 1);
        assert_eq!(repo.count().await.unwrap(), 0);

        // A later retry of the same text is a dedup miss again
        let err = service.submit("Crashes on export").await.unwrap_err();
        assert!(matches!(err, SubmitError::Classification(_)));
        assert_eq!(analyzer.calls(), 2);
    }
}
