//! Diesel-based report repository for SQLite.
//!
//! Reports are insert-only: rows are written once on a dedup miss and
//! never updated or deleted afterwards.

use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};

use super::models::{NewReport, ReportRecord};
use super::parse_datetime;
use super::pool::{AsyncSqlitePool, DieselError};
use crate::models::{AnalysisPayload, Report};
use crate::schema::reports;

/// Schema for the reports table. The UNIQUE constraint on fingerprint is
/// what turns a concurrent duplicate insert into an error instead of a
/// second row.
const REPORTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reports (
    id TEXT PRIMARY KEY,
    fingerprint TEXT NOT NULL UNIQUE,
    report_data TEXT NOT NULL,
    source_text TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports(created_at);
"#;

/// Convert a database record to a domain model.
///
/// Fallible: the stored payload is validated against the current schema
/// rather than structurally guessed at.
fn to_report(record: ReportRecord) -> Result<Report, DieselError> {
    let payload: AnalysisPayload = serde_json::from_str(&record.report_data)
        .map_err(|e| DieselError::DeserializationError(Box::new(e)))?;

    Ok(Report {
        id: record.id,
        fingerprint: record.fingerprint,
        payload,
        source_text: record.source_text,
        created_at: parse_datetime(&record.created_at),
    })
}

/// Diesel-based report repository with compile-time query checking.
#[derive(Clone)]
pub struct ReportRepository {
    pool: AsyncSqlitePool,
}

impl ReportRepository {
    /// Create a new report repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Create the reports table if it does not exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(REPORTS_SCHEMA).await?;
        Ok(())
    }

    /// Look up the id of an existing report by fingerprint.
    ///
    /// Returns Ok(None) when no row matches; any other failure is a real
    /// storage error and must not be treated as a dedup miss.
    pub async fn find_id_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<String>, DieselError> {
        let mut conn = self.pool.get().await?;

        reports::table
            .filter(reports::fingerprint.eq(fingerprint))
            .select(reports::id)
            .first::<String>(&mut conn)
            .await
            .optional()
    }

    /// Get a report by id.
    pub async fn get(&self, id: &str) -> Result<Option<Report>, DieselError> {
        let mut conn = self.pool.get().await?;

        let record = reports::table
            .find(id)
            .first::<ReportRecord>(&mut conn)
            .await
            .optional()?;

        record.map(to_report).transpose()
    }

    /// Insert a new report.
    ///
    /// A plain INSERT, not an upsert: if another request won the race for
    /// the same fingerprint, the UNIQUE constraint fails this call.
    pub async fn insert(&self, report: &Report) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        let report_data = serde_json::to_string(&report.payload)
            .map_err(|e| DieselError::SerializationError(Box::new(e)))?;
        let created_at = report.created_at.to_rfc3339();

        let new_report = NewReport {
            id: &report.id,
            fingerprint: &report.fingerprint,
            report_data: &report_data,
            source_text: report.source_text.as_deref(),
            created_at: &created_at,
        };

        diesel::insert_into(reports::table)
            .values(&new_report)
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Total number of stored reports.
    pub async fn count(&self) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        reports::table.select(count_star()).first(&mut conn).await
    }
}
