//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Report record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReportRecord {
    pub id: String,
    pub fingerprint: String,
    pub report_data: String,
    pub source_text: Option<String>,
    pub created_at: String,
}

/// New report for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::reports)]
pub struct NewReport<'a> {
    pub id: &'a str,
    pub fingerprint: &'a str,
    pub report_data: &'a str,
    pub source_text: Option<&'a str>,
    pub created_at: &'a str,
}
