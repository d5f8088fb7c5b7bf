//! Web server for the feedback analysis API.
//!
//! Exposes the analyze endpoint plus report retrieval, status, and health
//! checks. The handler pipeline itself lives in the service layer; this
//! module wires transport, admission control, and shared state together.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::llm::{Analyzer, OpenAiClient};
use crate::rate_limit::FixedWindowLimiter;
use crate::repository::{AsyncSqlitePool, ReportRepository};
use crate::services::AnalysisService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalysisService>,
    pub reports: ReportRepository,
    pub limiter: Arc<FixedWindowLimiter>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let pool = AsyncSqlitePool::from_path(&settings.database_path);
        let reports = ReportRepository::new(pool);
        let analyzer: Arc<dyn Analyzer> = Arc::new(OpenAiClient::new(settings.llm.clone()));
        let limiter = Arc::new(FixedWindowLimiter::with_config(
            settings.rate_limit_config(),
        ));

        Self {
            service: Arc::new(AnalysisService::new(reports.clone(), analyzer)),
            reports,
            limiter,
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings);
    state.reports.init_schema().await?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
