//! CLI commands implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;

use crate::config::{self, Settings};
use crate::llm::OpenAiClient;
use crate::repository::{AsyncSqlitePool, ReportRepository};
use crate::services::AnalysisService;

#[derive(Parser)]
#[command(name = "pulsecheck")]
#[command(about = "Customer feedback analysis service")]
#[command(version)]
pub struct Cli {
    /// Data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the web server
    Serve {
        /// Bind address (port, host, or host:port)
        #[arg(short, long, default_value = "127.0.0.1:3030")]
        bind: String,
    },

    /// Analyze feedback text from a file
    Analyze {
        /// Path to a text file with raw feedback
        file: PathBuf,
    },

    /// Show stored report statistics
    Status,
}

/// Parse CLI arguments and dispatch to the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = config::load_settings(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init => cmd_init(&settings).await,
        Commands::Serve { bind } => cmd_serve(&settings, &bind).await,
        Commands::Analyze { file } => cmd_analyze(&settings, &file).await,
        Commands::Status => cmd_status(&settings).await,
    }
}

fn open_repository(settings: &Settings) -> ReportRepository {
    ReportRepository::new(AsyncSqlitePool::from_path(&settings.database_path))
}

/// Initialize the data directory, config file, and database schema.
async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    std::fs::create_dir_all(&settings.data_dir)?;
    if config::write_default_config(&settings.data_dir)? {
        println!(
            "{} Wrote default config to {}",
            style("✓").green(),
            settings.config_path().display()
        );
    }

    open_repository(settings).init_schema().await?;
    println!(
        "{} Database ready at {}",
        style("✓").green(),
        settings.database_path.display()
    );
    Ok(())
}

/// Start the web server.
async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    std::fs::create_dir_all(&settings.data_dir)?;
    println!(
        "{} Starting pulsecheck server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Run the analysis pipeline on a local file.
async fn cmd_analyze(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)?;

    let reports = open_repository(settings);
    reports.init_schema().await?;
    let service = AnalysisService::new(
        reports.clone(),
        Arc::new(OpenAiClient::new(settings.llm.clone())),
    );

    let outcome = service.submit(&text).await?;
    if outcome.deduplicated {
        println!(
            "{} Identical text already analyzed, report {}",
            style("→").cyan(),
            outcome.report_id
        );
    } else {
        println!("{} Report {}", style("✓").green(), outcome.report_id);
    }

    if let Some(report) = reports.get(&outcome.report_id).await? {
        println!("\n{}", style("Overall summary").bold());
        println!("  {}", report.payload.overall_summary);
        for theme in &report.payload.themes {
            println!(
                "  [{:?}/{:?}] {}: {}",
                theme.priority, theme.sentiment, theme.category, theme.summary
            );
        }
    }
    Ok(())
}

/// Print stored report statistics.
async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let reports = open_repository(settings);
    reports.init_schema().await?;
    let count = reports.count().await?;
    println!("Reports stored: {}", count);
    Ok(())
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    // Try parsing as just a port number
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    // Try parsing as host:port
    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    // Must be just a host, use default port
    Ok((bind.to_string(), 3030))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(
            parse_bind_address("3030").unwrap(),
            ("127.0.0.1".to_string(), 3030)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0").unwrap(),
            ("0.0.0.0".to_string(), 3030)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0:8080").unwrap(),
            ("0.0.0.0".to_string(), 8080)
        );
    }
}
