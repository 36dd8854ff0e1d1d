use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};
use volbak::config::RawConfig;
use volbak::core::{Orchestrator, RunError};
use volbak::core::archive_engine::create_archive_engine;
use volbak::core::notifications::{self, NotificationChannel, RunEvent};
use volbak::core::remote::create_transport;
use volbak::logging;

#[derive(Parser, Serialize)]
#[command(name = "volbak")]
#[command(about = "Backs up local data volumes to a remote host over SSH", long_about = None)]
struct Cli {
    /// Directory holding the volumes to back up
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Directory where archives are staged before upload
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Use in-memory engines instead of tar and ssh
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    simulation: Option<bool>,

    /// Show what would be backed up without doing it
    #[serde(skip)]
    #[arg(long)]
    dry_run: bool,

    #[serde(skip)]
    #[arg(long)]
    verbose: bool,

    /// Emit logs as JSON
    #[serde(skip)]
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(logging::LogConfig {
        json: cli.json_logs,
        verbose: cli.verbose,
    });

    let raw = RawConfig::load(Some(&cli)).context("failed to load configuration")?;
    let notifier = notifications::create_notifier(&raw.notification());

    let config = match raw.validate() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!(error = %e, "invalid configuration");
            notify(&notifier, &RunEvent::Failed {
                error: e.to_string(),
            })
            .await;
            std::process::exit(1);
        }
    };

    let orchestrator = Orchestrator::new(
        Arc::clone(&config),
        create_archive_engine(&config),
        create_transport(&config),
    );

    if cli.dry_run {
        orchestrator.dry_run();
        return Ok(());
    }

    let report = orchestrator.run().await;

    let event = match &report.fatal_error {
        Some(error) => RunEvent::Failed {
            error: error.clone(),
        },
        None => {
            println!("{}", report.render());
            RunEvent::Completed(report.clone())
        }
    };
    notify(&notifier, &event).await;

    if report.fatal_error.is_some() {
        std::process::exit(1);
    }
    Ok(())
}

async fn notify(notifier: &Option<Arc<dyn NotificationChannel>>, event: &RunEvent) {
    match notifier {
        Some(notifier) => {
            if let Err(e) = notifier.notify(event).await {
                let e = RunError::Notification(e.to_string());
                warn!(error = %e, "notification delivery failed");
            }
        }
        None => debug!("no notification channel configured"),
    }
}
