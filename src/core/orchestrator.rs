use crate::config::AppConfig;
use crate::core::archive_engine::{ARCHIVE_STAMP_FORMAT, ArchiveEngine, Archiver};
use crate::core::discovery;
use crate::core::error::RunError;
use crate::core::models::{ArchiveOutcome, TransferOutcome, VolumeRecord};
use crate::core::remote::{RemoteSession, RemoteTransport};
use crate::core::report::{RunReport, SummaryEntry, format_bytes};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Drives one backup run end to end: discovery, one remote session, the
/// per-volume archive/transfer pipeline, and the aggregated report.
///
/// Error handling is classified by origin rather than catch scope: a failed
/// connection aborts the run before any volume is touched, while archive and
/// transfer failures skip exactly one volume and the run moves on.
pub struct Orchestrator {
    config: Arc<AppConfig>,
    archiver: Archiver,
    transport: Box<dyn RemoteTransport>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<AppConfig>,
        archive_engine: Box<dyn ArchiveEngine>,
        transport: Box<dyn RemoteTransport>,
    ) -> Self {
        let archiver = Archiver::new(archive_engine, config.staging_dir.clone());
        Self {
            config,
            archiver,
            transport,
        }
    }

    /// Perform one run, stamping archives with the current local time.
    pub async fn run(&self) -> RunReport {
        self.run_at(Local::now()).await
    }

    /// Perform one run with an explicit start time. Archives from this run
    /// carry the stamp derived from `started`.
    pub async fn run_at(&self, started: DateTime<Local>) -> RunReport {
        let stamp = started.format(ARCHIVE_STAMP_FORMAT).to_string();
        let mut report = RunReport::default();

        let volumes = discovery::discover(&self.config.storage_root);
        if volumes.is_empty() {
            info!(root = %self.config.storage_root.display(), "no volumes to back up");
            return report;
        }
        info!(count = volumes.len(), "discovered volumes");

        let mut session = match timeout(self.config.remote_timeout, self.transport.connect()).await
        {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                error!(error = %e, "remote connection failed, aborting run");
                report.fatal_error = Some(e.to_string());
                return report;
            }
            Err(_) => {
                let e = RunError::Connection(format!(
                    "handshake timed out after {}s",
                    self.config.remote_timeout.as_secs()
                ));
                error!(error = %e, "remote connection failed, aborting run");
                report.fatal_error = Some(e.to_string());
                return report;
            }
        };

        for volume in &volumes {
            report.volumes_attempted += 1;
            match self.process_volume(session.as_ref(), volume, &stamp).await {
                Ok(entry) => {
                    info!(volume = %volume.name, "volume backed up");
                    report.volumes_succeeded += 1;
                    report.entries.push(entry);
                }
                Err(e) => {
                    warn!(volume = %volume.name, error = %e, "skipping volume");
                }
            }
        }

        if let Err(e) = session.close().await {
            warn!(error = %e, "failed to close remote session");
        }

        report
    }

    /// Log what a run would do without archiving or touching the remote.
    pub fn dry_run(&self) {
        let volumes = discovery::discover(&self.config.storage_root);
        if volumes.is_empty() {
            info!(root = %self.config.storage_root.display(), "no volumes to back up");
            return;
        }
        for volume in &volumes {
            info!(
                volume = %volume.name,
                source = %volume.source_path.display(),
                remote_dir = %self.remote_dir(volume),
                "would archive and upload"
            );
        }
    }

    fn remote_dir(&self, volume: &VolumeRecord) -> String {
        format!("{}/{}", self.config.remote_backup_path, volume.name)
    }

    /// One volume's pipeline. The local archive is removed as soon as the
    /// transfer step has been attempted, success or failure.
    async fn process_volume(
        &self,
        session: &dyn RemoteSession,
        volume: &VolumeRecord,
        stamp: &str,
    ) -> Result<SummaryEntry, RunError> {
        let archive = self.archiver.archive(volume, stamp).await?;

        let transferred = self.transfer_volume(session, volume, &archive).await;

        if let Err(e) = tokio::fs::remove_file(&archive.archive_path).await {
            warn!(
                archive = %archive.archive_path.display(),
                error = %e,
                "failed to remove local archive"
            );
        }

        let transferred = transferred?;
        Ok(SummaryEntry {
            volume_name: volume.name.clone(),
            size_human: format_bytes(archive.size_bytes),
            duration_secs: archive.duration.as_secs_f64(),
            remote_backup_count: transferred.remote_backup_count,
        })
    }

    async fn transfer_volume(
        &self,
        session: &dyn RemoteSession,
        volume: &VolumeRecord,
        archive: &ArchiveOutcome,
    ) -> Result<TransferOutcome, RunError> {
        let remote_dir = self.remote_dir(volume);

        // A directory that cannot be provisioned would fail the upload
        // anyway; skip the volume here so the failure names the right step.
        session.ensure_directory(&remote_dir).await?;

        match timeout(
            self.config.remote_timeout,
            session.upload(&archive.archive_path, &remote_dir),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(RunError::Transfer(format!(
                    "upload of {} timed out after {}s",
                    archive.archive_path.display(),
                    self.config.remote_timeout.as_secs()
                )));
            }
        }

        let remote_backup_count = session.count_backups(&remote_dir).await?;

        Ok(TransferOutcome {
            volume_name: volume.name.clone(),
            remote_dir,
            remote_backup_count,
        })
    }
}
