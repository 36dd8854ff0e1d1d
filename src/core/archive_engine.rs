mod simulated;
mod tar;

pub use simulated::SimulatedArchiveEngine;
pub use tar::TarGzEngine;

use crate::config::AppConfig;
use crate::core::error::RunError;
use crate::core::models::{ArchiveOutcome, VolumeRecord};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

/// Stamp baked into every archive file name. The remote listing matches on
/// the resulting suffix, so the format is fixed.
pub const ARCHIVE_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Extension shared by every archive this tool produces; the remote backup
/// count matches on it.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Capability that turns a directory into a compressed archive file.
/// Injected into the archiver so the run pipeline is testable without
/// external binaries.
#[async_trait]
pub trait ArchiveEngine: Send + Sync {
    async fn create_archive(&self, source: &Path, dest: &Path) -> Result<(), RunError>;
}

/// Select the archive engine for this run.
pub fn create_archive_engine(config: &AppConfig) -> Box<dyn ArchiveEngine> {
    if config.simulation {
        Box::new(SimulatedArchiveEngine::default())
    } else {
        Box::new(TarGzEngine)
    }
}

/// File name for one volume's archive within one run.
pub fn archive_file_name(volume_name: &str, stamp: &str) -> String {
    format!("{volume_name}_{stamp}{ARCHIVE_SUFFIX}")
}

/// Archives one volume at a time into the staging directory, timing the
/// engine call and reading the real on-disk size of the produced file.
pub struct Archiver {
    engine: Box<dyn ArchiveEngine>,
    staging_dir: PathBuf,
}

impl Archiver {
    pub fn new(engine: Box<dyn ArchiveEngine>, staging_dir: PathBuf) -> Self {
        Self {
            engine,
            staging_dir,
        }
    }

    /// Archive a volume's source directory. The archive lands in the staging
    /// directory under `<volume>_<stamp>.tar.gz`; leading with the volume
    /// name keeps two volumes processed within the same second apart.
    pub async fn archive(
        &self,
        volume: &VolumeRecord,
        stamp: &str,
    ) -> Result<ArchiveOutcome, RunError> {
        std::fs::create_dir_all(&self.staging_dir).map_err(|e| {
            RunError::Archive(format!(
                "staging directory unavailable at {}: {e}",
                self.staging_dir.display()
            ))
        })?;
        let dest = self.staging_dir.join(archive_file_name(&volume.name, stamp));

        let start = Instant::now();
        self.engine
            .create_archive(&volume.source_path, &dest)
            .await?;
        let duration = start.elapsed();

        // The engine reporting success is not enough: the file must exist.
        let metadata = std::fs::metadata(&dest).map_err(|e| {
            RunError::Archive(format!(
                "archive missing after creation at {}: {e}",
                dest.display()
            ))
        })?;

        debug!(
            volume = %volume.name,
            archive = %dest.display(),
            size_bytes = metadata.len(),
            "archive created"
        );

        Ok(ArchiveOutcome {
            volume_name: volume.name.clone(),
            archive_path: dest,
            size_bytes: metadata.len(),
            duration,
        })
    }
}
