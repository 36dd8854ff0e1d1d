use std::path::PathBuf;
use std::time::Duration;

/// One backup unit discovered under the storage root.
#[derive(Debug, Clone)]
pub struct VolumeRecord {
    pub name: String,
    pub source_path: PathBuf,
}

/// Result of successfully archiving one volume. The archive file is a
/// transient artifact: it must not outlive the volume's processing window.
#[derive(Debug, Clone)]
pub struct ArchiveOutcome {
    pub volume_name: String,
    pub archive_path: PathBuf,
    pub size_bytes: u64,
    pub duration: Duration,
}

/// Result of successfully transferring one volume's archive.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub volume_name: String,
    pub remote_dir: String,
    pub remote_backup_count: u32,
}
