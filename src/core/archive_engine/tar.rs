use crate::core::archive_engine::ArchiveEngine;
use crate::core::error::RunError;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Archive engine backed by the system `tar` binary.
pub struct TarGzEngine;

#[async_trait]
impl ArchiveEngine for TarGzEngine {
    async fn create_archive(&self, source: &Path, dest: &Path) -> Result<(), RunError> {
        let Some(source_str) = source.to_str() else {
            return Err(RunError::Archive(format!(
                "source path is not valid UTF-8: {}",
                source.display()
            )));
        };
        let Some(dest_str) = dest.to_str() else {
            return Err(RunError::Archive(format!(
                "destination path is not valid UTF-8: {}",
                dest.display()
            )));
        };

        debug!(source = source_str, dest = dest_str, "running tar");

        let output = Command::new("tar")
            .args(["-czf", dest_str, "-C", source_str, "."])
            .output()
            .await
            .map_err(|e| RunError::Archive(format!("failed to spawn tar: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunError::Archive(format!(
                "tar exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn archives_a_directory() {
        let source = tempdir().unwrap();
        std::fs::write(source.path().join("data.txt"), b"hello volumes").unwrap();
        let staging = tempdir().unwrap();
        let dest = staging.path().join("vol.tar.gz");

        TarGzEngine
            .create_archive(source.path(), &dest)
            .await
            .unwrap();

        let metadata = std::fs::metadata(&dest).unwrap();
        assert!(metadata.len() > 0);
    }

    #[tokio::test]
    async fn missing_source_fails() {
        let staging = tempdir().unwrap();
        let dest = staging.path().join("vol.tar.gz");

        let err = TarGzEngine
            .create_archive(Path::new("/nonexistent/volume/_data"), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Archive(_)));
    }
}
