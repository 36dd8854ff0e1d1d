use crate::core::models::VolumeRecord;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Subdirectory that marks a candidate as a data volume. This is the layout
/// the host's volume storage uses: `<root>/<volume>/_data/`.
const DATA_DIR: &str = "_data";

/// List backup candidates under the storage root.
///
/// A candidate is any immediate subdirectory carrying a `_data` directory;
/// the returned record points at that `_data` directory as the archive
/// source. A missing or unreadable root yields an empty list, never an
/// error; the caller treats an empty result as a no-op run. Results are
/// sorted by name so runs process and report volumes in a stable order.
pub fn discover(storage_root: &Path) -> Vec<VolumeRecord> {
    let entries = match fs::read_dir(storage_root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                root = %storage_root.display(),
                error = %e,
                "storage root not readable, treating as empty"
            );
            return Vec::new();
        }
    };

    let mut volumes = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let data_dir = path.join(DATA_DIR);
        if !data_dir.is_dir() {
            debug!(path = %path.display(), "skipping directory without a data subdirectory");
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        volumes.push(VolumeRecord {
            name,
            source_path: data_dir,
        });
    }

    volumes.sort_by(|a, b| a.name.cmp(&b.name));
    volumes
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn add_volume(root: &Path, name: &str) {
        fs::create_dir_all(root.join(name).join(DATA_DIR)).unwrap();
    }

    #[test]
    fn finds_volumes_with_data_dir() {
        let root = tempdir().unwrap();
        add_volume(root.path(), "web-data");
        add_volume(root.path(), "db-data");

        let volumes = discover(root.path());
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[0].name, "db-data");
        assert_eq!(volumes[1].name, "web-data");
        assert!(volumes[0].source_path.ends_with("db-data/_data"));
    }

    #[test]
    fn ignores_directories_without_data_dir() {
        let root = tempdir().unwrap();
        add_volume(root.path(), "real");
        fs::create_dir(root.path().join("metadata.db")).unwrap();
        fs::write(root.path().join("backingFsBlockDev"), b"").unwrap();

        let volumes = discover(root.path());
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].name, "real");
    }

    #[test]
    fn empty_root_yields_empty_list() {
        let root = tempdir().unwrap();
        assert!(discover(root.path()).is_empty());
    }

    #[test]
    fn missing_root_yields_empty_list() {
        let root = tempdir().unwrap();
        let gone = root.path().join("does-not-exist");
        assert!(discover(&gone).is_empty());
    }
}
