//! Per-run report: what was backed up, how big it was, how long it took and
//! how many archives the remote side now holds for each volume.

/// Per-volume line in the final report. Only volumes that completed both the
/// archive and the transfer step get an entry.
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    pub volume_name: String,
    pub size_human: String,
    pub duration_secs: f64,
    pub remote_backup_count: u32,
}

/// Aggregated outcome of one run. Append-only while the run is in flight;
/// handed to the notification layer as-is once the run finishes.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub entries: Vec<SummaryEntry>,
    pub volumes_attempted: u32,
    pub volumes_succeeded: u32,
    pub fatal_error: Option<String>,
}

impl RunReport {
    /// Render the human-readable report body: a header line, then one block
    /// per successful volume with its name and `size | duration | count`.
    pub fn render(&self) -> String {
        if self.volumes_attempted == 0 && self.fatal_error.is_none() {
            return "No volumes found to back up.".to_string();
        }

        let mut body = format!(
            "Backed up {} of {} volume(s).\n",
            self.volumes_succeeded, self.volumes_attempted
        );
        for entry in &self.entries {
            body.push('\n');
            body.push_str(&entry.volume_name);
            body.push('\n');
            body.push_str(&format!(
                "{} | {:.2} | {}\n",
                entry.size_human, entry.duration_secs, entry.remote_backup_count
            ));
        }
        body
    }
}

/// Format bytes as human-readable size using binary units (KiB, MiB, GiB).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{size:.2} {}", UNITS[unit_idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_binary_units() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(512), "512.00 B");
        assert_eq!(format_bytes(1024), "1.00 KiB");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(1048576), "1.00 MiB");
        assert_eq!(format_bytes(1073741824), "1.00 GiB");
    }

    #[test]
    fn empty_run_renders_nothing_to_do() {
        let report = RunReport::default();
        assert_eq!(report.render(), "No volumes found to back up.");
    }

    #[test]
    fn render_includes_per_volume_blocks_in_order() {
        let report = RunReport {
            entries: vec![
                SummaryEntry {
                    volume_name: "db-data".into(),
                    size_human: "1.00 MiB".into(),
                    duration_secs: 1.25,
                    remote_backup_count: 3,
                },
                SummaryEntry {
                    volume_name: "web-data".into(),
                    size_human: "512.00 B".into(),
                    duration_secs: 0.4,
                    remote_backup_count: 1,
                },
            ],
            volumes_attempted: 2,
            volumes_succeeded: 2,
            fatal_error: None,
        };

        let body = report.render();
        assert!(body.starts_with("Backed up 2 of 2 volume(s)."));
        assert!(body.contains("db-data\n1.00 MiB | 1.25 | 3\n"));
        assert!(body.contains("web-data\n512.00 B | 0.40 | 1\n"));
        let db = body.find("db-data").unwrap();
        let web = body.find("web-data").unwrap();
        assert!(db < web);
    }

    #[test]
    fn partial_run_header_counts_skips() {
        let report = RunReport {
            entries: vec![],
            volumes_attempted: 3,
            volumes_succeeded: 0,
            fatal_error: None,
        };
        assert!(report.render().starts_with("Backed up 0 of 3 volume(s)."));
    }
}
