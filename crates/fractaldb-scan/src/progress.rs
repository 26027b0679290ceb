//! Scan progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Label of the scanner reporting.
    pub label: String,
    /// Number of artifact files indexed so far.
    pub artifacts_found: u64,
    /// Number of directories visited so far.
    pub dirs_scanned: u64,
    /// Current path being scanned.
    pub current_path: PathBuf,
    /// Number of warnings encountered.
    pub warnings_count: u64,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
    /// Set on the last update of a scan.
    pub finished: bool,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            artifacts_found: 0,
            dirs_scanned: 0,
            current_path: PathBuf::new(),
            warnings_count: 0,
            elapsed: Duration::ZERO,
            finished: false,
        }
    }

    /// Calculate scan rate in artifacts per second.
    pub fn artifacts_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.artifacts_found as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_without_elapsed_time() {
        let progress = ScanProgress::new("db/all");
        assert_eq!(progress.artifacts_per_second(), 0.0);
    }

    #[test]
    fn test_rate() {
        let mut progress = ScanProgress::new("db/all");
        progress.artifacts_found = 100;
        progress.elapsed = Duration::from_secs(4);
        assert_eq!(progress.artifacts_per_second(), 25.0);
    }
}
