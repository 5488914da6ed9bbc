// SPDX-License-Identifier: MIT OR Apache-2.0
//! The streaming writer contract: where and how spilled results land on disk.

use std::path::{Path, PathBuf};

use aethonx_core::ScanResult;
use aethonx_error::AethonError;

use crate::spill::{sanitize_target, spill_glob, write_partial};

/// Writes partial scan results to a per-target directory under `root`.
pub struct StreamingWriter {
    root: PathBuf,
}

impl StreamingWriter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `result` under `source_name`, returning the file's path.
    pub fn write_partial(
        &self,
        source_name: &str,
        target: &str,
        result: &ScanResult,
    ) -> Result<PathBuf, AethonError> {
        write_partial(&self.root, target, source_name, result)
    }

    /// The glob pattern matching every file this writer produces for `target`
    /// in the current scan.
    #[must_use]
    pub fn pattern(&self, target: &str) -> String {
        spill_glob(target)
    }

    /// The directory a given target's spill files live under.
    #[must_use]
    pub fn target_dir(&self, target: &str) -> PathBuf {
        self.root.join(sanitize_target(target))
    }

    /// The consolidated scan result's filename.
    #[must_use]
    pub fn final_filename(&self, scan_id: &str) -> String {
        format!("{scan_id}.json")
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aethonx_core::{ScanMode, Target};

    #[test]
    fn pattern_matches_files_this_writer_produces() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StreamingWriter::new(dir.path());
        let result = ScanResult::new(Target::new("example.com", ScanMode::Passive));
        let path = writer.write_partial("crtsh", "example.com", &result).unwrap();

        let filename = path.file_name().unwrap().to_str().unwrap();
        let matcher = globset::Glob::new(&writer.pattern("example.com")).unwrap().compile_matcher();
        assert!(matcher.is_match(filename));
    }

    #[test]
    fn final_filename_uses_scan_id() {
        let writer = StreamingWriter::new("/tmp/aethonx");
        assert_eq!(writer.final_filename("scan-123"), "scan-123.json");
    }
}
