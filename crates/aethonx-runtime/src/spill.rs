// SPDX-License-Identifier: MIT OR Apache-2.0
//! Spill-file writing and consolidation.
//!
//! Spill files let a stage or source release its in-memory artifact vector
//! under memory pressure without losing data; the orchestrator reloads and
//! folds them back in at final consolidation.

use std::path::{Path, PathBuf};

use aethonx_core::ScanResult;
use aethonx_error::{AethonError, ErrorCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One spilled partial result, matching the on-disk JSON shape exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialResult {
    pub source: String,
    pub scan_id: String,
    pub target: String,
    pub artifacts: Vec<aethonx_core::Artifact>,
    pub warnings: Vec<aethonx_core::Warning>,
    pub errors: Vec<aethonx_core::ErrorEntry>,
    pub written_at: chrono::DateTime<chrono::Utc>,
    pub artifact_count: usize,
}

/// Sanitize a target string for use as a directory/filename component:
/// every character outside `[A-Za-z0-9_-]` becomes `_`.
#[must_use]
pub fn sanitize_target(target: &str) -> String {
    target
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Write `result`'s artifacts as a partial spill file under
/// `<output_dir>/<sanitized_target>/`, named
/// `aethonx_<sanitized_target>_<YYYYMMDD_HHMMSS>_partial_<source>.json`.
///
/// # Errors
///
/// Returns [`ErrorCode::SpillWriteFailed`] if the directory cannot be
/// created or the file cannot be written.
pub fn write_partial(
    output_dir: &Path,
    target: &str,
    source: &str,
    result: &ScanResult,
) -> Result<PathBuf, AethonError> {
    let sanitized = sanitize_target(target);
    let dir = output_dir.join(&sanitized);
    std::fs::create_dir_all(&dir).map_err(|e| {
        AethonError::non_fatal(ErrorCode::SpillWriteFailed, format!("create spill dir: {e}"))
    })?;

    let now = chrono::Utc::now();
    let timestamp = now.format("%Y%m%d_%H%M%S");
    let filename = format!("aethonx_{sanitized}_{timestamp}_partial_{source}.json");
    let path = dir.join(filename);

    let partial = PartialResult {
        source: source.to_string(),
        scan_id: result.id.clone(),
        target: target.to_string(),
        artifacts: result.artifacts.clone(),
        warnings: result.warnings.clone(),
        errors: result.errors.clone(),
        written_at: now,
        artifact_count: result.artifacts.len(),
    };

    let json = serde_json::to_string_pretty(&partial).map_err(|e| {
        AethonError::non_fatal(ErrorCode::SpillWriteFailed, format!("encode spill file: {e}"))
    })?;
    std::fs::write(&path, json).map_err(|e| {
        AethonError::non_fatal(ErrorCode::SpillWriteFailed, format!("write spill file: {e}"))
    })?;

    Ok(path)
}

/// The glob pattern matching every spill file this scan produces for `target`.
#[must_use]
pub fn spill_glob(target: &str) -> String {
    format!("aethonx_{}_*_partial_*.json", sanitize_target(target))
}

/// Resolve `glob` under `dir`, decode each match, and return the successfully
/// decoded partials. Decode failures are logged and skipped; an empty result
/// set is tolerated.
///
/// # Errors
///
/// Returns [`ErrorCode::Internal`] if `dir` or `glob` is empty.
pub fn load_partial_results(dir: &Path, glob: &str) -> Result<Vec<PartialResult>, AethonError> {
    if dir.as_os_str().is_empty() || glob.is_empty() {
        return Err(AethonError::non_fatal(
            ErrorCode::Internal,
            "spill dir and glob must not be empty",
        ));
    }

    let matcher = globset::Glob::new(glob)
        .map_err(|e| AethonError::non_fatal(ErrorCode::Internal, format!("invalid glob: {e}")))?
        .compile_matcher();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(AethonError::non_fatal(
                ErrorCode::SpillDecodeFailed,
                format!("read spill dir: {e}"),
            ))
        }
    };

    let mut partials = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(filename) = path.file_name().and_then(|f| f.to_str()) else { continue };
        if !matcher.is_match(filename) {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<PartialResult>(&text) {
                Ok(partial) => partials.push(partial),
                Err(e) => warn!(file = %path.display(), error = %e, "skipping undecodable spill file"),
            },
            Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable spill file"),
        }
    }

    Ok(partials)
}

/// Concatenate each partial's artifacts/warnings/errors into `result`. No
/// dedup here — dedup happens afterwards, at the orchestrator level.
pub fn consolidate_into_result(result: &mut ScanResult, partials: Vec<PartialResult>) {
    for partial in partials {
        result.artifacts.extend(partial.artifacts);
        result.warnings.extend(partial.warnings);
        result.errors.extend(partial.errors);
    }
}

/// Best-effort delete every file under `dir` matching `glob`. Individual
/// failures are logged, never fatal.
pub fn clear_partial_files(dir: &Path, glob: &str) {
    let Ok(matcher) = globset::Glob::new(glob).map(|g| g.compile_matcher()) else { return };
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(filename) = path.file_name().and_then(|f| f.to_str()) else { continue };
        if matcher.is_match(filename) {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(file = %path.display(), error = %e, "failed to remove spill file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aethonx_core::{ScanMode, Target};

    #[test]
    fn sanitize_target_maps_non_word_chars() {
        assert_eq!(sanitize_target("example.com:8080"), "example_com_8080");
    }

    #[test]
    fn write_and_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut result = ScanResult::new(Target::new("example.com", ScanMode::Passive));
        result.artifacts.push(aethonx_core::Artifact::new(
            aethonx_core::ArtifactType::Domain,
            "example.com",
            "crtsh",
        ));

        let path = write_partial(dir.path(), "example.com", "crtsh", &result).unwrap();
        assert!(path.exists());

        let glob = spill_glob("example.com");
        let partials = load_partial_results(&dir.path().join("example_com"), &glob).unwrap();
        assert_eq!(partials.len(), 1);
        assert_eq!(partials[0].artifact_count, 1);
    }

    #[test]
    fn load_partial_results_tolerates_missing_dir() {
        let partials = load_partial_results(Path::new("/nonexistent/path"), "*.json").unwrap();
        assert!(partials.is_empty());
    }

    #[test]
    fn load_partial_results_rejects_empty_args() {
        assert!(load_partial_results(Path::new(""), "*.json").is_err());
        assert!(load_partial_results(Path::new("/tmp"), "").is_err());
    }

    #[test]
    fn consolidate_concatenates_without_dedup() {
        let mut result = ScanResult::new(Target::new("example.com", ScanMode::Passive));
        let partial = PartialResult {
            source: "crtsh".into(),
            scan_id: "scan-1".into(),
            target: "example.com".into(),
            artifacts: vec![aethonx_core::Artifact::new(
                aethonx_core::ArtifactType::Domain,
                "example.com",
                "crtsh",
            )],
            warnings: vec![],
            errors: vec![],
            written_at: chrono::Utc::now(),
            artifact_count: 1,
        };
        consolidate_into_result(&mut result, vec![partial.clone(), partial]);
        assert_eq!(result.artifacts.len(), 2);
    }

    #[test]
    fn clear_partial_files_removes_matching_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let result = ScanResult::new(Target::new("example.com", ScanMode::Passive));
        write_partial(dir.path(), "example.com", "crtsh", &result).unwrap();
        let sub = dir.path().join("example_com");
        std::fs::write(sub.join("keep.txt"), "keep").unwrap();

        clear_partial_files(&sub, &spill_glob("example.com"));
        let remaining: Vec<_> = std::fs::read_dir(&sub).unwrap().flatten().collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].file_name(), "keep.txt");
    }
}
