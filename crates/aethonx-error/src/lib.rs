// SPDX-License-Identifier: MIT OR Apache-2.0
//! Consolidated error taxonomy shared by every AethonX crate.
//!
//! A single [`ErrorCode`]/[`ErrorCategory`] pair replaces what a less careful
//! split might scatter across several overlapping error crates. Fatality is
//! not baked into the code itself — the same code can surface as a fatal
//! [`AethonError`] returned from `Pipeline::run`, or as a non-fatal entry
//! recorded on a `ScanResult`, depending on where it occurs.

use serde::{Deserialize, Serialize};

/// Broad grouping of [`ErrorCode`] variants, mirroring how the scan pipeline
/// itself is organized: target validation, stage resolution, source
/// execution, spill I/O, and everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Problems with the `Target` supplied to a scan.
    Target,
    /// Problems building or partitioning the dependency graph of sources.
    Resolver,
    /// Problems reported by an individual source during execution.
    Source,
    /// Spill-file or filesystem problems.
    Io,
    /// Anything that does not fit the above and indicates a bug.
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Target => "target",
            Self::Resolver => "resolver",
            Self::Source => "source",
            Self::Io => "io",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Stable, serializable error identifiers for every failure mode the
/// pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // ── Target ──
    /// Target failed `Target::validate` for an unspecified reason.
    InvalidTarget,
    /// `Target.mode` is not one of `passive`, `active`, `hybrid`.
    InvalidScanMode,
    /// `Target.scope` contains a contradictory or malformed setting.
    InvalidScope,
    /// `Target.root` is empty.
    EmptyTarget,
    /// `Target.root` is not a syntactically valid domain.
    InvalidDomain,

    // ── Resolver ──
    /// No registered source is compatible with the target's scan mode.
    NoSourcesAvailable,
    /// The source dependency graph contains a cycle.
    CyclicDependency,

    // ── Source (non-fatal; recorded on `ScanResult.errors`) ──
    /// A source did not complete within its own timeout contract.
    Timeout,
    /// A source was rate-limited by its upstream.
    RateLimit,
    /// A source failed authorization against its upstream.
    Unauthorized,
    /// A source could not establish a connection.
    ConnectionFailed,
    /// A source's upstream reported it is unavailable.
    ServiceUnavailable,
    /// A source received a response it could not parse.
    InvalidResponse,
    /// A source's upstream reported the target was not found.
    NotFound,

    // ── Io (non-fatal; recorded as warnings) ──
    /// Failed to write a spill file.
    SpillWriteFailed,
    /// Failed to read or decode a spill file.
    SpillDecodeFailed,
    /// Failed to delete a spill file during cleanup.
    SpillCleanupFailed,

    // ── Internal ──
    /// An invariant was violated; indicates a bug rather than bad input.
    Internal,
}

impl ErrorCode {
    /// The [`ErrorCategory`] this code belongs to.
    #[must_use]
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::InvalidTarget
            | Self::InvalidScanMode
            | Self::InvalidScope
            | Self::EmptyTarget
            | Self::InvalidDomain => ErrorCategory::Target,
            Self::NoSourcesAvailable | Self::CyclicDependency => ErrorCategory::Resolver,
            Self::Timeout
            | Self::RateLimit
            | Self::Unauthorized
            | Self::ConnectionFailed
            | Self::ServiceUnavailable
            | Self::InvalidResponse
            | Self::NotFound => ErrorCategory::Source,
            Self::SpillWriteFailed | Self::SpillDecodeFailed | Self::SpillCleanupFailed => {
                ErrorCategory::Io
            }
            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Whether this code, by nature, always aborts the scan outright.
    ///
    /// Source and I/O codes are never fatal by construction — they are
    /// downgraded to entries on the `ScanResult` ledgers instead.
    #[must_use]
    pub fn is_inherently_fatal(self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Target | ErrorCategory::Resolver
        )
    }
}

/// A classified error carrying a stable code, a human message, and whether
/// it should abort the scan outright.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("{message} ({code:?})")]
pub struct AethonError {
    /// Stable machine-readable code.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
    /// Whether this error should abort the scan rather than be recorded.
    pub fatal: bool,
}

impl AethonError {
    /// Construct a fatal error — returned directly from `Pipeline::run`.
    pub fn fatal(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fatal: true,
        }
    }

    /// Construct a non-fatal error — recorded on a `ScanResult` ledger.
    pub fn non_fatal(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fatal: false,
        }
    }

    /// The category of the underlying code.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

/// Convenience alias for `Result<T, AethonError>`.
pub type Result<T> = std::result::Result<T, AethonError>;
