// SPDX-License-Identifier: MIT OR Apache-2.0
//! The per-run context a source executes under.

use std::collections::BTreeMap;

use crate::cancel::CancellationToken;

/// Per-source configuration resolved outside the core (typically from
/// environment variables following the `AETHONX_SRC_<NAME>_<FIELD>`
/// convention) and handed in through this map. The core never reads the
/// environment itself.
#[derive(Debug, Clone, Default)]
pub struct SourceConfig {
    pub custom: BTreeMap<String, String>,
}

impl SourceConfig {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.custom.get(key).map(String::as_str)
    }
}

/// Carried into every `Source` invocation: cancellation and resolved config.
#[derive(Clone)]
pub struct ScanContext {
    pub cancellation: CancellationToken,
    pub config: SourceConfig,
}

impl ScanContext {
    #[must_use]
    pub fn new(cancellation: CancellationToken, config: SourceConfig) -> Self {
        Self { cancellation, config }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
