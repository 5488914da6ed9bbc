// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event taxonomy and concurrent, deadline-bounded notifier dispatch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::warn;

const NOTIFIER_DEADLINE: Duration = Duration::from_secs(5);

/// How urgently an event should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// A point-in-time occurrence emitted by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub data: serde_json::Value,
    pub severity: Severity,
    #[serde(default)]
    pub metadata: std::collections::BTreeMap<String, String>,
}

impl Event {
    #[must_use]
    pub fn new(kind: impl Into<String>, source: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind: kind.into(),
            timestamp: Utc::now(),
            source: source.into(),
            target: None,
            data: serde_json::Value::Null,
            severity,
            metadata: std::collections::BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// A sink for scan events. Errors are logged by the dispatcher and never
/// propagate to the orchestrator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &Event) -> Result<(), String>;
}

/// Dispatches events to every registered notifier, each under its own
/// 5-second deadline, with concurrent dispatch gated by a semaphore of size
/// `max(2 * notifiers.len(), 4)`.
pub struct NotifierHub {
    notifiers: Vec<Arc<dyn Notifier>>,
    semaphore: Arc<Semaphore>,
}

impl NotifierHub {
    #[must_use]
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        let permits = (2 * notifiers.len()).max(4);
        Self { notifiers, semaphore: Arc::new(Semaphore::new(permits)) }
    }

    /// Dispatch `event` to every notifier concurrently and wait for all
    /// dispatches to either complete or hit their deadline.
    pub async fn dispatch(&self, event: &Event) {
        let tasks: Vec<_> = self
            .notifiers
            .iter()
            .cloned()
            .map(|notifier| {
                let semaphore = Arc::clone(&self.semaphore);
                let event = event.clone();
                tokio::spawn(async move {
                    let Ok(_permit) = semaphore.acquire().await else { return };
                    match tokio::time::timeout(NOTIFIER_DEADLINE, notifier.notify(&event)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!(event = %event.kind, error = %e, "notifier failed"),
                        Err(_) => warn!(event = %event.kind, "notifier dispatch timed out"),
                    }
                })
            })
            .collect();

        for task in tasks {
            let _ = task.await;
        }
    }
}
