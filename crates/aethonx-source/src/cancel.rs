// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cancellation primitive threaded through a scan's context.
//!
//! Unlike a bare stop flag, a cancelled scan carries *why* it stopped —
//! the pipeline reports this back as the `scan.canceled` event's payload.

use tokio::sync::watch;

/// Why a scan was cancelled. First reason wins; later calls to
/// [`CancellationToken::cancel`] are no-ops once a reason is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationReason {
    /// An operator or calling system asked the scan to stop.
    UserRequested,
    /// A deadline the caller attached to the context elapsed.
    Deadline,
    /// A source's failure was severe enough to abort the whole scan.
    FatalSource { source: String },
}

impl CancellationReason {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            CancellationReason::UserRequested => "user_requested",
            CancellationReason::Deadline => "deadline",
            CancellationReason::FatalSource { .. } => "fatal_source",
        }
    }
}

/// A cloneable, cheaply-shareable token used to signal and observe
/// cancellation. All clones share the same underlying state.
#[derive(Clone)]
pub struct CancellationToken {
    tx: std::sync::Arc<watch::Sender<Option<CancellationReason>>>,
    rx: watch::Receiver<Option<CancellationReason>>,
}

impl CancellationToken {
    /// Create a new token that is **not** cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        Self { tx: std::sync::Arc::new(tx), rx }
    }

    /// Record `reason` as the cause of cancellation. A no-op if this token
    /// (or any clone) was already cancelled — the first reason sticks.
    pub fn cancel(&self, reason: CancellationReason) {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
    }

    /// Returns `true` if [`cancel`](Self::cancel) has recorded a reason.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// The recorded cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<CancellationReason> {
        self.rx.borrow().clone()
    }

    /// Resolves when the token is cancelled, immediately if already so.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.borrow().is_some() {
            return;
        }
        while rx.changed().await.is_ok() {
            if rx.borrow().is_some() {
                return;
            }
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken").field("reason", &self.reason()).finish()
    }
}
