// SPDX-License-Identifier: MIT OR Apache-2.0
//! The collector contract: a minimal mandatory `Source` trait plus optional
//! capabilities probed at runtime, and the context sources run under.

pub mod cancel;
pub mod context;
pub mod descriptor;
pub mod source;

pub use cancel::{CancellationReason, CancellationToken};
pub use context::{ScanContext, SourceConfig};
pub use descriptor::{SourceDescriptor, SourceMode, SourceType};
pub use source::{AdvancedSource, InputConsumer, RateLimitedSource, Source, StreamingSource};
