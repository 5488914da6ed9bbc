// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stage resolution, fan-out execution, spill/streaming I/O, notifier
//! dispatch, and the pipeline control plane that ties them together.

pub mod executor;
pub mod notify;
pub mod pipeline;
pub mod resolver;
pub mod spill;
pub mod writer;

pub use executor::{execute_stage, fold_stage_results, filter_input, SourceExecutionResult};
pub use notify::{Event, Notifier, NotifierHub, Severity};
pub use pipeline::{Pipeline, PipelineConfig, RegisteredSource};
pub use resolver::{resolve_stages, Stage};
pub use spill::{clear_partial_files, consolidate_into_result, load_partial_results, write_partial, PartialResult};
pub use writer::StreamingWriter;
