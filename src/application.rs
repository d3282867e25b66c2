//! Application layer module
//!
//! Orchestrates one run: the admission limiter, the concurrent dispatcher,
//! whole-run sequencing and report presentation.

pub mod admission;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod report;

pub use admission::{AdmissionGate, AdmissionPermit};
pub use dispatcher::{DispatchOutcome, DispatchSettings, Dispatcher};
pub use error::PipelineError;
pub use pipeline::{RunReport, run_pipeline, run_pipeline_with_transport};
pub use report::{log_summary, render_json, render_report};
