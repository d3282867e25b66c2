//! Article Word Frequency - concurrent fetch-and-aggregate pipeline
//!
//! Fetches a list of article URLs concurrently, extracts the article body
//! text, counts the words that appear in a curated word bank and reports the
//! most frequent ones.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;
#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use application::{PipelineError, RunReport, run_pipeline, run_pipeline_with_transport};
pub use domain::{WordBank, WordFreq, top_n};
pub use infrastructure::AppConfig;
