//! Run-level errors
//!
//! Per-URL failures never surface here; they are logged and counted. These
//! variants abort the whole run.

use thiserror::Error;

use crate::infrastructure::{ConfigError, TransportError, UrlListError, WordBankError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    UrlList(#[from] UrlListError),

    #[error("Word bank unavailable: {0}")]
    WordBankUnavailable(#[from] WordBankError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to initialize HTTP transport: {0}")]
    Transport(#[from] TransportError),
}
