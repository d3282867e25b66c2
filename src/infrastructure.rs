//! Infrastructure layer for HTTP, parsing, configuration and logging
//!
//! This module provides the I/O facing pieces of the pipeline: the HTTP
//! transport and the resilient fetcher built on it, article extraction,
//! word bank loading, the URL list reader, configuration and logging.

pub mod article_extractor;
pub mod config;
pub mod fetcher;
pub mod http_client;
pub mod logging;
pub mod url_source;
pub mod word_bank;

// Re-export commonly used items
pub use article_extractor::{ArticleExtractor, ExtractionError};
pub use config::{AppConfig, ConfigError, LoggingConfig};
pub use fetcher::{FetchError, FetchPolicy, FetchStateMachine, FetchStep, ResilientFetcher};
pub use http_client::{HttpClientConfig, RawResponse, ReqwestTransport, Transport, TransportError};
pub use logging::{init_logging_with_config, log_system_info};
pub use url_source::{UrlListError, read_url_list};
pub use word_bank::{WordBankError, WordBankHandle, WordBankLoader};
