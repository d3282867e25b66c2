//! Run report presentation

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::info;

use crate::application::pipeline::RunReport;
use crate::domain::RunSummary;

/// Pretty JSON with four-space indentation.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn render_report(report: &RunReport) -> Result<String, serde_json::Error> {
    render_json(report)
}

pub fn log_summary(summary: &RunSummary) {
    info!("📊 Total URLs: {}", summary.total_urls);
    info!("📊 Processed URLs: {}", summary.processed_urls);
    info!("📊 Errored URLs: {}", summary.errored_urls);
}
