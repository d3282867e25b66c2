use anyhow::{Context, Result};
use std::process::ExitCode;

use article_wordfreq::application::{log_summary, render_report, run_pipeline};
use article_wordfreq::infrastructure::{AppConfig, init_logging_with_config, log_system_info};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Logging may not be initialized yet
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;
    log_system_info();

    let report = run_pipeline(&config).await?;
    log_summary(&report.summary);

    println!("{}", render_report(&report)?);
    Ok(())
}
