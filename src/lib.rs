pub mod cli;
pub mod core;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::core::config::HarvestConfig;
use crate::core::downloader::HttpFetcher;
use crate::core::error::{HarvestError, HarvestResult};
use crate::core::http::build_http_client;
use crate::core::walker::{HarvestReport, Walker};

/// Binary entry point: parse arguments, harvest, report.
///
/// Failed packages are logged but do not change the exit status; only a
/// configuration or startup failure does.
pub fn run() -> ExitCode {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pom_harvest=debug")),
        )
        .init();

    let config = match Cli::parse().into_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Could not start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(harvest(&config)) {
        Ok(report) => {
            if report.aborted {
                tracing::warn!("Walk stopped early; some dependencies were not visited");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Resolve the configured seed packages over HTTP into `config.output_dir`.
pub async fn harvest(config: &HarvestConfig) -> HarvestResult<HarvestReport> {
    let client = build_http_client(config.request_timeout())?;
    let fetcher = HttpFetcher::new(client);

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| HarvestError::Io {
            path: config.output_dir.clone(),
            source: e,
        })?;

    tracing::info!(
        "Resolving {} packages against {} repositories into {:?}",
        config.packages.len(),
        config.repositories.len(),
        config.output_dir
    );

    let mut walker = Walker::new(
        &fetcher,
        &config.repositories,
        &config.output_dir,
        config.walk_options(),
    );
    Ok(walker.resolve_all(&config.packages).await)
}
