use std::path::PathBuf;

use clap::Parser;

use crate::core::config::HarvestConfig;
use crate::core::error::HarvestResult;
use crate::core::maven::Coordinate;

#[derive(Debug, Parser)]
#[command(
    name = "pom-harvest",
    version,
    about = "Resolve Maven coordinates transitively and download their artifacts"
)]
pub struct Cli {
    /// Packages to resolve as group:name:version (default: configured seed list)
    pub packages: Vec<Coordinate>,
    /// JSON configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Directory artifacts are written to
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
    /// Repository base URL, tried in the order given (replaces the configured list)
    #[arg(long = "repo", value_name = "URL")]
    pub repositories: Vec<String>,
}

impl Cli {
    /// Load the configuration and apply command-line overrides on top.
    pub fn into_config(self) -> HarvestResult<HarvestConfig> {
        let mut config = HarvestConfig::load(self.config.as_deref())?;

        if !self.packages.is_empty() {
            config.packages = self.packages;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if !self.repositories.is_empty() {
            config.repositories = self.repositories;
        }

        config.validate()?;
        Ok(config)
    }
}
