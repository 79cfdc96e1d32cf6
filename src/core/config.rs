use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{HarvestError, HarvestResult};
use crate::core::maven::{Coordinate, FABRIC_MAVEN, GOOGLE_MAVEN, MAVEN_CENTRAL};
use crate::core::walker::{MissingArtifactPolicy, WalkOptions};

const APP_DIR_NAME: &str = "pom-harvest";
const CONFIG_FILE: &str = "config.json";

/// Run configuration. Every field is optional in the JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Repository base URLs in priority order.
    pub repositories: Vec<String>,
    /// Seed coordinates, `group:name:version`.
    pub packages: Vec<Coordinate>,
    pub output_dir: PathBuf,
    pub missing_artifact_policy: MissingArtifactPolicy,
    pub max_depth: usize,
    pub max_dispatches: usize,
    /// Declared dependencies with one of these scopes are not followed.
    pub exclude_scopes: Vec<String>,
    /// Do not follow dependencies marked optional.
    pub exclude_optional: bool,
    pub request_timeout_secs: Option<u64>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        let walk = WalkOptions::default();
        Self {
            repositories: vec![
                MAVEN_CENTRAL.to_string(),
                GOOGLE_MAVEN.to_string(),
                FABRIC_MAVEN.to_string(),
            ],
            packages: default_packages(),
            output_dir: PathBuf::from("."),
            missing_artifact_policy: walk.missing_artifact_policy,
            max_depth: walk.max_depth,
            max_dispatches: walk.max_dispatches,
            exclude_scopes: walk.exclude_scopes,
            exclude_optional: walk.exclude_optional,
            request_timeout_secs: None,
        }
    }
}

impl HarvestConfig {
    /// Load from `path`, or from the per-user config file when it exists,
    /// falling back to built-in defaults.
    pub fn load(path: Option<&Path>) -> HarvestResult<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(p) if p.is_file() => Self::from_file(&p),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> HarvestResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| HarvestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: HarvestConfig = serde_json::from_str(&raw)?;
        info!("Loaded configuration from {:?}", path);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HarvestResult<()> {
        if self.repositories.is_empty() {
            return Err(HarvestError::Config("no repositories configured".into()));
        }
        if let Some(bad) = self.repositories.iter().find(|r| r.trim().is_empty()) {
            return Err(HarvestError::Config(format!("invalid repository URL {:?}", bad)));
        }
        if self.max_dispatches == 0 {
            return Err(HarvestError::Config("max_dispatches must be at least 1".into()));
        }
        Ok(())
    }

    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            missing_artifact_policy: self.missing_artifact_policy,
            max_depth: self.max_depth,
            max_dispatches: self.max_dispatches,
            exclude_scopes: self.exclude_scopes.clone(),
            exclude_optional: self.exclude_optional,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE))
}

fn default_packages() -> Vec<Coordinate> {
    [
        ("com.android.support", "design", "25.0.0"),
        ("com.android.support", "appcompat-v7", "25.0.0"),
        ("com.android.support", "cardview-v7", "25.0.0"),
        ("com.android.support", "support-vector-drawable", "25.0.0"),
        ("com.android.support", "animated-vector-drawable", "25.0.0"),
        ("com.wdullaer", "materialdatetimepicker", "2.5.0"),
        ("org.greenrobot", "eventbus", "3.0.0"),
        ("com.jakewharton", "butterknife-compiler", "8.2.1"),
        ("com.jakewharton", "butterknife", "8.2.1"),
        ("com.crashlytics.sdk.android", "crashlytics", "2.6.2"),
        ("com.crashlytics.sdk.android", "answers", "1.3.9"),
    ]
    .into_iter()
    .map(|(g, a, v)| Coordinate::new(g, a, v))
    .collect()
}
