use std::path::PathBuf;
use thiserror::Error;

use crate::core::maven::Coordinate;

/// Central error type for the harvester.
/// Every module returns `Result<T, HarvestError>`.
#[derive(Debug, Error)]
pub enum HarvestError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Could not find a valid POM for {coordinate} in any of {} repositories", repositories.len())]
    MetadataNotFound {
        coordinate: Coordinate,
        repositories: Vec<String>,
    },

    #[error("Artifact {coordinate} not found at {url}")]
    ArtifactNotFound { coordinate: Coordinate, url: String },

    // ── Store ───────────────────────────────────────────
    #[error("File {path:?} could not be written: {source}")]
    StoreIo {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Traversal ───────────────────────────────────────
    #[error("{coordinate} is {depth} levels deep, beyond the configured limit")]
    DepthLimitExceeded { coordinate: Coordinate, depth: usize },

    #[error("Traversal stopped after {0} dispatched packages")]
    TraversalLimit(usize),

    // ── Config ──────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type HarvestResult<T> = Result<T, HarvestError>;
