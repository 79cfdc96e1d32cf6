mod artifact;
mod coordinate;
mod metadata;
mod pom;

pub use artifact::{artifact_url, fetch_artifact, Artifact};
pub use coordinate::Coordinate;
pub use metadata::{MetadataResolver, ResolvedMetadata};
pub use pom::{
    extract_declared_dependencies, extract_dependencies, extract_packaging, is_well_formed,
    DeclaredDependency, PackagingKind,
};

/// Repositories searched when no configuration says otherwise, in priority order.
pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";
pub const GOOGLE_MAVEN: &str = "https://dl.google.com/dl/android/maven2";
pub const FABRIC_MAVEN: &str = "https://maven.fabric.io/public";
