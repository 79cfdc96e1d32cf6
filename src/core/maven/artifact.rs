use tracing::debug;

use super::coordinate::Coordinate;
use super::metadata::ResolvedMetadata;
use crate::core::downloader::ByteFetcher;
use crate::core::error::{HarvestError, HarvestResult};

/// Binary payload of a resolved coordinate.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub coordinate: Coordinate,
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// `artifactId-version.ext`
    pub fn file_name(&self) -> String {
        self.coordinate.file_name(self.extension)
    }
}

/// URL of the artifact behind `metadata`, on the repository that served the POM.
pub fn artifact_url(metadata: &ResolvedMetadata) -> String {
    metadata
        .coordinate
        .url(&metadata.repository, metadata.packaging.extension())
}

/// Fetch the artifact once from the resolved repository. No retry, no
/// fallback to other repositories; an empty body is `ArtifactNotFound`.
pub async fn fetch_artifact<F: ByteFetcher + ?Sized>(
    fetcher: &F,
    metadata: &ResolvedMetadata,
) -> HarvestResult<Artifact> {
    let url = artifact_url(metadata);
    let bytes = fetcher.fetch_bytes(&url).await;

    if bytes.is_empty() {
        return Err(HarvestError::ArtifactNotFound {
            coordinate: metadata.coordinate.clone(),
            url,
        });
    }

    debug!("Fetched {} ({} bytes)", url, bytes.len());
    Ok(Artifact {
        coordinate: metadata.coordinate.clone(),
        extension: metadata.packaging.extension(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::MemoryFetcher;
    use crate::core::maven::PackagingKind;

    fn metadata(packaging: PackagingKind) -> ResolvedMetadata {
        ResolvedMetadata {
            coordinate: Coordinate::new("com.wdullaer", "materialdatetimepicker", "2.5.0"),
            repository: "https://b.example".to_string(),
            bytes: b"<project/>".to_vec(),
            packaging,
            dependencies: vec![],
        }
    }

    #[test]
    fn url_uses_packaging_extension() {
        assert_eq!(
            artifact_url(&metadata(PackagingKind::Aar)),
            "https://b.example/com/wdullaer/materialdatetimepicker/2.5.0/materialdatetimepicker-2.5.0.aar"
        );
        assert!(artifact_url(&metadata(PackagingKind::Default)).ends_with("-2.5.0.jar"));
    }

    #[tokio::test]
    async fn fetches_only_from_resolved_repository() {
        let meta = metadata(PackagingKind::Jar);
        let fetcher = MemoryFetcher::new()
            .with(meta.coordinate.url("https://a.example", "jar"), b"wrong".to_vec())
            .with(artifact_url(&meta), b"PK\x03\x04".to_vec());

        let artifact = fetch_artifact(&fetcher, &meta).await.unwrap();
        assert_eq!(artifact.bytes, b"PK\x03\x04");
        assert_eq!(artifact.file_name(), "materialdatetimepicker-2.5.0.jar");
        assert_eq!(fetcher.requests(), vec![artifact_url(&meta)]);
    }

    #[tokio::test]
    async fn empty_body_is_not_found() {
        let meta = metadata(PackagingKind::Aar);
        let fetcher = MemoryFetcher::new();
        let err = fetch_artifact(&fetcher, &meta).await.unwrap_err();
        assert!(matches!(err, HarvestError::ArtifactNotFound { url, .. } if url.ends_with(".aar")));
    }
}
