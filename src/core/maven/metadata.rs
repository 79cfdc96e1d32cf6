use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::coordinate::Coordinate;
use super::pom::{self, DeclaredDependency, PackagingKind};
use crate::core::downloader::ByteFetcher;
use crate::core::error::{HarvestError, HarvestResult};

/// Everything learned about a coordinate from the repository that served
/// its POM. Built once by `MetadataResolver`; the artifact is fetched from
/// `repository` and nowhere else.
#[derive(Debug, Clone)]
pub struct ResolvedMetadata {
    pub coordinate: Coordinate,
    pub repository: String,
    pub bytes: Vec<u8>,
    pub packaging: PackagingKind,
    pub dependencies: Vec<DeclaredDependency>,
}

/// Locates the repository hosting a coordinate's POM.
///
/// Repositories are tried in configured order; the first one whose response
/// is a well-formed document wins. Outcomes, failures included, are cached
/// for the lifetime of the resolver.
pub struct MetadataResolver<'a, F: ByteFetcher + ?Sized> {
    fetcher: &'a F,
    repositories: &'a [String],
    cache: HashMap<Coordinate, Option<Arc<ResolvedMetadata>>>,
}

impl<'a, F: ByteFetcher + ?Sized> MetadataResolver<'a, F> {
    pub fn new(fetcher: &'a F, repositories: &'a [String]) -> Self {
        Self {
            fetcher,
            repositories,
            cache: HashMap::new(),
        }
    }

    pub fn repositories(&self) -> &[String] {
        self.repositories
    }

    pub async fn resolve(&mut self, coordinate: &Coordinate) -> HarvestResult<Arc<ResolvedMetadata>> {
        if let Some(cached) = self.cache.get(coordinate) {
            return cached.clone().ok_or_else(|| self.not_found(coordinate));
        }

        let resolved = self.search(coordinate).await.map(Arc::new);
        self.cache.insert(coordinate.clone(), resolved.clone());
        resolved.ok_or_else(|| self.not_found(coordinate))
    }

    async fn search(&self, coordinate: &Coordinate) -> Option<ResolvedMetadata> {
        for repo in self.repositories {
            let url = coordinate.pom_url(repo);
            let bytes = self.fetcher.fetch_bytes(&url).await;

            if bytes.is_empty() {
                debug!("Repository {} has no POM for {}", repo, coordinate);
                continue;
            }
            if !pom::is_well_formed(&bytes) {
                debug!("Repository {} served a malformed POM for {}", repo, coordinate);
                continue;
            }

            debug!("Resolved {} from {}", coordinate, repo);
            return Some(ResolvedMetadata {
                coordinate: coordinate.clone(),
                repository: repo.clone(),
                packaging: pom::extract_packaging(&bytes),
                dependencies: pom::extract_declared_dependencies(&bytes),
                bytes,
            });
        }

        None
    }

    fn not_found(&self, coordinate: &Coordinate) -> HarvestError {
        HarvestError::MetadataNotFound {
            coordinate: coordinate.clone(),
            repositories: self.repositories.to_vec(),
        }
    }
}
