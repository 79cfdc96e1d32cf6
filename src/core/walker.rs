use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::downloader::ByteFetcher;
use crate::core::error::HarvestError;
use crate::core::maven::{fetch_artifact, Coordinate, DeclaredDependency, MetadataResolver};
use crate::core::store::ArtifactStore;

/// What to do with a package's dependencies when its own artifact could not
/// be fetched or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingArtifactPolicy {
    /// The POM was already resolved, so keep walking its dependencies.
    #[default]
    ContinueDependencies,
    /// Drop the whole dependency subtree of a package whose artifact is missing.
    SkipDependencies,
}

#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub missing_artifact_policy: MissingArtifactPolicy,
    /// Seeds sit at depth 0. Coordinates found deeper are reported, not dispatched.
    pub max_depth: usize,
    /// Hard cap on dispatched coordinates for one walker.
    pub max_dispatches: usize,
    pub exclude_scopes: Vec<String>,
    /// Skip dependencies declared `<optional>true</optional>`.
    pub exclude_optional: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            missing_artifact_policy: MissingArtifactPolicy::default(),
            max_depth: 64,
            max_dispatches: 10_000,
            exclude_scopes: Vec::new(),
            exclude_optional: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub coordinate: Coordinate,
    pub repository: String,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct Failure {
    pub coordinate: Coordinate,
    pub error: HarvestError,
}

/// Outcome of a walk. Failures are per coordinate and never stop the walk,
/// except for the dispatch cap which sets `aborted`.
#[derive(Debug, Default)]
pub struct HarvestReport {
    /// Coordinates in dispatch order.
    pub dispatched: Vec<Coordinate>,
    pub stored: Vec<StoredArtifact>,
    pub failures: Vec<Failure>,
    pub aborted: bool,
}

impl HarvestReport {
    pub fn failed(&self, coordinate: &Coordinate) -> bool {
        self.failures.iter().any(|f| &f.coordinate == coordinate)
    }

    pub fn dispatch_count(&self, coordinate: &Coordinate) -> usize {
        self.dispatched.iter().filter(|c| *c == coordinate).count()
    }
}

/// Depth-first, pre-order walk of the dependency graph.
///
/// Each distinct coordinate is dispatched at most once per walker: its POM is
/// resolved, its artifact fetched from the same repository and stored, and
/// its declared dependencies queued in document order.
pub struct Walker<'a, F: ByteFetcher + ?Sized> {
    fetcher: &'a F,
    resolver: MetadataResolver<'a, F>,
    store: ArtifactStore,
    options: WalkOptions,
    visited: HashSet<Coordinate>,
    depth_limited: HashSet<Coordinate>,
}

impl<'a, F: ByteFetcher + ?Sized> Walker<'a, F> {
    pub fn new(
        fetcher: &'a F,
        repositories: &'a [String],
        output_dir: impl Into<PathBuf>,
        options: WalkOptions,
    ) -> Self {
        Self {
            fetcher,
            resolver: MetadataResolver::new(fetcher, repositories),
            store: ArtifactStore::new(output_dir),
            options,
            visited: HashSet::new(),
            depth_limited: HashSet::new(),
        }
    }

    pub fn visited(&self) -> &HashSet<Coordinate> {
        &self.visited
    }

    pub async fn resolve_all(&mut self, seeds: &[Coordinate]) -> HarvestReport {
        let mut report = HarvestReport::default();

        // LIFO work list; children go in reversed so they pop in document order.
        let mut pending: Vec<(Coordinate, usize)> =
            seeds.iter().rev().map(|c| (c.clone(), 0)).collect();

        while let Some((coordinate, depth)) = pending.pop() {
            if self.visited.contains(&coordinate) {
                continue;
            }

            if depth > self.options.max_depth {
                if !self.depth_limited.insert(coordinate.clone()) {
                    continue;
                }
                warn!("Not following {}: depth {} exceeds limit", coordinate, depth);
                report.failures.push(Failure {
                    error: HarvestError::DepthLimitExceeded {
                        coordinate: coordinate.clone(),
                        depth,
                    },
                    coordinate,
                });
                continue;
            }

            if self.visited.len() >= self.options.max_dispatches {
                warn!(
                    "Dispatch limit of {} reached, stopping before {}",
                    self.options.max_dispatches, coordinate
                );
                report.failures.push(Failure {
                    coordinate,
                    error: HarvestError::TraversalLimit(self.options.max_dispatches),
                });
                report.aborted = true;
                break;
            }

            let children = self.dispatch(&coordinate, &mut report).await;
            pending.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        }

        info!(
            "Walk finished: {} dispatched, {} stored, {} failed",
            report.dispatched.len(),
            report.stored.len(),
            report.failures.len()
        );
        report
    }

    /// Process one coordinate and return the dependencies to follow.
    async fn dispatch(&mut self, coordinate: &Coordinate, report: &mut HarvestReport) -> Vec<Coordinate> {
        self.visited.insert(coordinate.clone());
        report.dispatched.push(coordinate.clone());

        let metadata = match self.resolver.resolve(coordinate).await {
            Ok(m) => m,
            Err(e) => {
                warn!("Could not process package {}: {}", coordinate, e);
                report.failures.push(Failure {
                    coordinate: coordinate.clone(),
                    error: e,
                });
                return Vec::new();
            }
        };

        let stored = match fetch_artifact(self.fetcher, &metadata).await {
            Ok(artifact) => self.store.store(&artifact).await,
            Err(e) => Err(e),
        };

        match stored {
            Ok(path) => {
                info!("Downloaded package {}", coordinate);
                report.stored.push(StoredArtifact {
                    coordinate: coordinate.clone(),
                    repository: metadata.repository.clone(),
                    path,
                });
            }
            Err(e) => {
                warn!("Package {} not stored: {}", coordinate, e);
                report.failures.push(Failure {
                    coordinate: coordinate.clone(),
                    error: e,
                });
                if self.options.missing_artifact_policy == MissingArtifactPolicy::SkipDependencies {
                    debug!("Skipping dependencies of {}", coordinate);
                    return Vec::new();
                }
            }
        }

        metadata
            .dependencies
            .iter()
            .filter(|d| self.follows(d))
            .map(|d| {
                debug!("{} depends on package {}", coordinate, d.coordinate);
                d.coordinate.clone()
            })
            .collect()
    }

    fn follows(&self, dependency: &DeclaredDependency) -> bool {
        if dependency.optional && self.options.exclude_optional {
            return false;
        }
        match &dependency.scope {
            Some(scope) => !self.options.exclude_scopes.iter().any(|s| s == scope),
            None => true,
        }
    }
}

/// Walk `seeds` with a fresh walker, writing artifacts into `output_dir`.
pub async fn resolve_all<F: ByteFetcher + ?Sized>(
    fetcher: &F,
    repositories: &[String],
    seeds: &[Coordinate],
    output_dir: impl Into<PathBuf>,
    options: WalkOptions,
) -> HarvestReport {
    Walker::new(fetcher, repositories, output_dir, options)
        .resolve_all(seeds)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::MemoryFetcher;

    const REPO: &str = "https://repo.example";

    fn pom(deps: &[(&str, &str, &str, Option<&str>)]) -> String {
        let mut xml = String::from("<project><dependencies>");
        for (g, a, v, scope) in deps {
            xml.push_str(&format!(
                "<dependency><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version>",
                g, a, v
            ));
            if let Some(s) = scope {
                xml.push_str(&format!("<scope>{}</scope>", s));
            }
            xml.push_str("</dependency>");
        }
        xml.push_str("</dependencies></project>");
        xml
    }

    fn publish(fetcher: &mut MemoryFetcher, c: &Coordinate, pom_xml: String, jar: bool) {
        fetcher.insert(c.pom_url(REPO), pom_xml);
        if jar {
            fetcher.insert(c.url(REPO, "jar"), b"PK".to_vec());
        }
    }

    #[tokio::test]
    async fn dispatch_order_is_preorder_document_order() {
        let root = Coordinate::new("g", "root", "1");
        let a = Coordinate::new("g", "a", "1");
        let b = Coordinate::new("g", "b", "1");
        let a1 = Coordinate::new("g", "a1", "1");

        let mut fetcher = MemoryFetcher::new();
        publish(&mut fetcher, &root, pom(&[("g", "a", "1", None), ("g", "b", "1", None)]), true);
        publish(&mut fetcher, &a, pom(&[("g", "a1", "1", None)]), true);
        publish(&mut fetcher, &b, pom(&[]), true);
        publish(&mut fetcher, &a1, pom(&[]), true);

        let dir = tempfile::tempdir().unwrap();
        let repos = vec![REPO.to_string()];
        let mut walker = Walker::new(&fetcher, &repos, dir.path(), WalkOptions::default());
        let report = walker.resolve_all(&[root.clone()]).await;

        assert_eq!(report.dispatched, vec![root, a, a1, b]);
        assert_eq!(report.stored.len(), 4);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn excluded_scopes_are_not_followed() {
        let root = Coordinate::new("g", "root", "1");
        let mut fetcher = MemoryFetcher::new();
        publish(
            &mut fetcher,
            &root,
            pom(&[("junit", "junit", "4.12", Some("test")), ("g", "lib", "1", Some("compile"))]),
            true,
        );
        publish(&mut fetcher, &Coordinate::new("g", "lib", "1"), pom(&[]), true);

        let dir = tempfile::tempdir().unwrap();
        let repos = vec![REPO.to_string()];
        let options = WalkOptions {
            exclude_scopes: vec!["test".to_string()],
            ..WalkOptions::default()
        };
        let mut walker = Walker::new(&fetcher, &repos, dir.path(), options);
        let report = walker.resolve_all(&[root]).await;

        assert_eq!(report.dispatched.len(), 2);
        assert!(!walker.visited().contains(&Coordinate::new("junit", "junit", "4.12")));
    }

    #[tokio::test]
    async fn depth_limit_reports_instead_of_dispatching() {
        let c0 = Coordinate::new("g", "c0", "1");
        let c1 = Coordinate::new("g", "c1", "1");
        let c2 = Coordinate::new("g", "c2", "1");
        let mut fetcher = MemoryFetcher::new();
        publish(&mut fetcher, &c0, pom(&[("g", "c1", "1", None)]), true);
        publish(&mut fetcher, &c1, pom(&[("g", "c2", "1", None)]), true);
        publish(&mut fetcher, &c2, pom(&[]), true);

        let dir = tempfile::tempdir().unwrap();
        let repos = vec![REPO.to_string()];
        let options = WalkOptions {
            max_depth: 1,
            ..WalkOptions::default()
        };
        let mut walker = Walker::new(&fetcher, &repos, dir.path(), options);
        let report = walker.resolve_all(&[c0.clone()]).await;

        assert_eq!(report.dispatched, vec![c0, c1]);
        assert!(matches!(
            report.failures.as_slice(),
            [Failure { error: HarvestError::DepthLimitExceeded { depth: 2, .. }, .. }]
        ));
        assert!(!report.aborted);
    }

    #[tokio::test]
    async fn depth_limited_coordinate_is_reported_once() {
        let root = Coordinate::new("g", "root", "1");
        let left = Coordinate::new("g", "left", "1");
        let right = Coordinate::new("g", "right", "1");
        let shared = Coordinate::new("g", "shared", "1");
        let mut fetcher = MemoryFetcher::new();
        publish(&mut fetcher, &root, pom(&[("g", "left", "1", None), ("g", "right", "1", None)]), true);
        publish(&mut fetcher, &left, pom(&[("g", "shared", "1", None)]), true);
        publish(&mut fetcher, &right, pom(&[("g", "shared", "1", None)]), true);
        publish(&mut fetcher, &shared, pom(&[]), true);

        let dir = tempfile::tempdir().unwrap();
        let repos = vec![REPO.to_string()];
        let options = WalkOptions {
            max_depth: 1,
            ..WalkOptions::default()
        };
        let mut walker = Walker::new(&fetcher, &repos, dir.path(), options);
        let report = walker.resolve_all(&[root.clone()]).await;

        assert_eq!(report.dispatched, vec![root, left, right]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].coordinate, shared);
        assert_eq!(report.dispatch_count(&shared), 0);
    }

    #[tokio::test]
    async fn optional_dependencies_can_be_excluded() {
        let root = Coordinate::new("g", "root", "1");
        let extra = Coordinate::new("g", "extra", "1");
        let mut fetcher = MemoryFetcher::new();
        fetcher.insert(
            root.pom_url(REPO),
            "<project><dependencies><dependency><groupId>g</groupId><artifactId>extra</artifactId>\
             <version>1</version><optional>true</optional></dependency></dependencies></project>",
        );
        fetcher.insert(root.url(REPO, "jar"), b"PK".to_vec());
        publish(&mut fetcher, &extra, pom(&[]), true);

        let repos = vec![REPO.to_string()];

        let dir = tempfile::tempdir().unwrap();
        let mut walker = Walker::new(&fetcher, &repos, dir.path(), WalkOptions::default());
        let report = walker.resolve_all(&[root.clone()]).await;
        assert_eq!(report.dispatch_count(&extra), 1);

        let dir = tempfile::tempdir().unwrap();
        let options = WalkOptions {
            exclude_optional: true,
            ..WalkOptions::default()
        };
        let mut walker = Walker::new(&fetcher, &repos, dir.path(), options);
        let report = walker.resolve_all(&[root]).await;
        assert_eq!(report.dispatch_count(&extra), 0);
    }

    #[tokio::test]
    async fn dispatch_cap_aborts_the_walk() {
        let seeds: Vec<Coordinate> = (0..5)
            .map(|i| Coordinate::new("g", format!("p{}", i), "1"))
            .collect();
        let fetcher = MemoryFetcher::new();
        let dir = tempfile::tempdir().unwrap();
        let repos = vec![REPO.to_string()];
        let options = WalkOptions {
            max_dispatches: 3,
            ..WalkOptions::default()
        };
        let mut walker = Walker::new(&fetcher, &repos, dir.path(), options);
        let report = walker.resolve_all(&seeds).await;

        assert!(report.aborted);
        assert_eq!(report.dispatched.len(), 3);
        assert!(matches!(
            report.failures.last(),
            Some(Failure { error: HarvestError::TraversalLimit(3), .. })
        ));
    }

    #[tokio::test]
    async fn visited_set_spans_calls_on_one_walker() {
        let c = Coordinate::new("g", "once", "1");
        let mut fetcher = MemoryFetcher::new();
        publish(&mut fetcher, &c, pom(&[]), true);

        let dir = tempfile::tempdir().unwrap();
        let repos = vec![REPO.to_string()];
        let mut walker = Walker::new(&fetcher, &repos, dir.path(), WalkOptions::default());
        let first = walker.resolve_all(&[c.clone()]).await;
        let second = walker.resolve_all(&[c.clone()]).await;

        assert_eq!(first.dispatched.len(), 1);
        assert!(second.dispatched.is_empty());
        assert_eq!(fetcher.request_count(&c.pom_url(REPO)), 1);
    }
}
