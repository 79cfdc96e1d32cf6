// ─── pom-harvest core ───
//
//   core/
//     maven/      — Coordinates, POM parsing, metadata resolution, artifact fetch
//     downloader/ — Byte fetcher seam (HTTP + in-memory)
//     store       — Flat artifact output directory
//     walker      — Deduplicated dependency graph walk
//     config      — JSON configuration + defaults

pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod maven;
pub mod store;
pub mod walker;
