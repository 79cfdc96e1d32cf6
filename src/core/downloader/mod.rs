mod client;
mod memory;

pub use client::{ByteFetcher, HttpFetcher};
pub use memory::MemoryFetcher;
