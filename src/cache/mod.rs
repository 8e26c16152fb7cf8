//! Block cache sitting in front of the simulated disk.
//!
//! Provides a fixed-capacity LRU (Least Recently Used) cache so that hot
//! blocks are served without paying the simulated device latency.

mod lru;

pub use lru::{CacheStats, LruBlockCache};
