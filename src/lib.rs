//! # blocksim - A Simulated Block Device with an LRU Block Cache
//!
//! blocksim models a fixed-size, block-addressed disk stored in a single
//! backing file, with an in-memory least-recently-used cache in front of it
//! and latency/hit-rate metrics on top.
//!
//! ## Architecture
//!
//! The simulator consists of a few small components:
//!
//! - **BlockStore**: Fixed-size slots in a backing file with bounds checking
//!   and simulated device latency
//! - **LruBlockCache**: Fixed-capacity LRU cache with O(1) get/put/evict
//! - **Metrics**: Latency and hit-rate aggregation
//! - **Simulator**: Cache-then-disk orchestration over explicit handles
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use blocksim::{Options, ReadSource, Simulator};
//!
//! # fn main() -> Result<(), blocksim::Error> {
//! let options = Options::default();
//! let sim = Simulator::open("virtual_disk.bin", &options)?;
//!
//! sim.write(42, b"hello block")?;
//!
//! let outcome = sim.read(42)?;
//! assert_eq!(outcome.source, ReadSource::Cache);
//! println!("{}", String::from_utf8_lossy(&outcome.data));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod cache;
pub mod config;
pub mod error;
pub mod menu;
pub mod metrics;
pub mod simulator;
pub mod storage;
pub mod util;

// Re-exports
pub use cache::{CacheStats, LruBlockCache};
pub use config::Options;
pub use error::{Error, Result};
pub use metrics::{Metrics, MetricsData};
pub use simulator::{ReadOutcome, ReadSource, Simulator, StatsReport, WriteOutcome};
pub use storage::BlockStore;
