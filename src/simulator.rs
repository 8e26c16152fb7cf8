//! Cache-then-disk orchestration with metrics.
//!
//! The [`Simulator`] wires an [`LruBlockCache`] in front of a [`BlockStore`]:
//! writes go through to disk and then populate the cache, reads try the
//! cache first and fall back to disk on a miss.

use crate::cache::{CacheStats, LruBlockCache};
use crate::config::Options;
use crate::error::{Error, Result};
use crate::metrics::{Metrics, MetricsData};
use crate::storage::{block_payload, BlockStore};
use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadSource {
    /// The block was resident in the cache.
    Cache,
    /// The block was read from the backing file.
    Disk,
}

/// Result of a successful read.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    /// Payload of the block, without terminator or padding
    pub data: Bytes,
    /// Where the payload came from
    pub source: ReadSource,
    /// Time taken to serve the read
    pub latency: Duration,
}

/// Result of a successful write.
#[derive(Debug, Clone, Copy)]
pub struct WriteOutcome {
    /// Payload bytes actually stored after truncation
    pub stored: usize,
    /// Time taken by the write
    pub latency: Duration,
}

/// Static description of the simulated disk.
#[derive(Debug, Clone, Serialize)]
pub struct DiskInfo {
    /// Configured capacity in bytes
    pub disk_size_bytes: u64,
    /// Block size in bytes
    pub block_size: usize,
    /// Number of addressable blocks
    pub total_blocks: u64,
    /// Maximum number of cached blocks
    pub cache_capacity: usize,
}

/// Combined cache, latency and disk statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Cache counters
    pub cache: CacheStats,
    /// Latency metrics
    pub metrics: MetricsData,
    /// Disk geometry
    pub disk: DiskInfo,
}

impl StatsReport {
    /// Render the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A block store with an LRU cache in front of it.
///
/// # Thread Safety
///
/// All methods take `&self`, so a `Simulator` can be shared using
/// `Arc<Simulator>`. A disk access and the cache update that follows it run
/// under one lock, so a write-through and a miss fill for the same block
/// never interleave and the cache never holds data older than the disk.
#[derive(Debug)]
pub struct Simulator {
    store: Arc<BlockStore>,
    cache: Arc<LruBlockCache>,
    metrics: Metrics,
    /// Held across each disk access plus its cache update
    io_lock: Mutex<()>,
}

impl Simulator {
    /// Build a simulator from existing store and cache handles.
    pub fn new(store: Arc<BlockStore>, cache: Arc<LruBlockCache>) -> Self {
        Self { store, cache, metrics: Metrics::new(), io_lock: Mutex::new(()) }
    }

    /// Open (or create) the backing file at `path` and build a cache sized by `options`.
    pub fn open<P: AsRef<Path>>(path: P, options: &Options) -> Result<Self> {
        let store = Arc::new(BlockStore::open(path, options)?);
        let cache = Arc::new(LruBlockCache::new(options.cache_capacity));
        Ok(Self::new(store, cache))
    }

    /// Write `data` to a block and cache the stored payload.
    ///
    /// On failure the cache is left untouched.
    pub fn write(&self, block: u64, data: &[u8]) -> Result<WriteOutcome> {
        let start = Instant::now();
        let _io = self.io_lock.lock();
        let stored = self.store.write_block(block, data)?;

        // Cache what a disk read would return
        let payload = block_payload(&Bytes::copy_from_slice(&data[..stored]));
        self.cache.put(block, payload);
        let latency = start.elapsed();
        self.metrics.record_write(latency);

        Ok(WriteOutcome { stored, latency })
    }

    /// Read a block, trying the cache first.
    ///
    /// Out of range blocks are rejected before the cache is consulted, so they
    /// never count as misses.
    pub fn read(&self, block: u64) -> Result<ReadOutcome> {
        if !self.store.is_valid_block(block) {
            return Err(Error::InvalidBlockIndex {
                index: block,
                total_blocks: self.store.total_blocks(),
            });
        }

        let start = Instant::now();

        if let Some(data) = self.cache.get(block) {
            let latency = start.elapsed();
            self.metrics.record_cache_hit(latency);
            return Ok(ReadOutcome { data, source: ReadSource::Cache, latency });
        }

        let _io = self.io_lock.lock();
        let raw = self.store.read_block(block)?;
        let data = block_payload(&raw);
        self.cache.put(block, data.clone());
        let latency = start.elapsed();
        self.metrics.record_cache_miss(latency);

        Ok(ReadOutcome { data, source: ReadSource::Disk, latency })
    }

    /// Drop a block from the cache. Returns true if it was cached.
    pub fn evict(&self, block: u64) -> bool {
        self.cache.remove(block)
    }

    /// Drop every cached block. Counters are kept.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Reset cache counters and latency metrics.
    pub fn reset_stats(&self) {
        self.cache.reset_stats();
        self.metrics.reset();
    }

    /// Collect the current statistics.
    pub fn report(&self) -> StatsReport {
        StatsReport {
            cache: self.cache.stats(),
            metrics: self.metrics.snapshot(),
            disk: DiskInfo {
                disk_size_bytes: self.store.disk_size_bytes(),
                block_size: self.store.block_size(),
                total_blocks: self.store.total_blocks(),
                cache_capacity: self.cache.capacity(),
            },
        }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &Arc<BlockStore> {
        &self.store
    }

    /// Get the underlying cache.
    pub fn cache(&self) -> &Arc<LruBlockCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NoLatency;
    use tempfile::TempDir;

    fn simulator(dir: &TempDir, cache_capacity: usize) -> Simulator {
        let options = Options::new()
            .disk_size(32 * 128)
            .block_size(128)
            .cache_capacity(cache_capacity)
            .no_latency();
        let store = BlockStore::with_latency(dir.path().join("disk.bin"), &options, Arc::new(NoLatency))
            .unwrap();
        Simulator::new(Arc::new(store), Arc::new(LruBlockCache::new(cache_capacity)))
    }

    #[test]
    fn test_write_then_read_hits_cache() {
        let dir = TempDir::new().unwrap();
        let sim = simulator(&dir, 4);

        sim.write(3, b"hello").unwrap();
        let outcome = sim.read(3).unwrap();

        assert_eq!(outcome.source, ReadSource::Cache);
        assert_eq!(outcome.data, Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_miss_reads_disk_then_caches() {
        let dir = TempDir::new().unwrap();
        let sim = simulator(&dir, 4);

        sim.write(1, b"on disk").unwrap();
        sim.clear_cache();

        let first = sim.read(1).unwrap();
        assert_eq!(first.source, ReadSource::Disk);
        assert_eq!(first.data, Bytes::from_static(b"on disk"));

        let second = sim.read(1).unwrap();
        assert_eq!(second.source, ReadSource::Cache);

        let report = sim.report();
        assert_eq!(report.cache.hits, 1);
        assert_eq!(report.cache.misses, 1);
        assert_eq!(report.metrics.cache_hits, 1);
        assert_eq!(report.metrics.cache_misses, 1);
        assert_eq!(report.metrics.total_writes, 1);
    }

    #[test]
    fn test_empty_block_hit_is_not_a_miss() {
        let dir = TempDir::new().unwrap();
        let sim = simulator(&dir, 4);

        // Never written, so its payload is empty
        assert_eq!(sim.read(9).unwrap().source, ReadSource::Disk);

        let again = sim.read(9).unwrap();
        assert_eq!(again.source, ReadSource::Cache);
        assert!(again.data.is_empty());
    }

    #[test]
    fn test_write_caches_truncated_payload() {
        let dir = TempDir::new().unwrap();
        let sim = simulator(&dir, 4);

        let data = vec![b'q'; 500];
        let outcome = sim.write(0, &data).unwrap();
        assert_eq!(outcome.stored, 127);

        let cached = sim.read(0).unwrap();
        assert_eq!(cached.source, ReadSource::Cache);
        assert_eq!(cached.data.len(), 127);

        sim.clear_cache();
        let from_disk = sim.read(0).unwrap();
        assert_eq!(from_disk.data, cached.data);
    }

    #[test]
    fn test_cached_write_matches_disk_with_embedded_terminator() {
        let dir = TempDir::new().unwrap();
        let sim = simulator(&dir, 4);

        sim.write(4, b"abc\0def").unwrap();
        let cached = sim.read(4).unwrap();
        sim.clear_cache();
        let from_disk = sim.read(4).unwrap();

        assert_eq!(cached.data, Bytes::from_static(b"abc"));
        assert_eq!(cached.data, from_disk.data);
    }

    #[test]
    fn test_invalid_block_leaves_state_untouched() {
        let dir = TempDir::new().unwrap();
        let sim = simulator(&dir, 4);

        let before = sim.report();
        assert!(sim.read(32).unwrap_err().is_invalid_block());
        assert!(sim.write(32, b"x").unwrap_err().is_invalid_block());
        let after = sim.report();

        assert_eq!(before.cache, after.cache);
        assert_eq!(before.metrics, after.metrics);
        assert!(!sim.cache().contains(32));
    }

    #[test]
    fn test_evict_and_reset() {
        let dir = TempDir::new().unwrap();
        let sim = simulator(&dir, 4);

        sim.write(2, b"x").unwrap();
        assert!(sim.evict(2));
        assert_eq!(sim.read(2).unwrap().source, ReadSource::Disk);

        sim.reset_stats();
        let report = sim.report();
        assert_eq!(report.cache.hits + report.cache.misses, 0);
        assert_eq!(report.metrics.total_operations, 0);
        assert_eq!(report.cache.cached_blocks, 1);
    }

    #[test]
    fn test_report_json() {
        let dir = TempDir::new().unwrap();
        let sim = simulator(&dir, 4);

        let json = sim.report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["disk"]["total_blocks"], 32);
        assert_eq!(value["disk"]["cache_capacity"], 4);
    }
}
