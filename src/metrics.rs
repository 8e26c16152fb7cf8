//! Latency and hit-rate metrics for the simulator.

use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;

/// Snapshot of the recorded metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsData {
    /// Reads served, from cache or disk
    pub total_reads: u64,
    /// Writes completed
    pub total_writes: u64,
    /// Reads served from the cache
    pub cache_hits: u64,
    /// Reads that went to disk
    pub cache_misses: u64,
    /// Sum of all recorded latencies
    pub total_latency_ms: f64,
    /// Sum of latencies of cache hits
    pub cache_hit_latency_ms: f64,
    /// Sum of latencies of cache misses
    pub cache_miss_latency_ms: f64,
    /// Number of recorded operations
    pub total_operations: u64,
    /// Mean latency over all recorded operations
    pub avg_latency_ms: f64,
}

impl MetricsData {
    /// Read hit ratio as a percentage, 0 when nothing was read.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64 * 100.0
        }
    }

    /// How much faster an average cache hit is than an average disk read, in percent.
    ///
    /// Returns 0 until both hits and misses have been recorded, or when disk
    /// reads took no measurable time.
    pub fn latency_improvement(&self) -> f64 {
        if self.cache_hits == 0 || self.cache_misses == 0 {
            return 0.0;
        }
        let avg_cache = self.cache_hit_latency_ms / self.cache_hits as f64;
        let avg_disk = self.cache_miss_latency_ms / self.cache_misses as f64;
        if avg_disk <= 0.0 {
            return 0.0;
        }
        (avg_disk - avg_cache) / avg_disk * 100.0
    }

    fn add_latency(&mut self, latency_ms: f64) {
        self.total_operations += 1;
        self.total_latency_ms += latency_ms;
        self.avg_latency_ms = self.total_latency_ms / self.total_operations as f64;
    }
}

/// Thread-safe metrics aggregator.
#[derive(Debug, Default)]
pub struct Metrics {
    data: Mutex<MetricsData>,
}

fn as_millis_f64(latency: Duration) -> f64 {
    latency.as_secs_f64() * 1000.0
}

impl Metrics {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read that was not classified as hit or miss.
    pub fn record_read(&self, latency: Duration) {
        let mut data = self.data.lock();
        data.total_reads += 1;
        data.add_latency(as_millis_f64(latency));
    }

    /// Record a completed write.
    pub fn record_write(&self, latency: Duration) {
        let mut data = self.data.lock();
        data.total_writes += 1;
        data.add_latency(as_millis_f64(latency));
    }

    /// Record a read served from the cache.
    pub fn record_cache_hit(&self, latency: Duration) {
        let ms = as_millis_f64(latency);
        let mut data = self.data.lock();
        data.total_reads += 1;
        data.cache_hits += 1;
        data.cache_hit_latency_ms += ms;
        data.add_latency(ms);
    }

    /// Record a read that had to go to disk.
    pub fn record_cache_miss(&self, latency: Duration) {
        let ms = as_millis_f64(latency);
        let mut data = self.data.lock();
        data.total_reads += 1;
        data.cache_misses += 1;
        data.cache_miss_latency_ms += ms;
        data.add_latency(ms);
    }

    /// Get a snapshot of the current metrics.
    pub fn snapshot(&self) -> MetricsData {
        self.data.lock().clone()
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        *self.data.lock() = MetricsData::default();
    }
}
