//! Configuration options for the block storage simulator.

use crate::storage::DEFAULT_BLOCK_SIZE;

const MB: usize = 1024 * 1024;

/// Configuration options for opening a simulated disk and its cache.
#[derive(Debug, Clone)]
pub struct Options {
    /// Total capacity of the backing file in bytes.
    /// Any remainder past the last whole block is unaddressable.
    /// Default: 10MB
    pub disk_size: usize,

    /// Size of a single block in bytes.
    /// The final byte of every block is reserved as a text terminator.
    /// Default: 4KB
    pub block_size: usize,

    /// Maximum number of blocks held by the LRU cache.
    /// Set to 0 to disable caching.
    /// Default: 100
    pub cache_capacity: usize,

    /// Lower bound of the simulated per-access device latency, in milliseconds.
    /// Default: 1
    pub min_latency_ms: u64,

    /// Upper bound of the simulated per-access device latency, in milliseconds.
    /// Default: 5
    pub max_latency_ms: u64,

    /// Sync the backing file to disk after every block write.
    /// Default: true
    pub sync_writes: bool,

    /// Reject an existing backing file whose length differs from
    /// `total_blocks * block_size`.
    /// Default: true
    pub verify_existing_size: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            disk_size: 10 * MB, // 10MB
            block_size: DEFAULT_BLOCK_SIZE,
            cache_capacity: 100,
            min_latency_ms: 1,
            max_latency_ms: 5,
            sync_writes: true,
            verify_existing_size: true,
        }
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the disk capacity in bytes.
    pub fn disk_size(mut self, size: usize) -> Self {
        self.disk_size = size;
        self
    }

    /// Sets the disk capacity in megabytes.
    ///
    /// Fails if the size in bytes does not fit in a `usize`.
    pub fn disk_size_mb(mut self, mb: usize) -> crate::Result<Self> {
        self.disk_size = mb.checked_mul(MB).ok_or_else(|| {
            crate::Error::invalid_argument(format!("disk size of {} MB is too large", mb))
        })?;
        Ok(self)
    }

    /// Sets the block size in bytes.
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Sets the number of blocks the cache may hold.
    pub fn cache_capacity(mut self, blocks: usize) -> Self {
        self.cache_capacity = blocks;
        self
    }

    /// Sets the simulated latency range in milliseconds.
    pub fn latency_ms(mut self, min: u64, max: u64) -> Self {
        self.min_latency_ms = min;
        self.max_latency_ms = max;
        self
    }

    /// Disables the simulated device latency.
    pub fn no_latency(self) -> Self {
        self.latency_ms(0, 0)
    }

    /// Enables or disables syncing after each write.
    pub fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    /// Enables or disables size verification of an existing backing file.
    pub fn verify_existing_size(mut self, value: bool) -> Self {
        self.verify_existing_size = value;
        self
    }

    /// Number of addressable blocks for this configuration.
    pub fn total_blocks(&self) -> u64 {
        if self.block_size == 0 {
            return 0;
        }
        (self.disk_size / self.block_size) as u64
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.block_size < 2 {
            return Err(crate::Error::invalid_argument(
                "block_size must be >= 2 to hold data and a terminator",
            ));
        }
        if self.disk_size < self.block_size {
            return Err(crate::Error::invalid_argument("disk_size must hold at least one block"));
        }
        if self.min_latency_ms > self.max_latency_ms {
            return Err(crate::Error::invalid_argument(
                "min_latency_ms must not exceed max_latency_ms",
            ));
        }
        Ok(())
    }
}
