//! Simulated device latency.
//!
//! The store charges a delay on every read and write to model the physical
//! access cost of a real device. The delay strategy is pluggable so tests can
//! run with no delay at all.

use rand::Rng;
use std::fmt;
use std::time::Duration;

/// Strategy deciding how long a single device access takes.
pub trait LatencyModel: Send + Sync + fmt::Debug {
    /// Delay to charge for the next access.
    fn delay(&self) -> Duration;
}

/// No simulated latency.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLatency;

impl LatencyModel for NoLatency {
    fn delay(&self) -> Duration {
        Duration::ZERO
    }
}

/// The same delay on every access.
#[derive(Debug, Clone, Copy)]
pub struct FixedLatency(pub Duration);

impl LatencyModel for FixedLatency {
    fn delay(&self) -> Duration {
        self.0
    }
}

/// Uniformly random whole-millisecond delay in `[min_ms, max_ms]`.
#[derive(Debug, Clone, Copy)]
pub struct UniformLatency {
    min_ms: u64,
    max_ms: u64,
}

impl UniformLatency {
    /// Create a uniform latency model. Bounds are reordered if inverted.
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms: min_ms.min(max_ms), max_ms: min_ms.max(max_ms) }
    }

    /// Lower and upper bound in milliseconds.
    pub fn bounds(&self) -> (u64, u64) {
        (self.min_ms, self.max_ms)
    }
}

impl Default for UniformLatency {
    fn default() -> Self {
        Self::from_millis(1, 5)
    }
}

impl LatencyModel for UniformLatency {
    fn delay(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }
}
