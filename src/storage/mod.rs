//! Fixed-size, block-addressed storage on a backing file.
//!
//! The backing file is a flat array of equally sized slots. Block `i`
//! occupies bytes `[i * block_size, (i + 1) * block_size)`.
//!
//! ## Slot Format
//!
//! ```text
//! [payload: up to block_size - 1 bytes][zero padding][terminator: 1B = 0x00]
//! ```
//!
//! Writes never change the length of the backing file; every slot is always
//! exactly `block_size` bytes regardless of payload length.

pub mod latency;
pub mod store;

pub use latency::{FixedLatency, LatencyModel, NoLatency, UniformLatency};
pub use store::BlockStore;

use bytes::Bytes;

/// Default block size (4KB)
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Byte that terminates a block's text payload
pub const TERMINATOR: u8 = 0;

/// Extract the payload of a block read from the store.
///
/// The payload is every byte before the first terminator. Slicing a `Bytes`
/// shares the underlying buffer, so no copy is made.
pub fn block_payload(block: &Bytes) -> Bytes {
    let end = block.iter().position(|&b| b == TERMINATOR).unwrap_or(block.len());
    block.slice(..end)
}
