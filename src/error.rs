//! Error types for the block storage simulator.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The result type used throughout blocksim.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for blocksim operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The block index is outside `[0, total_blocks)`.
    #[error("Invalid block index {index} (valid range 0..{total_blocks})")]
    InvalidBlockIndex {
        /// The rejected index.
        index: u64,
        /// Number of addressable blocks on the store.
        total_blocks: u64,
    },

    /// A seek, read, write or flush failed at the backing file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The backing file could not be created or opened.
    #[error("Failed to initialize disk {path:?}: {reason}")]
    Initialization {
        /// Path of the backing file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a new initialization error for the given backing file.
    pub fn initialization(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Initialization { path: path.into(), reason: reason.into() }
    }

    /// Returns true if this error reports an out-of-range block index.
    pub fn is_invalid_block(&self) -> bool {
        matches!(self, Error::InvalidBlockIndex { .. })
    }

    /// Returns true if this error came from the backing file.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
