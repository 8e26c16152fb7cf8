//! Block store implementation backed by a single file.

use super::latency::{LatencyModel, UniformLatency};
use super::TERMINATOR;
use crate::config::Options;
use crate::error::{Error, Result};
use bytes::Bytes;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fixed-size, file-backed array of blocks.
///
/// Usage:
/// ```no_run
/// use blocksim::{BlockStore, Options};
///
/// # fn main() -> Result<(), blocksim::Error> {
/// let store = BlockStore::open("virtual_disk.bin", &Options::default())?;
/// store.write_block(3, b"hello")?;
/// let block = store.read_block(3)?;
/// assert_eq!(&block[..5], b"hello");
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// Every read and write holds the file lock for its full duration, including
/// the simulated device delay, so accesses are totally ordered.
#[derive(Debug)]
pub struct BlockStore {
    /// Path to the backing file
    path: PathBuf,
    /// Configured capacity in bytes, including any unaddressable remainder
    disk_size: u64,
    /// Size of one block in bytes
    block_size: usize,
    /// Number of addressable blocks
    total_blocks: u64,
    /// Sync file data after each write
    sync_writes: bool,
    /// Simulated device latency
    latency: Arc<dyn LatencyModel>,
    /// Backing file, exclusively owned
    file: Mutex<File>,
}

impl BlockStore {
    /// Open the backing file, creating and zero-filling it if it does not exist.
    ///
    /// Latency is drawn uniformly from the range configured in `options`.
    pub fn open<P: AsRef<Path>>(path: P, options: &Options) -> Result<Self> {
        let latency = UniformLatency::from_millis(options.min_latency_ms, options.max_latency_ms);
        Self::with_latency(path, options, Arc::new(latency))
    }

    /// Open the backing file with an explicit latency model.
    pub fn with_latency<P: AsRef<Path>>(
        path: P,
        options: &Options,
        latency: Arc<dyn LatencyModel>,
    ) -> Result<Self> {
        options.validate()?;

        let path = path.as_ref().to_path_buf();
        let block_size = options.block_size;
        let total_blocks = options.total_blocks();
        let expected_len = total_blocks * block_size as u64;

        let file = if path.exists() {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(&path)
                .map_err(|e| Error::initialization(&path, e.to_string()))?;

            let actual_len = file
                .metadata()
                .map_err(|e| Error::initialization(&path, e.to_string()))?
                .len();
            if actual_len != expected_len {
                if options.verify_existing_size {
                    return Err(Error::initialization(
                        &path,
                        format!("size mismatch: expected {} bytes, found {}", expected_len, actual_len),
                    ));
                }
                log::warn!(
                    "Disk {:?} is {} bytes, expected {}; continuing without verification",
                    path,
                    actual_len,
                    expected_len
                );
            }

            log::info!("Opened existing disk {:?} ({} blocks)", path, total_blocks);
            file
        } else {
            let file = Self::create_disk(&path, total_blocks, block_size)
                .map_err(|e| Error::initialization(&path, e.to_string()))?;
            log::info!(
                "Created disk {:?}: {} blocks of {} bytes",
                path,
                total_blocks,
                block_size
            );
            file
        };

        Ok(Self {
            path,
            disk_size: options.disk_size as u64,
            block_size,
            total_blocks,
            sync_writes: options.sync_writes,
            latency,
            file: Mutex::new(file),
        })
    }

    /// Create the backing file and fill it with zeroed blocks.
    ///
    /// Fails without touching the path if something already exists there.
    /// A file this call created but could not fill is removed again.
    fn create_disk(path: &Path, total_blocks: u64, block_size: usize) -> io::Result<File> {
        let mut file = OpenOptions::new().read(true).write(true).create_new(true).open(path)?;

        if let Err(e) = Self::zero_fill(&mut file, total_blocks, block_size) {
            // Best effort cleanup of a partially written file
            let _ = fs::remove_file(path);
            return Err(e);
        }

        Ok(file)
    }

    fn zero_fill(file: &mut File, total_blocks: u64, block_size: usize) -> io::Result<()> {
        {
            let mut writer = BufWriter::new(&mut *file);
            let empty_block = vec![0u8; block_size];
            for _ in 0..total_blocks {
                writer.write_all(&empty_block)?;
            }
            writer.flush()?;
        }
        file.sync_all()
    }

    /// Check whether `block` is addressable on this store.
    pub fn is_valid_block(&self, block: u64) -> bool {
        block < self.total_blocks
    }

    fn check_block(&self, block: u64) -> Result<()> {
        if self.is_valid_block(block) {
            Ok(())
        } else {
            Err(Error::InvalidBlockIndex { index: block, total_blocks: self.total_blocks })
        }
    }

    fn offset(&self, block: u64) -> u64 {
        block * self.block_size as u64
    }

    fn simulate_latency(&self) {
        let delay = self.latency.delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    /// Read a whole block.
    ///
    /// The returned buffer is always `block_size` bytes and its final byte is
    /// forced to the terminator. If the backing file ends inside the block,
    /// the missing tail reads as zeros.
    pub fn read_block(&self, block: u64) -> Result<Bytes> {
        self.check_block(block)?;

        let mut file = self.file.lock();
        self.simulate_latency();

        file.seek(SeekFrom::Start(self.offset(block)))?;

        let mut buffer = vec![0u8; self.block_size];
        let filled = read_until_eof(&mut *file, &mut buffer)?;
        if filled < self.block_size {
            log::warn!(
                "Short read of block {} from {:?}: {} of {} bytes",
                block,
                self.path,
                filled,
                self.block_size
            );
        }

        buffer[self.block_size - 1] = TERMINATOR;
        Ok(Bytes::from(buffer))
    }

    /// Write `data` into a block.
    ///
    /// The payload is truncated to `block_size - 1` bytes and zero-padded to
    /// the full block. Returns the number of payload bytes stored.
    pub fn write_block(&self, block: u64, data: &[u8]) -> Result<usize> {
        self.check_block(block)?;

        let mut buffer = vec![0u8; self.block_size];
        let copy_len = data.len().min(self.payload_capacity());
        buffer[..copy_len].copy_from_slice(&data[..copy_len]);

        let mut file = self.file.lock();
        self.simulate_latency();

        file.seek(SeekFrom::Start(self.offset(block)))?;
        file.write_all(&buffer)?;
        file.flush()?;
        if self.sync_writes {
            file.sync_data()?;
        }

        Ok(copy_len)
    }

    /// Number of addressable blocks.
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    /// Size of one block in bytes.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Largest payload a single block can hold.
    pub fn payload_capacity(&self) -> usize {
        self.block_size - 1
    }

    /// Configured disk capacity in bytes.
    pub fn disk_size_bytes(&self) -> u64 {
        self.disk_size
    }

    /// Get the path to the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Fill `buf` from `reader`, stopping early only at end of file.
fn read_until_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
