//! Interactive block storage simulator.

use anyhow::{Context, Result};
use blocksim::menu::Menu;
use blocksim::util::format_bytes;
use blocksim::{Options, Simulator};
use clap::Parser;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "blocksim", version, about = "Simulated block device with an LRU block cache")]
struct Cli {
    /// Backing file for the simulated disk
    #[arg(long, default_value = "virtual_disk.bin")]
    disk: PathBuf,

    /// Disk capacity in megabytes
    #[arg(long, default_value_t = 10)]
    disk_size_mb: usize,

    /// Block size in bytes
    #[arg(long, default_value_t = 4096)]
    block_size: usize,

    /// Number of blocks the cache may hold (0 disables caching)
    #[arg(long, default_value_t = 100)]
    cache_blocks: usize,

    /// Disable the simulated device latency
    #[arg(long)]
    no_latency: bool,

    /// Skip verifying the size of an existing disk file
    #[arg(long)]
    no_verify: bool,

    /// Print statistics as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn options(&self) -> Result<Options> {
        let options = Options::new()
            .disk_size_mb(self.disk_size_mb)?
            .block_size(self.block_size)
            .cache_capacity(self.cache_blocks)
            .verify_existing_size(!self.no_verify);
        if self.no_latency {
            Ok(options.no_latency())
        } else {
            Ok(options)
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let options = cli.options()?;
    let sim = Simulator::open(&cli.disk, &options)
        .with_context(|| format!("failed to set up disk {}", cli.disk.display()))?;
    log::info!(
        "Simulating {} across {} blocks",
        format_bytes(sim.store().disk_size_bytes()),
        sim.store().total_blocks()
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(&sim, stdin.lock(), stdout.lock()).json_stats(cli.json).run()?;

    Ok(())
}
