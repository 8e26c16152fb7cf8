//! Interactive menu driving a [`Simulator`].
//!
//! Reads choices line by line from any `BufRead` and writes prompts and
//! results to any `Write`, so the loop runs the same over a terminal or an
//! in-memory buffer.

use crate::error::Result;
use crate::simulator::{ReadSource, Simulator};
use crate::util::{format_bytes, format_duration};
use std::io::{BufRead, Write};

/// Line-oriented menu over a simulator.
pub struct Menu<'a, R, W> {
    sim: &'a Simulator,
    input: R,
    output: W,
    json_stats: bool,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    /// Create a menu reading from `input` and writing to `output`.
    pub fn new(sim: &'a Simulator, input: R, output: W) -> Self {
        Self { sim, input, output, json_stats: false }
    }

    /// Print statistics as JSON instead of text.
    pub fn json_stats(mut self, value: bool) -> Self {
        self.json_stats = value;
        self
    }

    /// Run until the user exits or input ends.
    pub fn run(&mut self) -> Result<()> {
        let report = self.sim.report();
        writeln!(self.output, "Storage Simulator v{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(
            self.output,
            "Disk: {}, Cache: {} blocks",
            format_bytes(report.disk.disk_size_bytes),
            report.disk.cache_capacity
        )?;

        loop {
            self.show_menu()?;
            let line = match self.prompt("> ")? {
                Some(line) => line,
                None => return Ok(()),
            };

            match line.trim().parse::<u32>() {
                Ok(1) => self.write_block()?,
                Ok(2) => self.read_block()?,
                Ok(3) => self.show_stats()?,
                Ok(4) => {
                    writeln!(self.output, "Goodbye!")?;
                    return Ok(());
                }
                Ok(5) => {
                    self.sim.clear_cache();
                    writeln!(self.output, "Cache cleared.")?;
                }
                Ok(6) => {
                    self.sim.reset_stats();
                    writeln!(self.output, "Stats reset.")?;
                }
                _ => writeln!(self.output, "Invalid choice.")?,
            }
        }
    }

    fn show_menu(&mut self) -> Result<()> {
        writeln!(self.output, "[1] Write Block")?;
        writeln!(self.output, "[2] Read Block")?;
        writeln!(self.output, "[3] Show Stats")?;
        writeln!(self.output, "[4] Exit")?;
        writeln!(self.output, "[5] Clear Cache")?;
        writeln!(self.output, "[6] Reset Stats")?;
        Ok(())
    }

    /// Print `label` and read one line without its line ending.
    /// Returns `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Ask for a block ID. Prints the valid range and returns `None` when
    /// the answer is not an addressable block.
    fn prompt_block(&mut self) -> Result<Option<u64>> {
        let line = match self.prompt("Block ID: ")? {
            Some(line) => line,
            None => return Ok(None),
        };

        let store = self.sim.store();
        match line.trim().parse::<u64>() {
            Ok(block) if store.is_valid_block(block) => Ok(Some(block)),
            _ => {
                writeln!(
                    self.output,
                    "Invalid block ID (0-{})",
                    store.total_blocks().saturating_sub(1)
                )?;
                Ok(None)
            }
        }
    }

    fn write_block(&mut self) -> Result<()> {
        let block = match self.prompt_block()? {
            Some(block) => block,
            None => return Ok(()),
        };
        // Input ended before any data: leave the block alone
        let data = match self.prompt("Data: ")? {
            Some(data) => data,
            None => return Ok(()),
        };

        match self.sim.write(block, data.as_bytes()) {
            Ok(outcome) => {
                if outcome.stored < data.len() {
                    writeln!(self.output, "Data truncated to {} bytes.", outcome.stored)?;
                }
                writeln!(self.output, "Written.")?;
            }
            Err(e) => {
                log::warn!("Write of block {} failed: {}", block, e);
                writeln!(self.output, "Write failed.")?;
            }
        }
        Ok(())
    }

    fn read_block(&mut self) -> Result<()> {
        let block = match self.prompt_block()? {
            Some(block) => block,
            None => return Ok(()),
        };

        match self.sim.read(block) {
            Ok(outcome) => {
                let source = match outcome.source {
                    ReadSource::Cache => "cache",
                    ReadSource::Disk => "disk",
                };
                writeln!(self.output, "Data: {}", String::from_utf8_lossy(&outcome.data))?;
                writeln!(
                    self.output,
                    "Served from {} in {}",
                    source,
                    format_duration(outcome.latency)
                )?;
            }
            Err(e) => {
                log::warn!("Read of block {} failed: {}", block, e);
                writeln!(self.output, "Read failed.")?;
            }
        }
        Ok(())
    }

    fn show_stats(&mut self) -> Result<()> {
        let report = self.sim.report();
        if self.json_stats {
            writeln!(self.output, "{}", report.to_json()?)?;
            return Ok(());
        }

        writeln!(
            self.output,
            "Cache: {} hits, {} misses",
            report.cache.hits, report.cache.misses
        )?;
        writeln!(self.output, "Hit rate: {:.1}%", report.cache.hit_ratio())?;
        writeln!(self.output, "Avg latency: {:.1}ms", report.metrics.avg_latency_ms)?;
        writeln!(
            self.output,
            "Cached blocks: {}/{}",
            report.cache.cached_blocks, report.disk.cache_capacity
        )?;
        if report.metrics.latency_improvement() > 0.0 {
            writeln!(
                self.output,
                "Cache hits are {:.1}% faster than disk reads",
                report.metrics.latency_improvement()
            )?;
        }
        Ok(())
    }
}
