//! Command-line and environment configuration

use crate::message::DEFAULT_HISTORY;
use crate::render::RenderOptions;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Live terminal view of a remote memory allocation simulator
#[derive(Debug, Clone, Parser)]
#[command(name = "memtty", version, about)]
pub struct Config {
    /// Base URL of the allocation authority
    #[arg(long, env = "MEMTTY_URL", default_value = "http://127.0.0.1:5000")]
    pub url: String,

    /// Deadline for every request, in milliseconds
    #[arg(long, env = "MEMTTY_TIMEOUT_MS", default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Background refresh interval in milliseconds (0 disables polling)
    #[arg(long, env = "MEMTTY_POLL_MS", default_value_t = 2000)]
    pub poll_ms: u64,

    /// File that receives log output while the TUI owns the terminal
    #[arg(long, env = "MEMTTY_LOG_FILE", default_value = "memtty.log")]
    pub log_file: PathBuf,

    /// Hide the base address column
    #[arg(long)]
    pub hide_base: bool,

    /// Show the limit (last address) column
    #[arg(long)]
    pub show_limit: bool,

    /// Unit label appended to sizes
    #[arg(long, default_value = "KB")]
    pub unit: String,

    /// Number of messages kept in the message log
    #[arg(long, default_value_t = DEFAULT_HISTORY)]
    pub history: usize,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_ms > 0).then(|| Duration::from_millis(self.poll_ms))
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            show_base: !self.hide_base,
            show_limit: self.show_limit,
            unit: self.unit.clone(),
        }
    }
}
