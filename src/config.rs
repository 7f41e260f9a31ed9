use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

use crate::crawler::{CrawlOptions, FailurePolicy};
use crate::date::{CutoffPolicy, KST_OFFSET_HOURS};
use crate::sources::Strategy;

pub const DEFAULT_BASE_URL: &str = "https://ridibooks.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Merged title records.
    #[default]
    Json,
    /// Post drafts for the publishing side.
    Posts,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "newshelf", about = "Collects the comics released today on the storefront")]
pub struct CrawlConfig {
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "NEWSHELF_BASE_URL")]
    pub base_url: String,

    /// Pause after every request.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, env = "NEWSHELF_THROTTLE")]
    pub throttle: bool,

    #[arg(long, default_value = "1000", env = "NEWSHELF_THROTTLE_MS")]
    pub throttle_ms: u64,

    #[arg(long, default_value = "15000", env = "NEWSHELF_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Only this many listing entries are ever checked.
    #[arg(long, default_value = "30", env = "NEWSHELF_MAX_CANDIDATES")]
    pub max_candidates: usize,

    #[arg(long, default_value_t = KST_OFFSET_HOURS, env = "NEWSHELF_UTC_OFFSET_HOURS", allow_hyphen_values = true)]
    pub utc_offset_hours: i32,

    #[arg(long, value_enum, default_value_t = CutoffPolicy::OnOrAfter, env = "NEWSHELF_CUTOFF")]
    pub cutoff: CutoffPolicy,

    #[arg(long, value_enum, default_value_t = FailurePolicy::Abort, env = "NEWSHELF_ON_ERROR")]
    pub on_error: FailurePolicy,

    #[arg(long, value_enum, default_value_t = Strategy::Auto, env = "NEWSHELF_STRATEGY")]
    pub strategy: Strategy,

    /// Target day as YYYY-MM-DD; defaults to today in the configured offset.
    #[arg(long, env = "NEWSHELF_DATE")]
    pub date: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json, env = "NEWSHELF_FORMAT")]
    pub format: OutputFormat,
}

impl CrawlConfig {
    pub fn throttle_delay(&self) -> Option<Duration> {
        self.throttle.then(|| Duration::from_millis(self.throttle_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            max_candidates: self.max_candidates,
            utc_offset_hours: self.utc_offset_hours,
            cutoff: self.cutoff,
            on_error: self.on_error,
            strategy: self.strategy,
        }
    }
}
