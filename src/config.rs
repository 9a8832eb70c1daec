// src/config.rs
//! Process configuration: built-in defaults, then an optional TOML file,
//! then command-line flags / environment. Fixed for the life of the process.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::cache::RefreshConfig;
use crate::hn::client::DEFAULT_BASE_URL;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_NUM_STORIES: usize = 30;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "quiet-hn", version, about = "Serve a quiet Hacker News front page")]
pub struct Cli {
    /// The port to start the web server on [default: 3000]
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// The number of top stories to display [default: 30]
    #[arg(long = "num-stories", alias = "num_stories", env = "NUM_STORIES")]
    pub num_stories: Option<usize>,

    /// Optional TOML config file
    #[arg(long, env = "QUIET_HN_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub refresh: RefreshSection,
    pub source: SourceSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefreshSection {
    pub num_stories: Option<usize>,
    pub chunk_size: Option<usize>,
    pub completion_timeout_ms: Option<u64>,
    pub refresh_interval_secs: Option<u64>,
    pub retry_initial_ms: Option<u64>,
    pub retry_max_secs: Option<u64>,
    pub invalidate_after_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSection {
    pub base_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    pub refresh: RefreshConfig,
    pub base_url: String,
    pub request_timeout: Duration,
    /// Clear the served snapshot on this period; `None` disables it.
    pub invalidate_after: Option<Duration>,
}

impl Settings {
    /// Resolve settings for `cli`, reading the config file it points at.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => load_file(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, cli)
    }

    pub fn resolve(file: FileConfig, cli: &Cli) -> Result<Self> {
        let defaults = RefreshConfig::default();
        let r = &file.refresh;

        let target = cli
            .num_stories
            .or(r.num_stories)
            .unwrap_or(DEFAULT_NUM_STORIES);
        let refresh = RefreshConfig {
            target,
            chunk_size: r.chunk_size.unwrap_or(target),
            completion_timeout: r
                .completion_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.completion_timeout),
            refresh_interval: r
                .refresh_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_interval),
            retry_initial: r
                .retry_initial_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_initial),
            retry_max: r
                .retry_max_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_max),
        };

        let settings = Self {
            port: cli.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            refresh,
            base_url: file
                .source
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: Duration::from_millis(file.source.request_timeout_ms.unwrap_or(10_000)),
            invalidate_after: r
                .invalidate_after_secs
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.refresh.target == 0 {
            bail!("num_stories must be at least 1");
        }
        if self.refresh.chunk_size == 0 {
            bail!("chunk_size must be at least 1");
        }
        if self.refresh.completion_timeout.is_zero() {
            bail!("completion_timeout_ms must be greater than 0");
        }
        if self.request_timeout.is_zero() {
            bail!("request_timeout_ms must be greater than 0");
        }
        if self.refresh.retry_initial > self.refresh.retry_max {
            bail!("retry_initial_ms must not exceed retry_max_secs");
        }
        url::Url::parse(&self.base_url)
            .with_context(|| format!("invalid source base_url {:?}", self.base_url))?;
        Ok(())
    }
}

pub fn load_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    parse_toml(&content).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse_toml(s: &str) -> Result<FileConfig> {
    Ok(toml::from_str(s)?)
}
