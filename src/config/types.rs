use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for Detail-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub harvest: HarvestConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub paths: PathsConfig,
}

/// Fetch pipeline behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Minimum interval between dispatches to the same host (seconds)
    #[serde(rename = "delay-secs")]
    pub delay_secs: f64,

    /// Concurrency ceiling; also the batch size
    pub concurrency: usize,

    /// Timeout for a single page retrieval (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: f64,

    /// Extra attempts per locator after a transport failure
    #[serde(rename = "max-retries", default)]
    pub max_retries: u32,
}

impl HarvestConfig {
    /// Per-host dispatch interval as a Duration
    pub fn delay(&self) -> Duration {
        seconds(self.delay_secs)
    }

    /// Per-fetch timeout as a Duration
    pub fn fetch_timeout(&self) -> Duration {
        seconds(self.fetch_timeout_secs)
    }
}

/// Negative and NaN read as zero; values past `Duration::MAX` saturate
fn seconds(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the harvester
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the harvester
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the harvester
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for harvester-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Input and checkpoint file locations
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Locator list produced by the listing crawl
    pub input: PathBuf,

    /// Checkpoint rewritten after every batch
    pub partial: PathBuf,

    /// Output written once at the end of the run
    #[serde(rename = "final")]
    pub final_output: PathBuf,

    /// Prior results used for dedup; defaults to `partial`
    #[serde(default)]
    pub prior: Option<PathBuf>,
}

impl PathsConfig {
    /// Returns the prior-checkpoint path, falling back to the partial target
    pub fn prior_path(&self) -> &Path {
        self.prior.as_deref().unwrap_or(&self.partial)
    }
}
