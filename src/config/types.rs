use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub governor: GovernorConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// TTL policy for the active environment.
    pub fn ttl_policy(&self) -> &TtlPolicy {
        match self.environment {
            Environment::Production => &self.cache.production,
            Environment::Development => &self.cache.development,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Deployment flavour. Development trades freshness for fewer upstream calls.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::Development => f.write_str("development"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Shared API key sent with every request (override with `REELGATE_API_KEY`)
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Per-request deadline; timeouts fail fast and are never retried
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_language() -> String {
    "en-US".to_string()
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_max_idle_connections() -> usize {
    10
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            language: default_language(),
            timeout_ms: default_timeout_ms(),
            max_idle_connections: default_max_idle_connections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GovernorConfig {
    /// Minimum spacing between dispatches
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Throttling retries allowed before a call fails with `RateLimited`
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_min_interval_ms() -> u64 {
    250
}
fn default_max_attempts() -> u32 {
    2
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_backoff_max_ms() -> u64 {
    2000
}

impl GovernorConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches while requests remain queued
    #[serde(default = "default_batch_yield_ms")]
    pub batch_yield_ms: u64,
}

fn default_batch_size() -> usize {
    5
}
fn default_batch_yield_ms() -> u64 {
    50
}

impl QueueConfig {
    pub fn batch_yield(&self) -> Duration {
        Duration::from_millis(self.batch_yield_ms)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_yield_ms: default_batch_yield_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// How often expired entries are physically removed
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default = "TtlPolicy::production")]
    pub production: TtlPolicy,

    #[serde(default = "TtlPolicy::development")]
    pub development: TtlPolicy,
}

fn default_max_entries() -> usize {
    1000
}
fn default_sweep_interval() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            sweep_interval_secs: default_sweep_interval(),
            production: TtlPolicy::production(),
            development: TtlPolicy::development(),
        }
    }
}

/// Which freshness window a cached response gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheClass {
    List,
    Search,
    Details,
    Suggestions,
}

/// Per-operation time-to-live, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TtlPolicy {
    pub list_secs: u64,
    pub search_secs: u64,
    pub details_secs: u64,
    pub suggestions_secs: u64,
}

impl TtlPolicy {
    pub fn production() -> Self {
        Self {
            list_secs: 30 * 60,
            search_secs: 15 * 60,
            details_secs: 30 * 60,
            suggestions_secs: 10 * 60,
        }
    }

    pub fn development() -> Self {
        Self {
            list_secs: 2 * 60 * 60,
            search_secs: 60 * 60,
            details_secs: 2 * 60 * 60,
            suggestions_secs: 60 * 60,
        }
    }

    pub fn ttl_for(&self, class: CacheClass) -> Duration {
        let secs = match class {
            CacheClass::List => self.list_secs,
            CacheClass::Search => self.search_secs,
            CacheClass::Details => self.details_secs,
            CacheClass::Suggestions => self.suggestions_secs,
        };
        Duration::from_secs(secs)
    }

    pub(crate) fn entries(&self) -> [(&'static str, u64); 4] {
        [
            ("list_secs", self.list_secs),
            ("search_secs", self.search_secs),
            ("details_secs", self.details_secs),
            ("suggestions_secs", self.suggestions_secs),
        ]
    }
}
