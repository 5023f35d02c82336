use serde::Deserialize;

/// Main configuration structure for Octo-Trawl
///
/// Every field carries a default so a config file is optional; command-line
/// flags override whatever the file (or the defaults) provided.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub governor: GovernorConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlerConfig {
    /// Seed URL for the crawl (the collection-index root)
    #[serde(rename = "seed-url", default = "default_seed_url")]
    pub seed_url: String,

    /// User agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: default_seed_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Rate governor tuning
///
/// The defaults mirror the throttling the listing tolerates well: a short
/// starting delay that adapts upward as observed latency grows.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GovernorConfig {
    /// Initial inter-request delay in milliseconds; also the lower clamp
    #[serde(rename = "start-delay-ms", default = "default_start_delay_ms")]
    pub start_delay_ms: u64,

    /// Upper clamp for the adaptive delay in milliseconds
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Average number of in-flight requests the delay converges toward
    #[serde(rename = "target-concurrency", default = "default_target_concurrency")]
    pub target_concurrency: f64,

    /// Hard cap on simultaneous in-flight fetches
    #[serde(rename = "max-in-flight", default = "default_max_in_flight")]
    pub max_in_flight: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: default_start_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            target_concurrency: default_target_concurrency(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

/// Output stream configuration, one CSV path per record kind
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Path to the collections CSV file
    #[serde(rename = "collections-path", default = "default_collections_path")]
    pub collections_path: String,

    /// Path to the repositories CSV file
    #[serde(rename = "repositories-path", default = "default_repositories_path")]
    pub repositories_path: String,

    /// Path to the files CSV file
    #[serde(rename = "files-path", default = "default_files_path")]
    pub files_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            collections_path: default_collections_path(),
            repositories_path: default_repositories_path(),
            files_path: default_files_path(),
        }
    }
}

fn default_seed_url() -> String {
    "https://github.com/collections".to_string()
}

fn default_user_agent() -> String {
    format!("octo-trawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_start_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_target_concurrency() -> f64 {
    2.0
}

fn default_max_in_flight() -> u32 {
    8
}

fn default_collections_path() -> String {
    "./results/collections.csv".to_string()
}

fn default_repositories_path() -> String {
    "./results/repositories.csv".to_string()
}

fn default_files_path() -> String {
    "./results/files.csv".to_string()
}
