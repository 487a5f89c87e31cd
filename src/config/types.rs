use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Lead Harvester
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub browser: BrowserConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub places: PlacesConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of breadth-first levels to visit, the root page included
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Crawl attempts per worker before reporting an error
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Timeout for a single static page GET (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Timeout for the site-type detection request (seconds)
    #[serde(rename = "detect-timeout-secs")]
    pub detect_timeout_secs: u64,

    /// Hard wall-clock budget for one site's worker process (seconds)
    #[serde(rename = "worker-timeout-secs")]
    pub worker_timeout_secs: u64,

    /// Directory for snapshot files; empty means the OS temp dir
    #[serde(rename = "snapshot-dir")]
    pub snapshot_dir: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_retries: 5,
            request_timeout_secs: 10,
            detect_timeout_secs: 15,
            worker_timeout_secs: 100,
            snapshot_dir: String::new(),
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn detect_timeout(&self) -> Duration {
        Duration::from_secs(self.detect_timeout_secs)
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }

    /// Resolves the directory snapshot files are written to
    pub fn snapshot_dir(&self) -> PathBuf {
        if self.snapshot_dir.is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.snapshot_dir)
        }
    }
}

/// Headless browser configuration for the dynamic crawler
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run Chromium without a window
    pub headless: bool,

    /// Explicit Chromium executable; auto-detected when absent
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<String>,

    /// Upper bound for a navigation to reach its initial DOM (milliseconds)
    #[serde(rename = "navigation-timeout-ms")]
    pub navigation_timeout_ms: u64,

    /// Upper bound for `document.readyState` to leave "loading" (milliseconds)
    #[serde(rename = "dom-timeout-ms")]
    pub dom_timeout_ms: u64,

    /// Upper bound for network quiescence before the grace delay kicks in (milliseconds)
    #[serde(rename = "idle-timeout-ms")]
    pub idle_timeout_ms: u64,

    /// Fixed settle delay used when the network never goes quiet (milliseconds)
    #[serde(rename = "grace-delay-ms")]
    pub grace_delay_ms: u64,

    /// Cap on anchors scanned outside structural containers
    #[serde(rename = "max-anchors")]
    pub max_anchors: usize,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            navigation_timeout_ms: 25_000,
            dom_timeout_ms: 15_000,
            idle_timeout_ms: 5_000,
            grace_delay_ms: 2_000,
            max_anchors: 100,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "LeadHarvester".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "bot@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Places directory API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// Text search endpoint
    pub endpoint: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Whole-request timeout for each search, in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://places.googleapis.com/v1/places:searchText".to_string(),
            api_key_env: "GOOGLE_PLACES_API".to_string(),
            timeout_secs: 30,
        }
    }
}

impl PlacesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Email relevance filter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Whether harvested emails are passed through the filter at all
    pub enabled: bool,

    /// Chat completion endpoint
    pub endpoint: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Whole-request timeout for each completion, in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            model: "deepseek/deepseek-v3.2-exp".to_string(),
            timeout_secs: 60,
        }
    }
}

impl FilterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite lead-result database
    #[serde(rename = "database-path")]
    pub database_path: Option<String>,

    /// Path to the markdown report file
    #[serde(rename = "report-path")]
    pub report_path: Option<String>,
}
