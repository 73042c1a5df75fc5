use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sitesift
///
/// Every section is optional in the TOML file; missing keys fall back to the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub dynamic: DynamicConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Depth at which expansion stops (pages at this depth are still fetched)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of units fetching or extracting at the same time
    #[serde(rename = "max-concurrent-pages")]
    pub max_concurrent_pages: u32,

    /// Attempts per URL before giving up
    #[serde(rename = "retry-limit")]
    pub retry_limit: u32,

    /// Base delay for exponential backoff (milliseconds)
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay (milliseconds)
    #[serde(rename = "backoff-max-ms")]
    pub backoff_max_ms: u64,

    /// Timeout for a single fetch attempt (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Worker threads of the runtime built by `crawl_blocking`
    #[serde(rename = "worker-threads")]
    pub worker_threads: usize,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_concurrent_pages: 10,
            retry_limit: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 8000,
            request_timeout_secs: 10,
            worker_threads: 10,
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

impl UserAgentConfig {
    /// Formats the header value as `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Sitesift".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/sitesift".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

/// Headless-browser fallback for script-rendered pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DynamicConfig {
    /// Route detected pages through the browser instead of plain HTTP
    pub enabled: bool,

    /// Chromium/Chrome executable
    #[serde(rename = "browser-path")]
    pub browser_path: String,

    /// Browser processes allowed at once, independent of `max-concurrent-pages`
    #[serde(rename = "max-concurrent-renders")]
    pub max_concurrent_renders: u32,

    /// Timeout for one render (seconds)
    #[serde(rename = "render-timeout-secs")]
    pub render_timeout_secs: u64,

    /// Substrings of a URL that mark it as script-rendered
    #[serde(rename = "url-markers")]
    pub url_markers: Vec<String>,

    /// Host patterns (e.g. "*.vercel.app") that mark a URL as script-rendered
    #[serde(rename = "host-patterns")]
    pub host_patterns: Vec<String>,
}

impl DynamicConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}

impl Default for DynamicConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            browser_path: "chromium".to_string(),
            max_concurrent_renders: 2,
            render_timeout_secs: 30,
            url_markers: vec!["dynamic".to_string(), "javascript".to_string()],
            host_patterns: Vec::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite content store
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown export of the content set
    #[serde(rename = "export-path")]
    pub export_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./sitesift.db".to_string(),
            export_path: "./sitesift-contents.md".to_string(),
        }
    }
}
