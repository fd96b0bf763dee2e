//! Runtime configuration: HTTP headers, browser timings and the heuristic
//! selector lists.
//!
//! Everything has a default; a JSON file can override any subset of keys.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extractors::{Cleaner, DEFAULT_UI_DENYLIST};

/// Controls tried, in order, when looking for a "load more" or "next" control.
pub const DEFAULT_LOAD_MORE_SELECTORS: &[&str] = &[
    "button[class*=\"load\"]",
    "button[class*=\"more\"]",
    "a[class*=\"load\"]",
    "a[class*=\"more\"]",
    ".load-more",
    ".show-more",
    "[data-load-more]",
    ".btn[class*=\"more\"]",
    ".next",
    ".pagination-next",
    "a[rel=\"next\"]",
];

/// Containers that usually hold numbered page links.
pub const DEFAULT_PAGINATION_SELECTORS: &[&str] = &[
    ".pagination",
    ".pager",
    ".page-numbers",
    "[class*=\"pagination\"]",
    "[class*=\"pager\"]",
    ".pagination-container",
];

/// Selectors tried after the requested one in exhibition-style runs.
pub const DEFAULT_FALLBACK_SELECTORS: &[&str] = &[
    ".m-exhibitors-list_list_items_item_header_title",
    "h2[class*=\"title\"]",
    ".js-librarylink-entry",
    "[class*=\"exhibitor\"]",
    "[class*=\"company\"]",
    "h2, h3, h4",
];

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP settings for the static strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    /// Pause between pages of a paginated walk
    pub page_delay_ms: u64,
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            page_delay_ms: 1000,
            max_redirects: 10,
        }
    }
}

impl HttpConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// WebDriver session and timing settings for the browser strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// WebDriver server, e.g. a running chromedriver
    pub webdriver_url: String,
    pub headless: bool,
    pub window_size: (u32, u32),
    pub user_agent: String,
    /// Wait after navigation for initial scripts
    pub settle_delay_ms: u64,
    /// Wait after each load-more click
    pub click_settle_ms: u64,
    /// Wait after each scroll
    pub scroll_pause_ms: u64,
    /// Unchanged measurements before scrolling stops
    pub scroll_stable_rounds: u32,
    /// Clicks without new elements before load-more stops
    pub no_progress_rounds: u32,
    pub poll_interval_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            window_size: (1920, 1080),
            user_agent: BROWSER_USER_AGENT.to_string(),
            settle_delay_ms: 3000,
            click_settle_ms: 4000,
            scroll_pause_ms: 3000,
            scroll_stable_rounds: 3,
            no_progress_rounds: 2,
            poll_interval_ms: 500,
        }
    }
}

impl BrowserConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// All waits set to zero. Used by tests driving a scripted session.
    pub fn without_delays(mut self) -> Self {
        self.settle_delay_ms = 0;
        self.click_settle_ms = 0;
        self.scroll_pause_ms = 0;
        self
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub http: HttpConfig,
    pub browser: BrowserConfig,
    pub load_more_selectors: Vec<String>,
    pub pagination_selectors: Vec<String>,
    pub fallback_selectors: Vec<String>,
    /// Replaces the built-in UI denylist
    pub ui_denylist: Vec<String>,
    /// Added on top of `ui_denylist`
    pub extra_ui_denylist: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            browser: BrowserConfig::default(),
            load_more_selectors: to_strings(DEFAULT_LOAD_MORE_SELECTORS),
            pagination_selectors: to_strings(DEFAULT_PAGINATION_SELECTORS),
            fallback_selectors: to_strings(DEFAULT_FALLBACK_SELECTORS),
            ui_denylist: to_strings(DEFAULT_UI_DENYLIST),
            extra_ui_denylist: Vec::new(),
        }
    }
}

impl ScraperConfig {
    /// Read a JSON config file; keys missing from the file keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidRequest(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::InvalidRequest(format!("invalid config: {e}")))
    }

    /// Cleaner for the configured denylist plus its extra phrases.
    pub fn cleaner(&self) -> Cleaner {
        Cleaner::new(&self.ui_denylist).extend(&self.extra_ui_denylist)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
