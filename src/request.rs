//! Extraction requests and results.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extractors::Attribute;

/// Which strategy the caller asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Static first, browser when static finds nothing
    #[default]
    Auto,
    Simple,
    Selenium,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Mode::Auto),
            "simple" | "static" => Ok(Mode::Simple),
            "selenium" | "browser" | "dynamic" => Ok(Mode::Selenium),
            other => Err(Error::InvalidRequest(format!("unknown mode `{other}`"))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Auto => "auto",
            Mode::Simple => "simple",
            Mode::Selenium => "selenium",
        })
    }
}

/// The strategy that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModeUsed {
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "simple (multi-page)")]
    SimpleMultiPage,
    #[serde(rename = "selenium")]
    Selenium,
}

impl fmt::Display for ModeUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModeUsed::Simple => "simple",
            ModeUsed::SimpleMultiPage => "simple (multi-page)",
            ModeUsed::Selenium => "selenium",
        })
    }
}

/// A validated extraction request. Build one with [`ExtractionRequest::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub url: String,
    pub selector: String,
    pub attribute: Attribute,
    pub contains: Option<String>,
    pub timeout: Duration,
    pub mode: Mode,
    pub paginate: bool,
    /// Forces the page count, bypassing detection
    pub pages: Option<u32>,
    pub page_param: String,
    /// Wait before the static fetch
    pub delay: Duration,
    pub max_pages: u32,
    pub max_scrolls: u32,
    pub max_load_more_clicks: u32,
}

impl ExtractionRequest {
    pub fn builder(url: impl Into<String>, selector: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(url, selector)
    }

    /// Copy of this request with another pre-fetch delay.
    pub fn with_delay(&self, delay: Duration) -> Self {
        Self {
            delay,
            ..self.clone()
        }
    }
}

/// Builder for [`ExtractionRequest`]; `build` validates.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    url: String,
    selector: String,
    attribute: Attribute,
    contains: Option<String>,
    timeout: Duration,
    mode: Mode,
    paginate: bool,
    pages: Option<u32>,
    page_param: String,
    delay: Duration,
    max_pages: u32,
    max_scrolls: u32,
    max_load_more_clicks: u32,
}

impl RequestBuilder {
    fn new(url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selector: selector.into(),
            attribute: Attribute::Text,
            contains: None,
            timeout: Duration::from_secs(30),
            mode: Mode::Auto,
            paginate: false,
            pages: None,
            page_param: "page".to_string(),
            delay: Duration::ZERO,
            max_pages: 10,
            max_scrolls: 20,
            max_load_more_clicks: 20,
        }
    }

    pub fn attribute(mut self, attribute: impl Into<Attribute>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Keep only values containing `needle`. Blank needles are ignored.
    pub fn contains(mut self, needle: Option<String>) -> Self {
        self.contains = needle.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    /// Explicit page count; implies pagination.
    pub fn pages(mut self, pages: Option<u32>) -> Self {
        self.pages = pages;
        if pages.is_some() {
            self.paginate = true;
        }
        self
    }

    pub fn page_param(mut self, param: impl Into<String>) -> Self {
        self.page_param = param.into();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn max_scrolls(mut self, max_scrolls: u32) -> Self {
        self.max_scrolls = max_scrolls;
        self
    }

    pub fn max_load_more_clicks(mut self, clicks: u32) -> Self {
        self.max_load_more_clicks = clicks;
        self
    }

    pub fn build(self) -> Result<ExtractionRequest> {
        let url = normalize_url(&self.url)?;

        let selector = self.selector.trim().to_string();
        if selector.is_empty() {
            return Err(Error::InvalidRequest("CSS selector is empty".to_string()));
        }

        let page_param = self.page_param.trim().to_string();
        let plain_key = page_param
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if page_param.is_empty() || !plain_key {
            return Err(Error::InvalidRequest(format!(
                "page parameter `{}` is not a plain query key",
                self.page_param
            )));
        }

        if self.timeout.is_zero() {
            return Err(Error::InvalidRequest("timeout must be positive".to_string()));
        }

        if self.pages == Some(0) {
            return Err(Error::InvalidRequest("page count must be at least 1".to_string()));
        }

        Ok(ExtractionRequest {
            url,
            selector,
            attribute: self.attribute,
            contains: self.contains,
            timeout: self.timeout,
            mode: self.mode,
            paginate: self.paginate,
            pages: self.pages,
            page_param,
            delay: self.delay,
            max_pages: self.max_pages.max(1),
            max_scrolls: self.max_scrolls,
            max_load_more_clicks: self.max_load_more_clicks,
        })
    }
}

/// Trim, prepend `https://` when no scheme is present, and reject anything but http(s).
pub fn normalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidRequest("URL is empty".to_string()));
    }

    let parsed = match url::Url::parse(trimmed) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => parse_with_https(trimmed)?,
        Err(e) => return Err(Error::InvalidRequest(format!("URL `{trimmed}` is invalid: {e}"))),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        // `example.com:8080/list` parses with scheme `example.com`
        _ if !trimmed.contains("://") => return Ok(parse_with_https(trimmed)?.to_string()),
        other => {
            return Err(Error::InvalidRequest(format!(
                "URL `{trimmed}` has unsupported scheme `{other}`"
            )))
        }
    }

    if parsed.host_str().is_none() {
        return Err(Error::InvalidRequest(format!("URL `{trimmed}` has no host")));
    }
    Ok(parsed.to_string())
}

fn parse_with_https(raw: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(&format!("https://{raw}"))
        .map_err(|e| Error::InvalidRequest(format!("URL `{raw}` is invalid: {e}")))?;
    if parsed.host_str().is_none() {
        return Err(Error::InvalidRequest(format!("URL `{raw}` has no host")));
    }
    Ok(parsed)
}

/// Items collected by one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub items: Vec<String>,
    pub mode_used: ModeUsed,
    pub page_count: u32,
}

impl ExtractionResult {
    pub fn new(items: Vec<String>, mode_used: ModeUsed, page_count: u32) -> Self {
        Self {
            items,
            mode_used,
            page_count,
        }
    }

    pub fn empty(mode_used: ModeUsed) -> Self {
        Self::new(Vec::new(), mode_used, 1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
