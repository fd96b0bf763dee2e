//! Single-request HTTP extraction.

use std::time::Duration;

use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};
use reqwest::Client;
use scraper::Html;
use serde::Serialize;

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::extractors::{extract_from_document, first_text, parse_selector, Cleaner};
use crate::request::{ExtractionRequest, ExtractionResult, ModeUsed};

/// What a page offers, for deciding on a selector when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageDiagnostics {
    pub title: Option<String>,
    pub element_counts: Vec<(String, usize)>,
    pub sample_headings: Vec<String>,
}

const DIAGNOSTIC_TAGS: &[&str] = &["h1", "h2", "h3", "div", "span", "a"];

/// Fetch-and-parse extraction over a shared HTTP client.
#[derive(Debug, Clone)]
pub struct StaticStrategy {
    client: Client,
}

impl StaticStrategy {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(&config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| Error::InvalidRequest(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// GET `url` and return the body. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<String> {
        info!("Downloading {url}");

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| Error::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| Error::Network {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch `req.url` (after `req.delay`) and extract matches in document order.
    ///
    /// Zero matches is an empty result, not an error. No deduplication.
    pub async fn run(&self, req: &ExtractionRequest) -> Result<ExtractionResult> {
        if !req.delay.is_zero() {
            info!("Waiting {:?} before fetching", req.delay);
            tokio::time::sleep(req.delay).await;
        }

        let html = self.fetch(&req.url, req.timeout).await?;
        let items = extract_page(&html, req)?;
        Ok(ExtractionResult::new(items, ModeUsed::Simple, 1))
    }

    /// Try `req.selector`, then each fallback, on one fetch of the page.
    ///
    /// Output is cleaned; the first selector with surviving items wins and is
    /// returned alongside the result.
    pub async fn run_with_fallbacks(
        &self,
        req: &ExtractionRequest,
        fallbacks: &[String],
        cleaner: &Cleaner,
    ) -> Result<(String, ExtractionResult)> {
        if !req.delay.is_zero() {
            tokio::time::sleep(req.delay).await;
        }
        let html = self.fetch(&req.url, req.timeout).await?;
        let document = Html::parse_document(&html);

        let candidates = std::iter::once(req.selector.as_str())
            .chain(fallbacks.iter().map(String::as_str));

        for selector_str in candidates {
            let selector = match parse_selector(selector_str) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Skipping fallback: {e}");
                    continue;
                }
            };

            let raw = extract_from_document(
                &document,
                &selector,
                &req.attribute,
                req.contains.as_deref(),
            );
            let cleaned = cleaner.clean(raw);
            debug!("Selector `{selector_str}` kept {} items", cleaned.len());

            if !cleaned.is_empty() {
                info!("Selector `{selector_str}` produced {} items", cleaned.len());
                return Ok((
                    selector_str.to_string(),
                    ExtractionResult::new(cleaned, ModeUsed::Simple, 1),
                ));
            }
        }

        warn!("No selector produced items on {}", req.url);
        Ok((req.selector.clone(), ExtractionResult::empty(ModeUsed::Simple)))
    }

    /// Re-run with growing pre-fetch delays: attempt `k` waits `k * base_delay`.
    ///
    /// Returns the first non-empty result, or the last outcome.
    pub async fn run_with_retry(
        &self,
        req: &ExtractionRequest,
        retries: u32,
        base_delay: Duration,
    ) -> Result<ExtractionResult> {
        let mut last = Ok(ExtractionResult::empty(ModeUsed::Simple));

        for attempt in 0..=retries {
            info!("Attempt {}/{}", attempt + 1, retries + 1);
            let delay = base_delay * attempt;
            last = self.run(&req.with_delay(delay)).await;

            match &last {
                Ok(result) if !result.is_empty() => break,
                Ok(_) => debug!("Attempt {} found nothing", attempt + 1),
                Err(e) => warn!("Attempt {} failed: {e}", attempt + 1),
            }
        }

        last
    }

    /// Summarize what the page contains.
    pub async fn diagnose(&self, url: &str, timeout: Duration) -> Result<PageDiagnostics> {
        let html = self.fetch(url, timeout).await?;
        Ok(diagnose_html(&html))
    }
}

/// Extract `req`'s selector from an already fetched page.
pub fn extract_page(html: &str, req: &ExtractionRequest) -> Result<Vec<String>> {
    let selector = parse_selector(&req.selector)?;
    let document = Html::parse_document(html);

    if let Some(title) = first_text(&document, "title") {
        debug!("Page title: {title}");
    }

    let items = extract_from_document(&document, &selector, &req.attribute, req.contains.as_deref());
    if items.is_empty() {
        info!("No elements found with selector `{}`", req.selector);
    } else {
        info!("Found {} items matching `{}`", items.len(), req.selector);
    }
    Ok(items)
}

pub fn diagnose_html(html: &str) -> PageDiagnostics {
    let document = Html::parse_document(html);

    let element_counts = DIAGNOSTIC_TAGS
        .iter()
        .filter_map(|tag| {
            let selector = parse_selector(tag).ok()?;
            Some((tag.to_string(), document.select(&selector).count()))
        })
        .collect();

    let sample_headings = parse_selector("h2")
        .map(|sel| {
            extract_from_document(&document, &sel, &Default::default(), None)
                .into_iter()
                .take(5)
                .collect()
        })
        .unwrap_or_default();

    PageDiagnostics {
        title: first_text(&document, "title"),
        element_counts,
        sample_headings,
    }
}

fn header_value(raw: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(raw)
        .map_err(|e| Error::InvalidRequest(format!("invalid header value `{raw}`: {e}")))
}
