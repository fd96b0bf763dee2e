//! Multi-page static extraction.
//!
//! Page count comes from an explicit override, numbered links inside a
//! pagination container, or "Page X of Y" text, in that order. Pages past the
//! first are addressed through a query parameter.

use std::sync::LazyLock;
use std::time::Duration;

use log::{info, warn};
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::Serialize;

use super::static_page::StaticStrategy;
use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::extractors::{element_text, extract_from_document, parse_selector, Cleaner};
use crate::request::{ExtractionRequest, ExtractionResult, ModeUsed};

/// Words that precede "X of Y" page counters.
const PAGE_WORDS: &[&str] = &["page", "pagina", "seite", "página", "ページ"];

static PAGE_OF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*of\s*(\d+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    Markup,
    Text,
    None,
}

/// Result of page-count detection on a first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    pub total_pages: Option<u32>,
    pub source: DetectionSource,
}

impl PaginationInfo {
    const NONE: PaginationInfo = PaginationInfo {
        total_pages: None,
        source: DetectionSource::None,
    };

    /// Detected count, or 1 when nothing was found.
    pub fn pages_or_one(&self) -> u32 {
        self.total_pages.unwrap_or(1).max(1)
    }
}

/// Best-effort page count detection.
pub fn detect_pagination(document: &Html, container_selectors: &[String]) -> PaginationInfo {
    if let Some(total) = detect_from_markup(document, container_selectors) {
        return PaginationInfo {
            total_pages: Some(total),
            source: DetectionSource::Markup,
        };
    }

    if let Some(total) = detect_from_text(document) {
        return PaginationInfo {
            total_pages: Some(total),
            source: DetectionSource::Text,
        };
    }

    PaginationInfo::NONE
}

/// Largest purely numeric link or list item inside the first matching container.
fn detect_from_markup(document: &Html, container_selectors: &[String]) -> Option<u32> {
    let inner = parse_selector("a, li").ok()?;

    for selector_str in container_selectors {
        let Ok(container) = parse_selector(selector_str) else {
            warn!("Ignoring pagination selector `{selector_str}`");
            continue;
        };

        let max = document
            .select(&container)
            .flat_map(|c| c.select(&inner))
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()))
            .filter_map(|text| text.parse::<u32>().ok())
            .max();

        if let Some(max) = max.filter(|&n| n > 0) {
            return Some(max);
        }
    }

    None
}

/// Y from the first "X of Y" in an element whose text mentions a page word.
///
/// Text is joined across child elements, so `Page <b>1</b> of <b>7</b>` is
/// seen whole. The deepest such element wins, keeping an unrelated "3 of 5"
/// elsewhere in the page out of the match.
fn detect_from_text(document: &Html) -> Option<u32> {
    let mut best: Option<(usize, u32)> = None;

    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        let text = element_text(&element);
        let lower = text.to_lowercase();
        if !PAGE_WORDS.iter().any(|word| lower.contains(word)) {
            continue;
        }
        let Some(total) = page_of_total(&text) else {
            continue;
        };

        let depth = node.ancestors().count();
        match best {
            Some((best_depth, _)) if best_depth >= depth => {}
            _ => best = Some((depth, total)),
        }
    }

    best.map(|(_, total)| total)
}

fn page_of_total(text: &str) -> Option<u32> {
    PAGE_OF_RE
        .captures(text)
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|&n| n > 0)
}

/// URL for page `page` using the `page` query parameter.
pub fn build_page_url(base_url: &str, page: u32) -> String {
    build_page_url_with_param(base_url, "page", page)
}

/// Rewrite an existing `param=` value, or append `param=N` to the query.
pub fn build_page_url_with_param(base_url: &str, param: &str, page: u32) -> String {
    let (without_fragment, fragment) = match base_url.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (base_url, None),
    };

    let existing = Regex::new(&format!(r"([?&]){}=[^&]*", regex::escape(param)))
        .ok()
        .filter(|re| re.is_match(without_fragment));

    let mut url = match existing {
        Some(re) => re
            .replace(without_fragment, format!("${{1}}{param}={page}"))
            .into_owned(),
        None if without_fragment.ends_with('?') || without_fragment.ends_with('&') => {
            format!("{without_fragment}{param}={page}")
        }
        None if without_fragment.contains('?') => format!("{without_fragment}&{param}={page}"),
        None => format!("{without_fragment}?{param}={page}"),
    };

    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}

/// Walks numbered pages with the static strategy and cleans the union.
pub struct PaginationWalker<'a> {
    strategy: &'a StaticStrategy,
    cleaner: &'a Cleaner,
    container_selectors: &'a [String],
    page_delay: Duration,
    cancel: CancelFlag,
}

impl<'a> PaginationWalker<'a> {
    pub fn new(
        strategy: &'a StaticStrategy,
        cleaner: &'a Cleaner,
        container_selectors: &'a [String],
    ) -> Self {
        Self {
            strategy,
            cleaner,
            container_selectors,
            page_delay: Duration::ZERO,
            cancel: CancelFlag::default(),
        }
    }

    /// Pause between page requests.
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch page 1 at the request URL as given, then pages 2..=N.
    ///
    /// Failures past page 1 are logged and skipped. A page 1 failure is only
    /// fatal when the count has to be detected from it; with an explicit
    /// `pages` it counts as an empty page.
    pub async fn run(&self, req: &ExtractionRequest) -> Result<ExtractionResult> {
        if !req.delay.is_zero() {
            tokio::time::sleep(req.delay).await;
        }

        info!("[PAGINATION] Analyzing {}", req.url);
        let selector = parse_selector(&req.selector)?;
        let first_html = match (self.strategy.fetch(&req.url, req.timeout).await, req.pages) {
            (Ok(html), _) => Some(html),
            (Err(e), Some(_)) => {
                warn!("[PAGINATION] Skipping page 1: {e}");
                None
            }
            (Err(e), None) => return Err(e),
        };

        let (mut items, total_pages) = match first_html {
            Some(html) => {
                let document = Html::parse_document(&html);
                let total_pages = self.page_count(&document, req);
                let items = extract_from_document(
                    &document,
                    &selector,
                    &req.attribute,
                    req.contains.as_deref(),
                );
                (items, total_pages)
            }
            None => (Vec::new(), req.pages.unwrap_or(1)),
        };
        info!("[PAGINATION] Page 1: {} items", items.len());

        for page in 2..=total_pages {
            self.cancel.check()?;
            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let page_url = build_page_url_with_param(&req.url, &req.page_param, page);
            info!("[PAGINATION] Page {page}/{total_pages}: {page_url}");

            match self.strategy.fetch(&page_url, req.timeout).await {
                Ok(html) => {
                    let document = Html::parse_document(&html);
                    let page_items = extract_from_document(
                        &document,
                        &selector,
                        &req.attribute,
                        req.contains.as_deref(),
                    );
                    info!("[PAGINATION] Page {page}: {} items", page_items.len());
                    items.extend(page_items);
                }
                Err(e) => warn!("[PAGINATION] Skipping page {page}: {e}"),
            }
        }

        let raw_count = items.len();
        let items = self.cleaner.clean(items);
        info!(
            "[PAGINATION] {} unique items across {total_pages} pages ({raw_count} raw)",
            items.len()
        );

        Ok(ExtractionResult::new(
            items,
            ModeUsed::SimpleMultiPage,
            total_pages,
        ))
    }

    fn page_count(&self, document: &Html, req: &ExtractionRequest) -> u32 {
        if let Some(explicit) = req.pages {
            info!("[PAGINATION] Using explicit page count {explicit}");
            return explicit;
        }

        let info = detect_pagination(document, self.container_selectors);
        let detected = info.pages_or_one();
        if detected > req.max_pages {
            warn!(
                "[PAGINATION] Detected {detected} pages ({:?}); capping at {}",
                info.source, req.max_pages
            );
            return req.max_pages;
        }
        info!("[PAGINATION] Detected {detected} pages ({:?})", info.source);
        detected
    }
}
