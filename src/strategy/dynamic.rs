//! Browser-driven extraction for script-rendered pages.
//!
//! The strategy drives a [`BrowserSession`] through navigation, a wait for the
//! target selector, optional "load more" clicking and scroll-until-stable, then
//! parses the live DOM snapshot with the same extractor the static strategy
//! uses. Both loops are best-effort: they stop on convergence or on a hard
//! budget, never on a guarantee that all content was loaded.

use log::{debug, info, warn};
use scraper::Html;
use serde::Serialize;

use crate::browser::BrowserSession;
use crate::cancel::CancelFlag;
use crate::config::BrowserConfig;
use crate::error::{Error, Result};
use crate::extractors::{dedupe, extract_from_document, parse_selector};
use crate::request::{ExtractionRequest, ExtractionResult, ModeUsed};

/// Why the load-more loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadMoreStop {
    /// No configured control was clickable
    NoControl,
    /// Matched-element count did not grow for the configured number of clicks
    NoProgress,
    Budget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadMoreOutcome {
    pub clicks_used: u32,
    pub final_count: usize,
    pub stop: LoadMoreStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScrollStop {
    Stable,
    Budget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrollOutcome {
    pub scrolls: u32,
    pub stop: ScrollStop,
}

/// Page height and matched-element count after a scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Measurement {
    height: i64,
    count: usize,
}

pub struct DynamicStrategy<'a> {
    config: &'a BrowserConfig,
    load_more_selectors: &'a [String],
    cancel: CancelFlag,
}

impl<'a> DynamicStrategy<'a> {
    pub fn new(config: &'a BrowserConfig, load_more_selectors: &'a [String]) -> Self {
        Self {
            config,
            load_more_selectors,
            cancel: CancelFlag::default(),
        }
    }

    pub fn cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Extract from `req.url` in `session`.
    ///
    /// The session is left open; closing it belongs to whoever launched it.
    /// A wait timeout fails with a `Timeout` browser error. Load-more and
    /// scroll failures other than cancellation are logged and extraction
    /// proceeds on whatever has loaded.
    pub async fn run(
        &self,
        session: &mut dyn BrowserSession,
        req: &ExtractionRequest,
        load_more: bool,
    ) -> Result<ExtractionResult> {
        let selector = parse_selector(&req.selector)?;

        info!("[BROWSER] Loading {}", req.url);
        session.goto(&req.url).await?;
        sleep_unless_zero(self.config.settle_delay()).await;

        session
            .wait_for(&req.selector, req.timeout, self.config.poll_interval())
            .await?;
        debug!("[BROWSER] `{}` is present", req.selector);

        if load_more {
            match self.load_more(session, &req.selector, req.max_load_more_clicks).await {
                Ok(outcome) => info!(
                    "[BROWSER] Load-more stopped ({:?}) after {} clicks, {} elements",
                    outcome.stop, outcome.clicks_used, outcome.final_count
                ),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => warn!("[BROWSER] Load-more aborted: {e}"),
            }
        }

        if req.max_scrolls > 0 {
            match self.scroll(session, &req.selector, req.max_scrolls).await {
                Ok(outcome) => info!(
                    "[BROWSER] Scrolling stopped ({:?}) after {} scrolls",
                    outcome.stop, outcome.scrolls
                ),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => warn!("[BROWSER] Scrolling aborted: {e}"),
            }
        }

        let source = session.page_source().await?;
        let document = Html::parse_document(&source);
        let raw = extract_from_document(
            &document,
            &selector,
            &req.attribute,
            req.contains.as_deref(),
        );
        let raw_count = raw.len();
        let items = dedupe(raw);
        info!(
            "[BROWSER] Extracted {} unique items ({raw_count} matched)",
            items.len()
        );

        Ok(ExtractionResult::new(items, ModeUsed::Selenium, 1))
    }

    /// Click load-more controls until none is clickable, the count of
    /// `selector` stops growing, or `max_clicks` is spent.
    pub async fn load_more(
        &self,
        session: &mut dyn BrowserSession,
        selector: &str,
        max_clicks: u32,
    ) -> Result<LoadMoreOutcome> {
        let no_progress_limit = self.config.no_progress_rounds.max(1);
        let mut count = session.count(selector).await?;
        let mut clicks_used = 0;
        let mut no_progress_streak = 0;

        let stop = loop {
            self.cancel.check()?;
            if clicks_used >= max_clicks {
                break LoadMoreStop::Budget;
            }

            let Some(control) = self.click_any_control(session).await else {
                break LoadMoreStop::NoControl;
            };
            clicks_used += 1;
            sleep_unless_zero(self.config.click_settle()).await;

            let new_count = session.count(selector).await?;
            debug!("[BROWSER] Click {clicks_used} on `{control}`: {count} -> {new_count}");

            if new_count > count {
                count = new_count;
                no_progress_streak = 0;
            } else {
                no_progress_streak += 1;
                if no_progress_streak >= no_progress_limit {
                    break LoadMoreStop::NoProgress;
                }
            }
        };

        Ok(LoadMoreOutcome {
            clicks_used,
            final_count: count,
            stop,
        })
    }

    /// First control in list order that accepted a click.
    async fn click_any_control(&self, session: &mut dyn BrowserSession) -> Option<&'a str> {
        for control in self.load_more_selectors {
            match session.click_first(control).await {
                Ok(true) => return Some(control.as_str()),
                Ok(false) => {}
                Err(e) => debug!("[BROWSER] Control `{control}` not usable: {e}"),
            }
        }
        None
    }

    /// Scroll to the bottom until height and match count hold still for the
    /// configured number of rounds, or `max_scrolls` is spent. Returns to the
    /// top afterwards.
    pub async fn scroll(
        &self,
        session: &mut dyn BrowserSession,
        selector: &str,
        max_scrolls: u32,
    ) -> Result<ScrollOutcome> {
        let stable_limit = self.config.scroll_stable_rounds.max(1);
        let mut last = measure(session, selector).await?;
        let mut scrolls = 0;
        let mut stable_streak = 0;

        let stop = loop {
            if scrolls >= max_scrolls {
                break ScrollStop::Budget;
            }
            self.cancel.check()?;

            session.scroll_to_bottom().await?;
            scrolls += 1;
            sleep_unless_zero(self.config.scroll_pause()).await;

            let current = measure(session, selector).await?;
            debug!(
                "[BROWSER] Scroll {scrolls}: height {} -> {}, count {} -> {}",
                last.height, current.height, last.count, current.count
            );

            if current == last {
                stable_streak += 1;
                if stable_streak >= stable_limit {
                    break ScrollStop::Stable;
                }
            } else {
                stable_streak = 0;
                last = current;
            }
        };

        if let Err(e) = session.scroll_to_top().await {
            warn!("[BROWSER] Could not scroll back to top: {e}");
        }

        Ok(ScrollOutcome { scrolls, stop })
    }
}

async fn measure(session: &mut dyn BrowserSession, selector: &str) -> Result<Measurement> {
    Ok(Measurement {
        height: session.page_height().await?,
        count: session.count(selector).await?,
    })
}

async fn sleep_unless_zero(duration: std::time::Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
