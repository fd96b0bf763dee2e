//! Scripted browser used in place of a WebDriver session.
#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use webtag::browser::{BrowserLauncher, BrowserSession};
use webtag::config::ScraperConfig;
use webtag::error::{BrowserErrorKind, Error, Result};
use webtag::extractors::count_matches;

/// What the fake page looks like and what happened to it.
#[derive(Debug, Default)]
pub struct FakeState {
    /// Page sources; each accepted click on `control` advances one step
    pub snapshots: Vec<String>,
    pub stage: usize,
    /// Selector of the load-more control, if the page has one
    pub control: Option<String>,
    /// Control stays clickable after the last snapshot
    pub control_persists: bool,
    /// Every scroll adds height, so scrolling never settles
    pub endless_height: bool,
    pub height: i64,
    pub fail_launch: bool,

    pub visited: Vec<String>,
    pub launches: u32,
    pub clicks: u32,
    pub scrolls: u32,
    pub scrolled_to_top: u32,
    pub closes: u32,
}

#[derive(Clone, Default)]
pub struct FakeBrowser {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBrowser {
    pub fn with_pages<I, S>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let browser = Self::default();
        {
            let mut state = browser.state();
            state.snapshots = snapshots.into_iter().map(Into::into).collect();
            state.height = 2000;
        }
        browser
    }

    pub fn control(self, selector: &str, persists: bool) -> Self {
        {
            let mut state = self.state();
            state.control = Some(selector.to_string());
            state.control_persists = persists;
        }
        self
    }

    pub fn endless(self) -> Self {
        self.state().endless_height = true;
        self
    }

    pub fn failing_launch(self) -> Self {
        self.state().fail_launch = true;
        self
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn session(&self) -> FakeSession {
        FakeSession {
            state: self.state.clone(),
        }
    }

    pub fn launcher(&self) -> Box<dyn BrowserLauncher> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl BrowserLauncher for FakeBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let mut state = self.state();
        if state.fail_launch {
            return Err(Error::browser(BrowserErrorKind::Launch, "no driver"));
        }
        state.launches += 1;
        drop(state);
        Ok(Box::new(self.session()))
    }
}

pub struct FakeSession {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSession {
    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn current(&self) -> String {
        let state = self.state();
        state.snapshots.get(state.stage).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.state().visited.push(url.to_string());
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration, _poll: Duration) -> Result<()> {
        if count_matches(&self.current(), selector)? > 0 {
            Ok(())
        } else {
            Err(Error::browser(
                BrowserErrorKind::Timeout,
                format!("`{selector}` never appeared"),
            ))
        }
    }

    async fn count(&mut self, selector: &str) -> Result<usize> {
        count_matches(&self.current(), selector)
    }

    async fn click_first(&mut self, selector: &str) -> Result<bool> {
        let mut state = self.state();
        if state.control.as_deref() != Some(selector) {
            return Ok(false);
        }
        if state.stage + 1 < state.snapshots.len() {
            state.stage += 1;
            state.clicks += 1;
            Ok(true)
        } else if state.control_persists {
            state.clicks += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        let mut state = self.state();
        state.scrolls += 1;
        if state.endless_height {
            state.height += 1000;
        }
        Ok(())
    }

    async fn scroll_to_top(&mut self) -> Result<()> {
        self.state().scrolled_to_top += 1;
        Ok(())
    }

    async fn page_height(&mut self) -> Result<i64> {
        Ok(self.state().height)
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.current())
    }

    async fn close(&mut self) -> Result<()> {
        self.state().closes += 1;
        Ok(())
    }
}

/// Defaults with every sleep removed.
pub fn fast_config() -> ScraperConfig {
    let mut config = ScraperConfig::default();
    config.browser = config.browser.without_delays();
    config.http.page_delay_ms = 0;
    config
}

/// `<ul>` of `<li>` items.
pub fn list_page(items: &[&str]) -> String {
    let lis: String = items.iter().map(|i| format!("<li>{i}</li>")).collect();
    format!("<html><body><ul class=\"results\">{lis}</ul></body></html>")
}
