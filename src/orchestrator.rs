//! Mode selection: routes a request to the static, paginated or browser
//! strategy and performs the one-shot fallback in `auto` mode.

use log::{info, warn};

use crate::browser::{BrowserLauncher, WebDriverLauncher};
use crate::cancel::CancelFlag;
use crate::config::ScraperConfig;
use crate::error::{Error, Result};
use crate::extractors::Cleaner;
use crate::request::{ExtractionRequest, ExtractionResult, Mode, ModeUsed};
use crate::strategy::{DynamicStrategy, PaginationWalker, StaticStrategy};

/// A result plus the strategy failures that were absorbed on the way.
///
/// In `auto` mode a failing strategy counts as "no items" and the run goes
/// on; its error is kept here so callers can still display it.
#[derive(Debug)]
pub struct ExtractionReport {
    pub result: ExtractionResult,
    pub errors: Vec<Error>,
}

impl From<ExtractionResult> for ExtractionReport {
    fn from(result: ExtractionResult) -> Self {
        Self {
            result,
            errors: Vec::new(),
        }
    }
}

pub struct Orchestrator {
    config: ScraperConfig,
    cleaner: Cleaner,
    static_strategy: StaticStrategy,
    launcher: Box<dyn BrowserLauncher>,
    cancel: CancelFlag,
}

impl Orchestrator {
    /// Orchestrator using a WebDriver endpoint for browser runs.
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let launcher = WebDriverLauncher::new(config.browser.clone());
        Self::with_launcher(config, Box::new(launcher))
    }

    pub fn with_launcher(config: ScraperConfig, launcher: Box<dyn BrowserLauncher>) -> Result<Self> {
        let static_strategy = StaticStrategy::new(&config.http)?;
        let cleaner = config.cleaner();
        Ok(Self {
            config,
            cleaner,
            static_strategy,
            launcher,
            cancel: CancelFlag::new(),
        })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn cleaner(&self) -> &Cleaner {
        &self.cleaner
    }

    pub fn static_strategy(&self) -> &StaticStrategy {
        &self.static_strategy
    }

    /// Handle for cancelling runs of this orchestrator from another task.
    ///
    /// A cancel stops the run in progress, or the next one when none is
    /// active. The flag is cleared once that run returns.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run `req` according to its mode.
    ///
    /// | mode     | paginate | route                               |
    /// |----------|----------|-------------------------------------|
    /// | simple   | no       | static                              |
    /// | simple   | yes      | pagination walker                   |
    /// | selenium | either   | browser, load-more when paginating  |
    /// | auto     | no       | static, then browser if empty       |
    /// | auto     | yes      | walker, then browser with load-more |
    ///
    /// Explicit modes propagate strategy errors. `auto` only fails on
    /// cancellation; otherwise an empty `selenium` result carries the errors.
    pub async fn extract(&self, req: &ExtractionRequest) -> Result<ExtractionReport> {
        info!("Extracting `{}` from {} ({} mode)", req.selector, req.url, req.mode);

        let outcome = match (req.mode, req.paginate) {
            (Mode::Simple, false) => self.run_static(req).await.map(Into::into),
            (Mode::Simple, true) => self.run_paginated(req).await.map(Into::into),
            (Mode::Selenium, paginate) => self.run_browser(req, paginate).await.map(Into::into),
            (Mode::Auto, paginate) => self.run_auto(req, paginate).await,
        };

        self.cancel.reset();
        outcome
    }

    async fn run_auto(&self, req: &ExtractionRequest, paginate: bool) -> Result<ExtractionReport> {
        let mut errors = Vec::new();

        let first = if paginate {
            self.run_paginated(req).await
        } else {
            self.run_static(req).await
        };

        match first {
            Ok(result) if !result.is_empty() => return Ok(ExtractionReport { result, errors }),
            Ok(_) => info!("[AUTO] Static extraction found nothing, trying the browser"),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                warn!("[AUTO] Static extraction failed, trying the browser: {e}");
                errors.push(e);
            }
        }

        match self.run_browser(req, paginate).await {
            Ok(result) => Ok(ExtractionReport { result, errors }),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                warn!("[AUTO] Browser extraction failed: {e}");
                errors.push(e);
                Ok(ExtractionReport {
                    result: ExtractionResult::empty(ModeUsed::Selenium),
                    errors,
                })
            }
        }
    }

    async fn run_static(&self, req: &ExtractionRequest) -> Result<ExtractionResult> {
        self.cancel.check()?;
        self.static_strategy.run(req).await
    }

    async fn run_paginated(&self, req: &ExtractionRequest) -> Result<ExtractionResult> {
        self.cancel.check()?;
        PaginationWalker::new(
            &self.static_strategy,
            &self.cleaner,
            &self.config.pagination_selectors,
        )
        .page_delay(self.config.http.page_delay())
        .cancel_flag(self.cancel.clone())
        .run(req)
        .await
    }

    /// Launch a session, run the browser strategy, and close the session
    /// whatever the outcome.
    async fn run_browser(&self, req: &ExtractionRequest, load_more: bool) -> Result<ExtractionResult> {
        self.cancel.check()?;
        let mut session = self.launcher.launch().await?;

        let strategy = DynamicStrategy::new(&self.config.browser, &self.config.load_more_selectors)
            .cancel_flag(self.cancel.clone());
        let outcome = strategy.run(session.as_mut(), req, load_more).await;

        if let Err(e) = session.close().await {
            warn!("[BROWSER] Session did not close cleanly: {e}");
        }
        outcome
    }
}

/// Suggestions shown when a run produced no items.
pub fn remediation_hints(mode_used: ModeUsed) -> Vec<&'static str> {
    let mut hints = match mode_used {
        ModeUsed::Simple | ModeUsed::SimpleMultiPage => vec![
            "Try --mode selenium: the content may be rendered by JavaScript",
        ],
        ModeUsed::Selenium => vec![
            "Try --mode simple: the browser may have been blocked or timed out",
        ],
    };
    hints.push("Verify the selector against the live page in the browser's developer tools");
    hints.push("The site may block automated clients; add --delay or retry later");
    hints.push("Run with --diagnose to list the elements the page actually contains");
    hints
}
