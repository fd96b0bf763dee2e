//! WebDriver-backed browser sessions (chromedriver or any W3C endpoint).

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use thirtyfour::error::{WebDriverError, WebDriverResult};
use thirtyfour::prelude::*;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities};

use super::{BrowserLauncher, BrowserSession};
use crate::config::BrowserConfig;
use crate::error::{BrowserErrorKind, Error, Result};

const SCROLL_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight);";
const SCROLL_TOP_JS: &str = "window.scrollTo(0, 0);";
const HEIGHT_JS: &str = "return document.body.scrollHeight;";
const CLICK_JS: &str = "arguments[0].click();";

fn script_err(e: WebDriverError) -> Error {
    Error::browser(BrowserErrorKind::Script, e.to_string())
}

/// Starts Chrome sessions against a WebDriver server.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    config: BrowserConfig,
}

impl WebDriverLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn capabilities(&self) -> WebDriverResult<ChromeCapabilities> {
        let mut caps = DesiredCapabilities::chrome();
        if self.config.headless {
            caps.set_headless()?;
        }
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--disable-gpu")?;
        let (width, height) = self.config.window_size;
        caps.add_arg(&format!("--window-size={width},{height}"))?;
        caps.add_arg(&format!("--user-agent={}", self.config.user_agent))?;
        Ok(caps)
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let caps = self
            .capabilities()
            .map_err(|e| Error::browser(BrowserErrorKind::Launch, e.to_string()))?;

        let driver = WebDriver::new(self.config.webdriver_url.as_str(), caps)
            .await
            .map_err(|e| {
                Error::browser(
                    BrowserErrorKind::Launch,
                    format!("cannot reach WebDriver at {}: {e}", self.config.webdriver_url),
                )
            })?;

        info!("Browser session started via {}", self.config.webdriver_url);
        Ok(Box::new(WebDriverSession {
            driver: Some(driver),
        }))
    }
}

/// A live WebDriver session. Quitting is idempotent.
pub struct WebDriverSession {
    driver: Option<WebDriver>,
}

impl WebDriverSession {
    fn driver(&self) -> Result<&WebDriver> {
        self.driver
            .as_ref()
            .ok_or_else(|| Error::browser(BrowserErrorKind::Session, "session already closed"))
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.driver()?
            .goto(url)
            .await
            .map_err(|e| Error::browser(BrowserErrorKind::Navigation, format!("{url}: {e}")))
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration, poll: Duration) -> Result<()> {
        self.driver()?
            .query(By::Css(selector))
            .wait(timeout, poll)
            .first()
            .await
            .map(|_| ())
            .map_err(|e| {
                Error::browser(
                    BrowserErrorKind::Timeout,
                    format!("`{selector}` did not appear within {}s: {e}", timeout.as_secs()),
                )
            })
    }

    async fn count(&mut self, selector: &str) -> Result<usize> {
        let elements = self
            .driver()?
            .find_all(By::Css(selector))
            .await
            .map_err(script_err)?;
        Ok(elements.len())
    }

    async fn click_first(&mut self, selector: &str) -> Result<bool> {
        let driver = self.driver()?;
        let candidates = driver.find_all(By::Css(selector)).await.map_err(script_err)?;

        for element in candidates {
            let visible = element.is_displayed().await.unwrap_or(false);
            let enabled = element.is_enabled().await.unwrap_or(false);
            if !(visible && enabled) {
                continue;
            }

            // Script click gets past overlays that swallow native clicks
            let arg = element.to_json().map_err(script_err)?;
            driver.execute(CLICK_JS, vec![arg]).await.map_err(script_err)?;
            debug!("Clicked `{selector}`");
            return Ok(true);
        }

        Ok(false)
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.driver()?
            .execute(SCROLL_BOTTOM_JS, Vec::new())
            .await
            .map(|_| ())
            .map_err(script_err)
    }

    async fn scroll_to_top(&mut self) -> Result<()> {
        self.driver()?
            .execute(SCROLL_TOP_JS, Vec::new())
            .await
            .map(|_| ())
            .map_err(script_err)
    }

    async fn page_height(&mut self) -> Result<i64> {
        let ret = self
            .driver()?
            .execute(HEIGHT_JS, Vec::new())
            .await
            .map_err(script_err)?;
        Ok(ret.json().as_i64().unwrap_or_default())
    }

    async fn page_source(&mut self) -> Result<String> {
        self.driver()?.source().await.map_err(script_err)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(driver) = self.driver.take() else {
            return Ok(());
        };

        match driver.quit().await {
            Ok(()) => {
                info!("Browser session closed");
                Ok(())
            }
            Err(e) => {
                warn!("Browser did not quit cleanly: {e}");
                Err(Error::browser(BrowserErrorKind::Session, e.to_string()))
            }
        }
    }
}
