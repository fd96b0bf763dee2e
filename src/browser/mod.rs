//! Browser automation seam
//!
//! The browser strategy talks to a [`BrowserSession`]; a [`BrowserLauncher`]
//! creates one per run. The WebDriver implementation lives in [`webdriver`].

mod webdriver;

pub use webdriver::*;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// One live browser window.
///
/// `close` must be called exactly once by whoever launched the session;
/// implementations make repeated calls a no-op.
#[async_trait]
pub trait BrowserSession: Send {
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Block until `selector` matches, or fail with a `Timeout` browser error.
    async fn wait_for(&mut self, selector: &str, timeout: Duration, poll: Duration) -> Result<()>;

    /// Number of elements currently matching `selector`.
    async fn count(&mut self, selector: &str) -> Result<usize>;

    /// Script-click the first visible, enabled match. `Ok(false)` if there is none.
    async fn click_first(&mut self, selector: &str) -> Result<bool>;

    async fn scroll_to_bottom(&mut self) -> Result<()>;

    async fn scroll_to_top(&mut self) -> Result<()>;

    /// `document.body.scrollHeight`
    async fn page_height(&mut self) -> Result<i64>;

    /// Serialized live DOM.
    async fn page_source(&mut self) -> Result<String>;

    async fn close(&mut self) -> Result<()>;
}

/// Creates browser sessions on demand.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}
