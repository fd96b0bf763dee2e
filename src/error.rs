//! Error types for extraction, export and preset handling.
//!
//! A selector that matches nothing is not an error; strategies report it as
//! an empty result.

use std::fmt;
use std::path::PathBuf;

/// Which part of a run failed. Used to prefix user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validate,
    Fetch,
    Parse,
    SelectorMatch,
    BrowserWait,
    Browser,
    Export,
    Presets,
    Cancelled,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validate => "validate",
            Phase::Fetch => "fetch",
            Phase::Parse => "parse",
            Phase::SelectorMatch => "selector-match",
            Phase::BrowserWait => "browser-wait",
            Phase::Browser => "browser",
            Phase::Export => "export",
            Phase::Presets => "presets",
            Phase::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// What went wrong inside the browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserErrorKind {
    /// The WebDriver session could not be created.
    Launch,
    Navigation,
    /// The target selector never appeared.
    Timeout,
    Script,
    Session,
}

impl fmt::Display for BrowserErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BrowserErrorKind::Launch => "launch",
            BrowserErrorKind::Navigation => "navigation",
            BrowserErrorKind::Timeout => "wait timeout",
            BrowserErrorKind::Script => "script",
            BrowserErrorKind::Session => "session",
        };
        f.write_str(name)
    }
}

/// Error type for every fallible operation in the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request failed validation before anything ran.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure: DNS, connection refused, timeout, body read.
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// Malformed markup or an unparsable CSS selector.
    #[error("Parse failed: {0}")]
    Parse(String),

    #[error("Browser {kind} failed: {message}")]
    Browser {
        kind: BrowserErrorKind,
        message: String,
    },

    #[error("Could not write {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preset error: {0}")]
    Preset(String),

    #[error("Extraction cancelled")]
    Cancelled,
}

impl Error {
    pub fn browser(kind: BrowserErrorKind, message: impl Into<String>) -> Self {
        Error::Browser {
            kind,
            message: message.into(),
        }
    }

    /// The phase this error belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            Error::InvalidRequest(_) => Phase::Validate,
            Error::Network { .. } | Error::HttpStatus { .. } => Phase::Fetch,
            Error::Parse(msg) if msg.starts_with("invalid selector") => Phase::SelectorMatch,
            Error::Parse(_) => Phase::Parse,
            Error::Browser {
                kind: BrowserErrorKind::Timeout,
                ..
            } => Phase::BrowserWait,
            Error::Browser { .. } => Phase::Browser,
            Error::Export { .. } | Error::Csv(_) | Error::Json(_) => Phase::Export,
            Error::Preset(_) => Phase::Presets,
            Error::Cancelled => Phase::Cancelled,
        }
    }

    /// Human-readable line naming the failed phase.
    pub fn user_message(&self) -> String {
        format!("[{}] {}", self.phase(), self)
    }
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_mapping() {
        let err = Error::HttpStatus {
            url: "https://example.com".to_string(),
            status: 503,
        };
        assert_eq!(err.phase(), Phase::Fetch);
        assert_eq!(
            err.user_message(),
            "[fetch] Request to https://example.com returned HTTP 503"
        );

        let err = Error::browser(BrowserErrorKind::Timeout, "no .item after 5s");
        assert_eq!(err.phase(), Phase::BrowserWait);

        let err = Error::Parse("invalid selector `div[`".to_string());
        assert_eq!(err.phase(), Phase::SelectorMatch);
    }
}
