//! Web content extraction by CSS selector
//!
//! Extracts text, markup or attribute values from static HTML and from
//! JavaScript-rendered pages, then exports the items:
//! - Static strategy: one HTTP GET parsed with `scraper`
//! - Pagination walker: page-count detection and `?page=N` traversal
//! - Browser strategy: WebDriver session with load-more and scroll loops
//! - Orchestrator: `auto` / `simple` / `selenium` routing with a one-shot fallback
//! - CSV, JSON and text export, JSON preset store

pub mod browser;
pub mod cancel;
pub mod config;
pub mod error;
pub mod export;
pub mod extractors;
pub mod orchestrator;
pub mod presets;
pub mod request;
pub mod strategy;

pub use cancel::CancelFlag;
pub use config::ScraperConfig;
pub use error::{Error, Phase, Result};
pub use export::{ExportFormat, Exporter};
pub use extractors::{clean, Attribute, Cleaner};
pub use orchestrator::{remediation_hints, ExtractionReport, Orchestrator};
pub use presets::{Preset, PresetStore};
pub use request::{ExtractionRequest, ExtractionResult, Mode, ModeUsed};
