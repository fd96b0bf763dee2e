//! Extraction strategies
//!
//! - [`StaticStrategy`]: one HTTP GET, parsed with `scraper`
//! - [`PaginationWalker`]: static extraction over numbered pages
//! - [`DynamicStrategy`]: a browser session, with load-more and scroll loops

mod dynamic;
mod pagination;
mod static_page;

pub use dynamic::*;
pub use pagination::*;
pub use static_page::*;
