//! HTML extraction modules
//!
//! Attribute access, selector matching and result cleaning. Both the static
//! and the browser strategy run their markup through these.

mod attribute;
mod cleaner;
mod css_extractor;

pub use attribute::*;
pub use cleaner::*;
pub use css_extractor::*;
