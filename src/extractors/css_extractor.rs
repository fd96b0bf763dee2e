//! CSS selector-based extraction
//!
//! Uses the scraper crate to select elements by CSS selectors and read an
//! [`Attribute`] from each one.

use scraper::{Html, Selector};

use super::attribute::{element_text, extract_attribute, Attribute};
use crate::error::{Error, Result};

/// Parse a CSS selector, mapping failures to a parse error.
pub fn parse_selector(selector_str: &str) -> Result<Selector> {
    Selector::parse(selector_str)
        .map_err(|e| Error::Parse(format!("invalid selector `{selector_str}`: {e}")))
}

/// Extract `attribute` from every element matching `selector`, in document order.
///
/// Empty values are skipped. When `contains` is set, only values containing
/// it survive.
pub fn extract_from_document(
    document: &Html,
    selector: &Selector,
    attribute: &Attribute,
    contains: Option<&str>,
) -> Vec<String> {
    document
        .select(selector)
        .map(|el| extract_attribute(&el, attribute))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .filter(|value| contains.map_or(true, |needle| value.contains(needle)))
        .collect()
}

/// Parse `html` and extract matches for `selector_str`.
pub fn extract_css(
    html: &str,
    selector_str: &str,
    attribute: &Attribute,
    contains: Option<&str>,
) -> Result<Vec<String>> {
    let selector = parse_selector(selector_str)?;
    let document = Html::parse_document(html);
    Ok(extract_from_document(&document, &selector, attribute, contains))
}

/// Number of elements matching `selector_str`.
pub fn count_matches(html: &str, selector_str: &str) -> Result<usize> {
    let selector = parse_selector(selector_str)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).count())
}

/// Extract first matching element's text
pub fn first_text(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;

    document
        .select(&selector)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}
