//! Attribute accessor applied to a matched element
//!
//! Accessors are `text`, `html`, or the name of any element attribute.

use std::fmt;
use std::str::FromStr;

use scraper::ElementRef;
use serde::{Deserialize, Serialize};

/// What to read from each matched element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Attribute {
    /// Rendered text, trimmed
    #[default]
    Text,
    /// Serialized outer markup
    Html,
    /// Named attribute; empty when absent
    Named(String),
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        match value.trim() {
            "" | "text" => Attribute::Text,
            "html" => Attribute::Html,
            name => Attribute::Named(name.to_string()),
        }
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Attribute::from(value.as_str())
    }
}

impl From<Attribute> for String {
    fn from(value: Attribute) -> Self {
        value.to_string()
    }
}

impl FromStr for Attribute {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Attribute::from(s))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Text => f.write_str("text"),
            Attribute::Html => f.write_str("html"),
            Attribute::Named(name) => f.write_str(name),
        }
    }
}

/// Read `attribute` from `element`. Never fails: a missing attribute is "".
pub fn extract_attribute(element: &ElementRef<'_>, attribute: &Attribute) -> String {
    match attribute {
        Attribute::Text => element_text(element),
        Attribute::Html => element.html(),
        Attribute::Named(name) => element.value().attr(name).unwrap_or_default().to_string(),
    }
}

/// Text content with inner whitespace runs collapsed to single spaces.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
