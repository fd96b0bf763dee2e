//! Post-filtering of extracted strings
//!
//! Drops UI chrome ("Loading...", "Next", "Menu"), pagination digits and
//! duplicates from a list of extracted items.

use std::collections::HashSet;

/// Phrases that mark an item as navigation or widget text rather than content.
pub const DEFAULT_UI_DENYLIST: &[&str] = &[
    "search", "filter", "loading", "show", "hide", "next", "previous", "menu", "button",
];

/// Filter configured with a lowercase denylist.
#[derive(Debug, Clone)]
pub struct Cleaner {
    denylist: Vec<String>,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new(DEFAULT_UI_DENYLIST.iter().copied())
    }
}

impl Cleaner {
    pub fn new<I, S>(denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            denylist: denylist
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Add phrases on top of the current denylist.
    pub fn extend<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.denylist.extend(
            extra
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty()),
        );
        self
    }

    /// Whether a single item survives filtering. Expects a trimmed string.
    pub fn keeps(&self, item: &str) -> bool {
        let len = item.chars().count();
        if len < 2 {
            return false;
        }

        let lower = item.to_lowercase();
        if self.denylist.iter().any(|phrase| lower.contains(phrase.as_str())) {
            return false;
        }

        // Page-number artifacts like "2" or "114"
        if len <= 3 && item.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }

        true
    }

    /// Trim, filter, and deduplicate keeping first occurrences in order.
    pub fn clean<I, S>(&self, items: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let kept = items
            .into_iter()
            .map(|item| item.as_ref().trim().to_string())
            .filter(|item| self.keeps(item));
        dedupe(kept)
    }
}

/// Clean with the default denylist.
pub fn clean<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Cleaner::default().clean(items)
}

/// Remove exact duplicates, preserving first-seen order.
pub fn dedupe<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_mixed_noise() {
        let items = ["loading...", "Acme Corp", "12", "Beta LLC", "Acme Corp"];
        assert_eq!(clean(items), vec!["Acme Corp", "Beta LLC"]);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let items = vec![
            "  Gamma Ltd ",
            "Show more",
            "x",
            "1234",
            "7",
            "Gamma Ltd",
            "Delta\tGroup",
            "",
        ];
        let once = clean(&items);
        assert_eq!(once, vec!["Gamma Ltd", "1234", "Delta\tGroup"]);
        assert_eq!(clean(&once), once);
    }

    #[test]
    fn test_denylist_is_case_insensitive() {
        let cleaner = Cleaner::default();
        assert!(!cleaner.keeps("NEXT PAGE"));
        assert!(!cleaner.keeps("Main Menu"));
        assert!(cleaner.keeps("Northwind"));
    }

    #[test]
    fn test_extended_denylist() {
        let cleaner = Cleaner::default().extend(["cookie"]);
        assert_eq!(
            cleaner.clean(["Accept cookies", "Contoso"]),
            vec!["Contoso"]
        );
    }

    #[test]
    fn test_dedupe_preserves_order() {
        let items = vec!["b", "a", "b", "c", "a"]
            .into_iter()
            .map(String::from);
        assert_eq!(dedupe(items), vec!["b", "a", "c"]);
    }
}
