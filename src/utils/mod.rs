//! Utility functions and helpers.

pub mod http;
pub mod normalize;

use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};

pub use normalize::{normalize, normalize_opt, slug};

/// Parse a CSS selector, mapping failures into `AppError::Selector`.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of an element with text nodes joined by spaces, whitespace collapsed.
pub fn element_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_parse_selector() {
        assert!(parse_selector("div.infobox").is_ok());
        assert!(parse_selector("div[class*='enchanting']").is_ok());
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_element_text_joins_nodes() {
        let html = Html::parse_fragment("<p>Great<b>White</b>\n  Shark</p>");
        let sel = parse_selector("p").unwrap();
        let p = html.select(&sel).next().unwrap();
        assert_eq!(element_text(&p), "Great White Shark");
    }
}
