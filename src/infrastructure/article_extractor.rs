//! Article text extraction
//!
//! Pulls the text of the article body out of a raw HTML page using a single
//! configurable CSS selector, then splits it into whitespace separated words.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;

use crate::infrastructure::config::ConfigError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Could not find article content matching '{selector}'")]
    NoMatchingContent { selector: String },

    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },
}

/// Extracts article text with a pre-parsed CSS selector.
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    selector: Selector,
    selector_source: String,
}

impl ArticleExtractor {
    /// Parses `selector` once; an invalid selector is a configuration error.
    pub fn new(selector: &str) -> Result<Self, ConfigError> {
        let parsed = Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            selector: parsed,
            selector_source: selector.to_string(),
        })
    }

    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector_source
    }

    /// Text content of every element matching the selector, in document
    /// order. Text nodes are concatenated as-is, so inline markup never
    /// splits a word; separate matches and block-level elements are
    /// separated by a space.
    pub fn extract_text(&self, html: &str) -> Result<String, ExtractionError> {
        if html.trim().is_empty() {
            return Err(ExtractionError::MalformedInput {
                reason: "empty document".to_string(),
            });
        }
        if !html.contains('<') {
            return Err(ExtractionError::MalformedInput {
                reason: "document contains no markup".to_string(),
            });
        }

        let document = Html::parse_document(html);
        let mut matched = 0usize;
        let mut text = String::new();

        for element in document.select(&self.selector) {
            if matched > 0 {
                text.push(' ');
            }
            matched += 1;
            collect_text(element, &mut text);
        }

        if matched == 0 {
            return Err(ExtractionError::NoMatchingContent {
                selector: self.selector_source.clone(),
            });
        }

        debug!(
            "Extracted {} chars from {} element(s) matching '{}'",
            text.len(),
            matched,
            self.selector_source
        );
        Ok(text)
    }

    /// Article text split on whitespace.
    pub fn extract_words(&self, html: &str) -> Result<Vec<String>, ExtractionError> {
        let text = self.extract_text(html)?;
        Ok(text.split_whitespace().map(str::to_string).collect())
    }
}

/// Elements whose boundaries separate words.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let block = BLOCK_ELEMENTS.contains(&child_element.value().name());
            if block {
                out.push(' ');
            }
            collect_text(child_element, out);
            if block {
                out.push(' ');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::article_html;

    fn extractor() -> ArticleExtractor {
        ArticleExtractor::new(".caas-body").unwrap()
    }

    #[test]
    fn test_extracts_only_selected_container() {
        let html = article_html("caas-body", "The quick brown fox");
        let words = extractor().extract_words(&html).unwrap();
        assert_eq!(words, vec!["The", "quick", "brown", "fox"]);
    }

    #[test]
    fn test_adjacent_elements_do_not_merge_words() {
        let html = r#"<html><body><div class="caas-body"><p>first</p><p>second</p></div></body></html>"#;
        let words = extractor().extract_words(html).unwrap();
        assert_eq!(words, vec!["first", "second"]);
    }

    #[test]
    fn test_inline_markup_does_not_split_words() {
        let html = r#"<div class="caas-body"><p>An un<em>believ</em>able <a href="x">apple</a>, indeed</p></div>"#;
        let words = extractor().extract_words(html).unwrap();
        assert_eq!(words, vec!["An", "unbelievable", "apple,", "indeed"]);
    }

    #[test]
    fn test_line_breaks_separate_words() {
        let html = r#"<div class="caas-body">first<br>second</div>"#;
        let words = extractor().extract_words(html).unwrap();
        assert_eq!(words, vec!["first", "second"]);
    }

    #[test]
    fn test_multiple_matches_are_concatenated() {
        let html = r#"<div class="caas-body">alpha</div><span>skip</span><div class="caas-body">omega</div>"#;
        let words = extractor().extract_words(html).unwrap();
        assert_eq!(words, vec!["alpha", "omega"]);
    }

    #[test]
    fn test_missing_container_is_reported() {
        let html = article_html("other-body", "text");
        assert!(matches!(
            extractor().extract_text(&html),
            Err(ExtractionError::NoMatchingContent { .. })
        ));
    }

    #[test]
    fn test_empty_and_markupless_input_is_malformed() {
        assert!(matches!(
            extractor().extract_text("   "),
            Err(ExtractionError::MalformedInput { .. })
        ));
        assert!(matches!(
            extractor().extract_text("just some words"),
            Err(ExtractionError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_invalid_selector_is_a_config_error() {
        assert!(matches!(
            ArticleExtractor::new("div[[["),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }
}
