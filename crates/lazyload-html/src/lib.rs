//! Lazyload HTML
//!
//! Parses markup with html5ever and converts it into a
//! `lazyload_dom::Document`, so pages can be swept for deferred images.

mod parser;

pub use parser::HtmlParser;

use lazyload_dom::{Document, PlatformFeatures};

/// Parse an HTML string with default platform features
pub fn parse(html: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse(html)
}

/// Parse an HTML string for a host with the given features
pub fn parse_with_features(html: &str, features: PlatformFeatures) -> Result<Document, HtmlError> {
    Ok(HtmlParser::new().parse(html)?.with_features(features))
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("Failed to read markup: {0}")]
    Io(#[from] std::io::Error),
}
