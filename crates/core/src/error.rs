//! Error types for Folio operations.
//!
//! [`FolioError`] covers every failure the engine surfaces: rule files that
//! do not parse, fetches that fail, documents that cannot be parsed, and
//! extractions that cannot produce a titled article with enough confidence.
//!
//! Missing optional metadata (author, date, site name, language) and
//! malformed JSON-LD are never errors; they degrade to empty strings.
//!
//! # Example
//!
//! ```rust
//! use folio_core::{FolioError, Result};
//!
//! fn require_title(title: &str, domain: &str, url: &str) -> Result<()> {
//!     if title.is_empty() {
//!         return Err(FolioError::TitleNotFound { domain: domain.into(), url: url.into() });
//!     }
//!     Ok(())
//! }
//! # assert!(require_title("", "example.com", "https://example.com/a").is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;


/// Main error type for extraction, fetching and persistence.
///
/// Every variant that originates in a per-document call carries enough
/// context (domain, URL, path, expression) to be reported on its own.
#[derive(Error, Debug)]
pub enum FolioError {
    /// A rule file could not be parsed.
    ///
    /// Raised while building a [`RuleStore`](crate::RuleStore); fatal at
    /// construction time.
    #[error("Failed to parse rule file {source_name} at line {line}: {message}")]
    RuleParse { source_name: String, line: usize, message: String },

    /// Transport-level HTTP failure from reqwest.
    ///
    /// DNS failures, refused connections, TLS problems and body decoding
    /// errors end up here. Never retried.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with something other than `200 OK`.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided, or a URL without a host.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML rejected by the tree parser, or an invalid CSS selector.
    #[error("Failed to parse document: {0}")]
    DocumentParse(String),

    /// A rule expression failed to compile or evaluate.
    #[error("XPath error in '{expression}': {message}")]
    XPath { expression: String, message: String },

    /// No non-empty title could be produced.
    #[error("Could not extract a title from {url} (domain {domain})")]
    TitleNotFound { domain: String, url: String },

    /// Heuristic-only extraction fell below the confidence floor.
    #[error("Extraction confidence {confidence:.2} below {threshold:.2} for {url} (domain {domain})")]
    ConfidenceTooLow { confidence: f64, threshold: f64, domain: String, url: String },

    /// Extraction failed for another reason, such as a rule body that
    /// matched nothing while automatic detection is disabled.
    #[error("Extraction failed for {url} (domain {domain}): {reason}")]
    Extraction { domain: String, url: String, reason: String },

    /// Directory or file I/O failure while saving an article.
    #[error("Failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Other I/O errors (reading input files or stdin).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for FolioError.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FolioError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_rule_parse_error_names_line() {
        let err = FolioError::RuleParse { source_name: "example.com".into(), line: 7, message: "missing ':'".into() };
        let msg = err.to_string();
        assert!(msg.contains("example.com"));
        assert!(msg.contains("line 7"));
    }

    #[test]
    fn test_extraction_errors_carry_context() {
        let err = FolioError::ConfidenceTooLow {
            confidence: 0.2,
            threshold: 0.3,
            domain: "example.com".into(),
            url: "https://example.com/post".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("0.20"));
        assert!(msg.contains("https://example.com/post"));

        let err = FolioError::TitleNotFound { domain: "example.com".into(), url: "https://example.com/".into() };
        assert!(err.to_string().contains("example.com"));
    }

    #[test]
    fn test_timeout_error() {
        let err = FolioError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}
