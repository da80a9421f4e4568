//! Extraction result types.
//!
//! [`ExtractionResult`] is what the heuristic and metadata extractors hand
//! back; [`ParsedContent`] is the final, merged article produced by
//! [`ArticleParser`](crate::ArticleParser).

use std::fmt;

use serde::Serialize;

/// How the final content was chosen.
///
/// Serialized (and displayed) as its kebab-case name, e.g. `dual-validated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Content taken from a domain rule's body path.
    RuleBased,
    /// Best candidate from heuristic scoring.
    Heuristic,
    /// A single `<article>` or `<main>` element.
    SemanticHtml,
    /// Rule and heuristic output agree.
    DualValidated,
    /// Rule output is substantially longer than the heuristic output.
    #[serde(rename = "xpath-preferred")]
    XPathPreferred,
    /// Heuristic output is substantially longer than the rule output.
    HeuristicPreferred,
    /// Rule and heuristic disagree without a clear winner.
    HeuristicFallback,
    /// Heuristic extraction found nothing usable.
    #[default]
    HeuristicFailed,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleBased => "rule-based",
            Self::Heuristic => "heuristic",
            Self::SemanticHtml => "semantic-html",
            Self::DualValidated => "dual-validated",
            Self::XPathPreferred => "xpath-preferred",
            Self::HeuristicPreferred => "heuristic-preferred",
            Self::HeuristicFallback => "heuristic-fallback",
            Self::HeuristicFailed => "heuristic-failed",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial result from one extraction strategy.
///
/// Empty strings mean "not found"; callers merge several results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub content: String,
    pub title: String,
    pub author: String,
    pub published_date: String,
    pub site_name: String,
    pub language: String,
    /// Always within `[0, 1]`
    pub confidence: f64,
    pub method: ExtractionMethod,
}

impl ExtractionResult {
    /// A content-less result with the given confidence.
    pub fn failed(confidence: f64) -> Self {
        Self { confidence: confidence.clamp(0.0, 1.0), method: ExtractionMethod::HeuristicFailed, ..Default::default() }
    }

    /// A result carrying content.
    pub fn with_content(content: String, confidence: f64, method: ExtractionMethod) -> Self {
        Self { content, confidence: confidence.clamp(0.0, 1.0), method, ..Default::default() }
    }
}

/// The final extracted article.
///
/// A successfully parsed article always has a non-empty `title`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedContent {
    pub title: String,
    pub author: String,
    pub date: String,
    /// Plain text body, paragraphs separated by blank lines
    pub content: String,
    /// Source URL
    pub url: String,
    /// Always within `[0, 1]`
    pub confidence: f64,
    pub method: ExtractionMethod,
    pub site_name: String,
    pub language: String,
    pub word_count: usize,
}

impl ParsedContent {
    /// Builds the final article from a merged extraction result.
    pub fn from_result(result: ExtractionResult, url: &str) -> Self {
        let word_count = count_words(&result.content);
        Self {
            title: result.title,
            author: result.author,
            date: result.published_date,
            content: result.content,
            url: url.to_string(),
            confidence: result.confidence.clamp(0.0, 1.0),
            method: result.method,
            site_name: result.site_name,
            language: result.language,
            word_count,
        }
    }

    /// Renders the article as Markdown stamped with the current local time.
    pub fn to_markdown(&self) -> String {
        crate::formatters::markdown::render_markdown(self, chrono::Local::now().naive_local())
    }

    /// Renders the Markdown form as a standalone HTML document.
    pub fn to_html(&self) -> String {
        crate::formatters::html::render_html(&self.title, &self.to_markdown())
    }

    /// Serializes the article as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Count words in text
fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
