//! Article extraction API.
//!
//! [`ArticleParser`] ties the pieces together: it resolves a site rule for
//! the page's domain, extracts with the rule's XPath paths when there is
//! one, cross-checks that against the heuristic extractor, and falls back
//! to heuristics alone (semantic containers, then scored candidates) when
//! there is not. Metadata found in the page fills whatever the rule or the
//! heuristics left empty.
//!
//! # Example
//!
//! ```rust
//! use folio_core::{ArticleParser, RuleStore};
//!
//! let html = r#"<html><head><title>Ownership</title></head><body><article>
//!     <h1>Ownership</h1>
//!     <p>Each value in Rust has an owner, and there can only be one owner at a time.</p>
//!     <p>When the owner goes out of scope the value is dropped and its memory is freed.</p>
//!     <p>References let code borrow a value without taking ownership of it at all.</p>
//! </article></body></html>"#;
//!
//! let parser = ArticleParser::with_rules(RuleStore::empty());
//! let article = parser.parse(html, "example.com", "https://example.com/ownership").unwrap();
//! assert_eq!(article.title, "Ownership");
//! ```

use std::path::Path;

use ego_tree::NodeId;
use tracing::{debug, info};

use crate::article::{ExtractionMethod, ExtractionResult, ParsedContent};
use crate::dom_tree::flatten_text;
use crate::extract::{ExtractConfig, HeuristicExtractor};
use crate::fetch::FetchConfig;
use crate::parse::Document;
use crate::preprocess::clean_subtree;
use crate::save::{SavedArticle, save_article};
use crate::siteconfig::processing::{apply_text_replacements, strip_document};
use crate::siteconfig::{ParsingRule, RuleStore, XPathIndex};
use crate::{FolioError, Result};

/// Configuration for [`ArticleParser`].
///
/// # Example
///
/// ```rust
/// use folio_core::ParserConfig;
///
/// let config = ParserConfig::builder()
///     .min_confidence(0.5)
///     .timeout(10)
///     .user_agent("MyReader/1.0")
///     .build();
/// assert_eq!(config.fetch.timeout, 10);
/// ```
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Heuristic-only results below this confidence are rejected (default: 0.3).
    pub min_confidence: f64,

    /// Whether rule-extracted bodies are cross-checked against the
    /// heuristic extractor (default: true). When off, the rule body is
    /// used as is.
    pub validate_rules: bool,

    /// Confidence given to unvalidated rule output (default: 0.85).
    pub rule_confidence: f64,

    /// Heuristic extraction settings.
    pub extract: ExtractConfig,

    /// HTTP settings for [`ArticleParser::parse_url`].
    pub fetch: FetchConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            validate_rules: true,
            rule_confidence: 0.85,
            extract: ExtractConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl ParserConfig {
    pub fn builder() -> ParserConfigBuilder {
        ParserConfigBuilder::new()
    }
}

/// Builder for [`ParserConfig`].
#[derive(Debug, Clone, Default)]
pub struct ParserConfigBuilder {
    config: ParserConfig,
}

impl ParserConfigBuilder {
    pub fn new() -> Self {
        Self { config: ParserConfig::default() }
    }

    /// Sets the minimum confidence for heuristic-only results.
    pub fn min_confidence(mut self, value: f64) -> Self {
        self.config.min_confidence = value;
        self
    }

    /// Sets whether rule output is cross-checked against heuristics.
    pub fn validate_rules(mut self, value: bool) -> Self {
        self.config.validate_rules = value;
        self
    }

    pub fn extract(mut self, value: ExtractConfig) -> Self {
        self.config.extract = value;
        self
    }

    pub fn fetch(mut self, value: FetchConfig) -> Self {
        self.config.fetch = value;
        self
    }

    /// Sets the request timeout in seconds.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.fetch.timeout = seconds;
        self
    }

    /// Sets the User-Agent; site rules cannot override it.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = Some(value.into());
        self
    }

    /// Adds a request header; site rules cannot override it.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.fetch.headers.push((name.into(), value.into()));
        self
    }

    pub fn build(self) -> ParserConfig {
        self.config
    }
}

/// Rule-aware article extractor.
///
/// Holds no per-call state; one parser can serve many threads, e.g. behind
/// an `Arc`.
#[derive(Debug, Clone)]
pub struct ArticleParser {
    config: ParserConfig,
    rules: RuleStore,
    extractor: HeuristicExtractor,
}

impl ArticleParser {
    /// A parser with the bundled rules and the user's rule directory.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::RuleParse`] if a bundled rule is malformed or
    /// the user rule directory cannot be read.
    pub fn new() -> Result<Self> {
        Ok(Self::with_rules(RuleStore::with_user_rules()?))
    }

    pub fn with_rules(rules: RuleStore) -> Self {
        Self::with_config(ParserConfig::default(), rules)
    }

    pub fn with_config(config: ParserConfig, rules: RuleStore) -> Self {
        let extractor = HeuristicExtractor::new(config.extract.clone());
        Self { config, rules, extractor }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// Extracts the article in `html`, served from `domain` at `source_url`.
    ///
    /// # Errors
    ///
    /// * [`FolioError::DocumentParse`] for empty input
    /// * [`FolioError::XPath`] if a rule expression is invalid
    /// * [`FolioError::Extraction`] if no rule body path matches and the
    ///   rule disables autodetection
    /// * [`FolioError::ConfidenceTooLow`] if heuristics alone are unsure
    /// * [`FolioError::TitleNotFound`] if no title could be found
    pub fn parse(&self, html: &str, domain: &str, source_url: &str) -> Result<ParsedContent> {
        let result = match self.rules.resolve(domain) {
            Some(rule) => {
                debug!(domain, rule = %rule.domain, "extracting with site rule");
                self.extract_with_rule(html, rule, domain, source_url)?
            }
            None => {
                debug!(domain, "no site rule, extracting heuristically");
                let doc = Document::parse(html)?;
                self.extract_heuristic(&doc, ExtractionResult::default(), domain, source_url)?
            }
        };

        self.finish(result, domain, source_url)
    }

    /// Fetches `url` and extracts its article.
    ///
    /// Headers from the matching site rule are sent unless the caller's
    /// [`FetchConfig`] already sets them.
    #[cfg(feature = "fetch")]
    pub async fn parse_url(&self, url: &str) -> Result<ParsedContent> {
        let parsed = url::Url::parse(url).map_err(|e| FolioError::InvalidUrl(format!("{url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| FolioError::InvalidUrl(format!("{url}: no host")))?
            .to_string();

        let rule_headers: Vec<(&str, &str)> = self
            .rules
            .resolve(&host)
            .map(|rule| {
                rule.http_headers
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        let html = crate::fetch::fetch_url(url, &self.config.fetch, rule_headers).await?;
        self.parse(&html, &host, url)
    }

    /// [`parse`](Self::parse) rendered as Markdown.
    pub fn convert(&self, html: &str, domain: &str, source_url: &str) -> Result<String> {
        Ok(self.parse(html, domain, source_url)?.to_markdown())
    }

    /// [`parse_url`](Self::parse_url) rendered as Markdown.
    #[cfg(feature = "fetch")]
    pub async fn convert_url(&self, url: &str) -> Result<String> {
        Ok(self.parse_url(url).await?.to_markdown())
    }

    /// Writes the article to `dir` as Markdown and HTML.
    pub fn save_article<P: AsRef<Path>>(&self, content: &ParsedContent, dir: P) -> Result<SavedArticle> {
        save_article(content, dir)
    }

    fn extract_with_rule(
        &self, html: &str, rule: &ParsingRule, domain: &str, source_url: &str,
    ) -> Result<ExtractionResult> {
        let html = apply_text_replacements(html, &rule.text_replacements);
        let mut doc = Document::parse(&html)?;

        let (fields, body) = {
            let index = XPathIndex::new(&doc);
            let fields = ExtractionResult {
                title: index.first_string(&rule.title)?.unwrap_or_default(),
                author: index.first_string(&rule.author)?.unwrap_or_default(),
                published_date: index.first_string(&rule.date)?.unwrap_or_default(),
                ..Default::default()
            };
            (fields, index.first_node(&rule.body)?)
        };

        let Some(body) = body else {
            if !rule.should_autodetect() {
                return Err(FolioError::Extraction {
                    domain: domain.to_string(),
                    url: source_url.to_string(),
                    reason: "no body path matched and autodetect_on_failure is off".to_string(),
                });
            }
            debug!(rule = %rule.domain, "no body path matched, autodetecting");
            return self.extract_heuristic(&doc, fields, domain, source_url);
        };

        let metadata = doc.extract_metadata();
        strip_document(&mut doc, rule, Some(body))?;

        if rule.should_prune() {
            let extract = &self.config.extract;
            clean_subtree(&mut doc, body, &extract.preprocess, &extract.score);
        }
        if rule.should_tidy() {
            debug!(rule = %rule.domain, "tidy has no effect on parsed documents");
        }

        let mut result = self.rule_body_result(&doc, body);
        result.title = fields.title;
        result.author = fields.author;
        result.published_date = fields.published_date;
        backfill(&mut result, metadata);

        Ok(result)
    }

    fn rule_body_result(&self, doc: &Document, body: NodeId) -> ExtractionResult {
        if self.config.validate_rules {
            return self.extractor.compare_with_rule_node(doc, Some(body));
        }

        let content = doc.node(body).map(flatten_text).unwrap_or_default();
        ExtractionResult::with_content(content, self.config.rule_confidence, ExtractionMethod::RuleBased)
    }

    /// Heuristic extraction with `fields` (from a rule, if any) taking
    /// precedence over page metadata.
    fn extract_heuristic(
        &self, doc: &Document, fields: ExtractionResult, domain: &str, source_url: &str,
    ) -> Result<ExtractionResult> {
        let mut result = self.extractor.extract_with_semantic_html(doc);
        result.title = fields.title;
        result.author = fields.author;
        result.published_date = fields.published_date;
        backfill(&mut result, doc.extract_metadata());

        if result.confidence < self.config.min_confidence {
            return Err(FolioError::ConfidenceTooLow {
                confidence: result.confidence,
                threshold: self.config.min_confidence,
                domain: domain.to_string(),
                url: source_url.to_string(),
            });
        }

        Ok(result)
    }

    fn finish(&self, result: ExtractionResult, domain: &str, source_url: &str) -> Result<ParsedContent> {
        if result.title.trim().is_empty() {
            return Err(FolioError::TitleNotFound { domain: domain.to_string(), url: source_url.to_string() });
        }

        let content = ParsedContent::from_result(result, source_url);
        info!(
            domain,
            method = %content.method,
            confidence = content.confidence,
            words = content.word_count,
            "parsed article"
        );
        Ok(content)
    }
}

/// Fills empty metadata fields of `result` from `metadata`.
fn backfill(result: &mut ExtractionResult, metadata: ExtractionResult) {
    let fill = |field: &mut String, value: String| {
        if field.trim().is_empty() {
            *field = value;
        }
    };

    fill(&mut result.title, metadata.title);
    fill(&mut result.author, metadata.author);
    fill(&mut result.published_date, metadata.published_date);
    fill(&mut result.site_name, metadata.site_name);
    fill(&mut result.language, metadata.language);
}
