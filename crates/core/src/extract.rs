//! Heuristic content extraction and dual validation.
//!
//! [`HeuristicExtractor`] finds the main content of a page without any
//! domain knowledge: semantic containers first, then scored candidates on a
//! cleaned clone of the document. It also cross-checks rule-based output
//! against its own result to decide which one to trust.

use std::collections::HashSet;

use ego_tree::NodeId;
use tracing::debug;

use crate::article::{ExtractionMethod, ExtractionResult};
use crate::dom_tree::flatten_text;
use crate::parse::Document;
use crate::preprocess::{PreprocessConfig, clean_document};
use crate::scoring::{ScoreConfig, Scorer};

/// Configuration for heuristic extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Scoring weights and thresholds
    pub score: ScoreConfig,
    /// Cleaning passes applied before candidate search
    pub preprocess: PreprocessConfig,
    /// Confidence when the document is not worth scoring
    pub unreadable_confidence: f64,
    /// Confidence when no candidate clears the thresholds
    pub no_candidate_confidence: f64,
    /// Confidence for a single `<article>`
    pub article_confidence: f64,
    /// Confidence for a single `<main>`
    pub main_confidence: f64,
    /// Word-overlap similarity above which rule and heuristic agree
    pub similarity_threshold: f64,
    /// Length ratio at which one side clearly carries more content
    pub length_ratio: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            score: ScoreConfig::default(),
            preprocess: PreprocessConfig::default(),
            unreadable_confidence: 0.1,
            no_candidate_confidence: 0.2,
            article_confidence: 0.90,
            main_confidence: 0.88,
            similarity_threshold: 0.8,
            length_ratio: 1.5,
        }
    }
}

/// Readability-style extractor.
///
/// Never mutates the document it is given; cleaning happens on a clone.
#[derive(Debug, Clone, Default)]
pub struct HeuristicExtractor {
    config: ExtractConfig,
    scorer: Scorer,
}

impl HeuristicExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        let scorer = Scorer::new(config.score.clone());
        Self { config, scorer }
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Extracts the best-scoring candidate's text.
    ///
    /// Unreadable documents yield confidence 0.1 and documents without a
    /// candidate 0.2, both with empty content.
    pub fn extract_content(&self, doc: &Document) -> ExtractionResult {
        if !self.scorer.is_probably_readable(doc) {
            debug!("document not readable, skipping candidate search");
            return ExtractionResult::failed(self.config.unreadable_confidence);
        }

        let cleaned = self.cleaned(doc);
        let root = cleaned.root_element().id();
        let candidates = self
            .scorer
            .find_top_candidates(&cleaned, root, self.config.score.max_top_candidates);

        let Some(top) = candidates.first() else {
            debug!("no candidate above thresholds");
            return ExtractionResult::failed(self.config.no_candidate_confidence);
        };

        let content = cleaned.node(top.node).map(flatten_text).unwrap_or_default();
        debug!(score = top.score, confidence = top.confidence, "selected top candidate");
        ExtractionResult::with_content(content, top.confidence, ExtractionMethod::Heuristic)
    }

    /// Prefers a lone `<article>`, then a lone `<main>`, falling back to
    /// [`extract_content`](Self::extract_content).
    pub fn extract_with_semantic_html(&self, doc: &Document) -> ExtractionResult {
        let cleaned = self.cleaned(doc);
        let semantic = [("article", self.config.article_confidence), ("main", self.config.main_confidence)];

        for (tag, confidence) in semantic {
            let Ok(matches) = cleaned.select(tag) else {
                continue;
            };
            let [element] = matches.as_slice() else {
                continue;
            };

            let text = flatten_text(element.node());
            if text.chars().count() > self.config.score.min_text_length {
                debug!(tag, "using semantic container");
                return ExtractionResult::with_content(text, confidence, ExtractionMethod::SemanticHtml);
            }
        }

        self.extract_content(doc)
    }

    /// Cross-checks the text under `rule_node` against heuristic output.
    ///
    /// Without a rule node the heuristic result is returned unchanged.
    pub fn compare_with_rule_node(&self, doc: &Document, rule_node: Option<NodeId>) -> ExtractionResult {
        let heuristic = self.extract_content(doc);
        let Some(rule_text) = rule_node.and_then(|id| doc.node(id)).map(flatten_text) else {
            return heuristic;
        };

        let similarity = calculate_similarity(&rule_text, &heuristic.content);
        let rule_len = rule_text.chars().count() as f64;
        let heuristic_len = heuristic.content.chars().count() as f64;
        let ratio = self.config.length_ratio;
        debug!(similarity, rule_len, heuristic_len, "comparing rule and heuristic output");

        if similarity > self.config.similarity_threshold {
            ExtractionResult::with_content(heuristic.content, 0.95, ExtractionMethod::DualValidated)
        } else if rule_len > ratio * heuristic_len {
            ExtractionResult::with_content(rule_text, 0.85, ExtractionMethod::XPathPreferred)
        } else if heuristic_len > ratio * rule_len {
            ExtractionResult::with_content(heuristic.content, 0.80, ExtractionMethod::HeuristicPreferred)
        } else {
            ExtractionResult::with_content(heuristic.content, 0.70, ExtractionMethod::HeuristicFallback)
        }
    }

    fn cleaned(&self, doc: &Document) -> Document {
        let mut cleaned = doc.clone();
        clean_document(&mut cleaned, &self.config.preprocess, &self.config.score);
        cleaned
    }
}

/// Jaccard similarity over lowercase whitespace-separated words.
///
/// Two empty texts are identical (1.0); one empty text shares nothing (0.0).
pub fn calculate_similarity(a: &str, b: &str) -> f64 {
    let words = |text: &str| -> HashSet<String> { text.split_whitespace().map(str::to_lowercase).collect() };
    let a = words(a);
    let b = words(b);

    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }

    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    intersection as f64 / union as f64
}
