//! Content scoring.
//!
//! Every element gets a content-likelihood score built from its tag, its
//! class/id vocabulary, its link density, its paragraph count and its text
//! length. Positive scores decay upward through ancestors so that the
//! container holding many good paragraphs rises above any single one.

use std::collections::HashMap;
use std::sync::LazyLock;

use ego_tree::NodeId;
use ego_tree::iter::Edge;
use regex::Regex;

use crate::dom_tree::{is_skipped, paragraph_count, text_stats};
use crate::parse::{Document, Element};

/// Class/id words that disqualify an element outright.
static UNLIKELY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)banner|cookie|popup|modal").expect("unlikely regex"));

/// Class/id words typical of navigation and page chrome.
static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)nav|sidebar|footer|breadcrumb|widget|hidden|menu|header|comment|share|social|related|sponsor|promo|masthead|pagination|advert|(^|[\s_-])ads?([\s_-]|$)",
    )
    .expect("negative regex")
});

/// Class/id words typical of article containers.
static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)article|content|entry|post|main|story|body|text|blog|hentry").expect("positive regex")
});

/// Configuration for content scoring
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Minimum score for an element to be a candidate
    pub min_score: f64,
    /// Minimum trimmed text length for an element to be a candidate
    pub min_text_length: usize,
    /// Minimum paragraphs for a document to be worth scoring
    pub min_paragraphs: usize,
    /// Maximum number of top candidates to return
    pub max_top_candidates: usize,
    /// Weight for positive class/ID patterns
    pub positive_weight: f64,
    /// Weight for negative class/ID patterns
    pub negative_weight: f64,
    /// Weight for unlikely class/ID patterns (replaces the other two)
    pub unlikely_weight: f64,
    /// Multiplier applied to link density
    pub link_density_weight: f64,
    /// Multiplier applied to paragraph count
    pub paragraph_weight: f64,
    /// How many ancestors receive a share of a positive score
    pub ancestor_levels: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            min_score: 20.0,
            min_text_length: 140,
            min_paragraphs: 3,
            max_top_candidates: 5,
            positive_weight: 25.0,
            negative_weight: -25.0,
            unlikely_weight: -50.0,
            link_density_weight: -1.0,
            paragraph_weight: 1.0,
            ancestor_levels: 5,
        }
    }
}

/// Score and statistics for one element.
///
/// `node` is only meaningful for the document it was computed on.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentScore {
    pub node: NodeId,
    pub score: f64,
    pub text_length: usize,
    /// Anchor text over total text, in `[0, 1]`
    pub link_density: f64,
    pub paragraph_count: usize,
    /// Number of element ancestors
    pub ancestor_depth: usize,
    /// Confidence in `[0, 1]`, see [`Scorer::calculate_confidence`]
    pub confidence: f64,
}

/// Base score for a tag name.
///
/// - MAIN: +40, ARTICLE: +30, SECTION: +15, DIV: +5
/// - P, PRE, TD, BLOCKQUOTE: +3
/// - ADDRESS, OL, UL, DL, DD, DT, LI, FORM: -3
/// - H1-H6, TH: -5
pub fn tag_base_score(tag: &str) -> f64 {
    match tag {
        "main" => 40.0,
        "article" => 30.0,
        "section" => 15.0,
        "div" => 5.0,
        "p" | "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    }
}

/// Class/ID adjustment for an element.
///
/// Class and id are matched together. An unlikely match short-circuits to
/// `unlikely_weight`; otherwise negative and positive weights both apply.
pub fn class_id_score(element: &Element<'_>, config: &ScoreConfig) -> f64 {
    let haystack = format!("{} {}", element.attr("class").unwrap_or(""), element.attr("id").unwrap_or(""));
    if haystack.trim().is_empty() {
        return 0.0;
    }
    if UNLIKELY.is_match(&haystack) {
        return config.unlikely_weight;
    }

    let mut weight = 0.0;
    if NEGATIVE.is_match(&haystack) {
        weight += config.negative_weight;
    }
    if POSITIVE.is_match(&haystack) {
        weight += config.positive_weight;
    }
    weight
}

/// Scores elements and picks main-content candidates.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    config: ScoreConfig,
}

impl Scorer {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Scores a single element; `None` for ids that are not elements.
    pub fn score_node(&self, doc: &Document, node: NodeId) -> Option<ContentScore> {
        let element = doc.element(node)?;
        let stats = text_stats(element.node());
        let paragraphs = paragraph_count(element.node());
        let link_density = stats.link_density();

        let mut score = tag_base_score(&element.tag_name())
            + class_id_score(&element, &self.config)
            + link_density * self.config.link_density_weight
            + paragraphs as f64 * self.config.paragraph_weight;
        if stats.text_length >= 25 {
            score += (stats.text_length as f64).log10() * 2.0;
        }

        let ancestor_depth = element.node().ancestors().filter(|n| n.value().is_element()).count();

        let mut result = ContentScore {
            node,
            score,
            text_length: stats.text_length,
            link_density,
            paragraph_count: paragraphs,
            ancestor_depth,
            confidence: 0.0,
        };
        result.confidence = self.calculate_confidence(&result);
        Some(result)
    }

    /// Adds `base × 0.5^(level+1)` to up to `ancestor_levels` element
    /// ancestors of `node`, scoring each the first time it is seen.
    pub fn score_ancestors(&self, doc: &Document, scores: &mut HashMap<NodeId, ContentScore>, node: NodeId, base: f64) {
        let Some(start) = doc.node(node) else {
            return;
        };

        let ancestors = start
            .ancestors()
            .filter(|n| n.value().is_element())
            .take(self.config.ancestor_levels);
        for (level, ancestor) in ancestors.enumerate() {
            let id = ancestor.id();
            if !scores.contains_key(&id) {
                match self.score_node(doc, id) {
                    Some(score) => {
                        scores.insert(id, score);
                    }
                    None => continue,
                }
            }
            if let Some(entry) = scores.get_mut(&id) {
                entry.score += base * 0.5f64.powi(level as i32 + 1);
            }
        }
    }

    /// Scores every element under `root` and returns the best `n`
    /// candidates, highest score first.
    ///
    /// Ties keep document order. Candidate confidence reflects the score
    /// after ancestor propagation.
    pub fn find_top_candidates(&self, doc: &Document, root: NodeId, n: usize) -> Vec<ContentScore> {
        let Some(root_node) = doc.node(root) else {
            return Vec::new();
        };

        let mut scores: HashMap<NodeId, ContentScore> = HashMap::new();
        let mut order = Vec::new();
        let mut skip_depth = 0usize;

        for edge in root_node.traverse() {
            match edge {
                Edge::Open(node) if node.value().is_element() => {
                    if skip_depth > 0 || is_skipped(node) {
                        skip_depth += 1;
                        continue;
                    }
                    let id = node.id();
                    if !scores.contains_key(&id) {
                        let Some(score) = self.score_node(doc, id) else {
                            continue;
                        };
                        scores.insert(id, score);
                    }
                    order.push(id);

                    let base = scores.get(&id).map_or(0.0, |s| s.score);
                    if base > 0.0 {
                        self.score_ancestors(doc, &mut scores, id, base);
                    }
                }
                Edge::Close(node) if node.value().is_element() && skip_depth > 0 => skip_depth -= 1,
                _ => {}
            }
        }

        let mut candidates: Vec<ContentScore> = order
            .iter()
            .filter_map(|id| scores.get(id))
            .filter(|s| s.score >= self.config.min_score && s.text_length >= self.config.min_text_length)
            .cloned()
            .map(|mut s| {
                s.confidence = self.calculate_confidence(&s);
                s
            })
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(n);
        candidates
    }

    /// Cheap gate before candidate search: enough paragraphs and text.
    pub fn is_probably_readable(&self, doc: &Document) -> bool {
        let root = doc.root_element().node();
        paragraph_count(root) >= self.config.min_paragraphs
            && text_stats(root).text_length >= self.config.min_text_length
    }

    /// Confidence in `[0, 1]` from additive buckets over score, text
    /// length, link density and paragraph count.
    pub fn calculate_confidence(&self, score: &ContentScore) -> f64 {
        let min_score = self.config.min_score;
        let min_text = self.config.min_text_length;
        let mut confidence = 0.0;

        if score.score.is_finite() {
            if score.score > 2.0 * min_score {
                confidence += 0.3;
            } else if score.score > min_score {
                confidence += 0.15;
            }
        }

        if score.text_length > 3 * min_text {
            confidence += 0.3;
        } else if score.text_length > min_text {
            confidence += 0.15;
        }

        if score.link_density < 0.2 {
            confidence += 0.2;
        } else if score.link_density < 0.4 {
            confidence += 0.1;
        }

        if score.paragraph_count >= 3 {
            confidence += 0.2;
        } else if score.paragraph_count >= 1 {
            confidence += 0.1;
        }

        f64::clamp(confidence, 0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PARAGRAPH: &str = "The quick brown fox jumps over the lazy dog, and then it keeps running through the forest until nightfall.";

    fn article_html() -> String {
        let paragraphs = (0..5).map(|_| format!("<p>{PARAGRAPH}</p>")).collect::<String>();
        format!(
            r#"<html><body>
                <div class="nav"><a href="/">Home</a> <a href="/about">About</a></div>
                <div class="article-content">{paragraphs}</div>
                <div class="footer">Copyright</div>
            </body></html>"#
        )
    }

    fn first(doc: &Document, selector: &str) -> NodeId {
        doc.select(selector).unwrap().into_iter().next().unwrap().id()
    }

    fn sample(score: f64, text_length: usize, link_density: f64, paragraph_count: usize) -> ContentScore {
        ContentScore {
            node: Document::parse("<p>x</p>").unwrap().root_element().id(),
            score,
            text_length,
            link_density,
            paragraph_count,
            ancestor_depth: 0,
            confidence: 0.0,
        }
    }

    #[rstest]
    #[case("main", 40.0)]
    #[case("article", 30.0)]
    #[case("section", 15.0)]
    #[case("div", 5.0)]
    #[case("blockquote", 3.0)]
    #[case("li", -3.0)]
    #[case("form", -3.0)]
    #[case("h2", -5.0)]
    #[case("span", 0.0)]
    fn test_tag_base_score(#[case] tag: &str, #[case] expected: f64) {
        assert_eq!(tag_base_score(tag), expected);
    }

    #[rstest]
    #[case(r#"<div class="cookie-banner">x</div>"#, -50.0)]
    #[case(r#"<div class="sidebar">x</div>"#, -25.0)]
    #[case(r#"<div id="main-content">x</div>"#, 25.0)]
    #[case(r#"<div class="post" id="comments">x</div>"#, 0.0)]
    #[case(r#"<div class="plain">x</div>"#, 0.0)]
    fn test_class_id_score(#[case] html: &str, #[case] expected: f64) {
        let doc = Document::parse(html).unwrap();
        let div = doc.select("div").unwrap()[0];
        assert_eq!(class_id_score(&div, &ScoreConfig::default()), expected);
    }

    #[test]
    fn test_ad_keyword_needs_word_boundary() {
        let config = ScoreConfig::default();
        let doc = Document::parse(r#"<div class="ad-slot">x</div><div class="download">y</div>"#).unwrap();
        let divs = doc.select("div").unwrap();

        assert_eq!(class_id_score(&divs[0], &config), -25.0);
        assert_eq!(class_id_score(&divs[1], &config), 0.0);
    }

    #[test]
    fn test_score_node_formula() {
        let doc = Document::parse(&format!("<div><p>{PARAGRAPH}</p></div>")).unwrap();
        let scorer = Scorer::default();
        let score = scorer.score_node(&doc, first(&doc, "div")).unwrap();

        let expected = 5.0 + 1.0 + (PARAGRAPH.len() as f64).log10() * 2.0;
        assert!((score.score - expected).abs() < 1e-9);
        assert_eq!(score.paragraph_count, 1);
        assert_eq!(score.text_length, PARAGRAPH.len());
        assert_eq!(score.link_density, 0.0);
    }

    #[test]
    fn test_score_node_rejects_non_elements() {
        let doc = Document::parse("<p>hello</p>").unwrap();
        let p = doc.select("p").unwrap()[0];
        let text_node = p.node().first_child().unwrap().id();

        assert!(Scorer::default().score_node(&doc, text_node).is_none());
    }

    #[test]
    fn test_score_ancestors_decays_by_level() {
        let doc = Document::parse("<section><div><p>short</p></div></section>").unwrap();
        let scorer = Scorer::default();
        let p = first(&doc, "p");
        let div = first(&doc, "div");
        let section = first(&doc, "section");

        let mut scores = HashMap::new();
        scorer.score_ancestors(&doc, &mut scores, p, 8.0);

        let div_base = scorer.score_node(&doc, div).unwrap().score;
        let section_base = scorer.score_node(&doc, section).unwrap().score;
        assert!((scores[&div].score - (div_base + 4.0)).abs() < 1e-9);
        assert!((scores[&section].score - (section_base + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_find_top_candidates_prefers_content_container() {
        let doc = Document::parse(&article_html()).unwrap();
        let scorer = Scorer::default();
        let root = doc.root_element().id();

        let candidates = scorer.find_top_candidates(&doc, root, 5);
        assert!(!candidates.is_empty());
        assert!(candidates.len() <= 5);
        assert_eq!(candidates[0].node, first(&doc, "div.article-content"));
        assert!(candidates.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(candidates.iter().all(|c| c.text_length >= 140 && c.score >= 20.0));
    }

    #[test]
    fn test_is_probably_readable() {
        let scorer = Scorer::default();
        assert!(scorer.is_probably_readable(&Document::parse(&article_html()).unwrap()));
        assert!(!scorer.is_probably_readable(&Document::parse("<div>Too short</div>").unwrap()));

        let two_long = format!("<p>{PARAGRAPH}</p><p>{PARAGRAPH}</p>");
        assert!(!scorer.is_probably_readable(&Document::parse(&two_long).unwrap()));
    }

    #[test]
    fn test_confidence_buckets() {
        let scorer = Scorer::default();
        assert!((scorer.calculate_confidence(&sample(50.0, 500, 0.1, 3)) - 1.0).abs() < 1e-9);
        assert!((scorer.calculate_confidence(&sample(25.0, 200, 0.3, 1)) - 0.5).abs() < 1e-9);
        assert_eq!(scorer.calculate_confidence(&sample(0.0, 0, 0.9, 0)), 0.0);
        assert_eq!(scorer.calculate_confidence(&sample(f64::NAN, 0, 0.9, 0)), 0.0);
    }

    #[test]
    fn test_confidence_is_monotonic() {
        let scorer = Scorer::default();
        let scores = [0.0, 20.0, 21.0, 40.0, 41.0, 100.0];
        let lengths = [0, 140, 141, 420, 421, 5000];
        let densities = [0.0, 0.19, 0.2, 0.39, 0.4, 1.0];
        let paragraphs = [0, 1, 2, 3, 10];

        for pair in scores.windows(2) {
            let low = scorer.calculate_confidence(&sample(pair[0], 200, 0.3, 1));
            let high = scorer.calculate_confidence(&sample(pair[1], 200, 0.3, 1));
            assert!(low <= high);
        }
        for pair in lengths.windows(2) {
            let low = scorer.calculate_confidence(&sample(25.0, pair[0], 0.3, 1));
            let high = scorer.calculate_confidence(&sample(25.0, pair[1], 0.3, 1));
            assert!(low <= high);
        }
        for pair in densities.windows(2) {
            let low = scorer.calculate_confidence(&sample(25.0, 200, pair[0], 1));
            let high = scorer.calculate_confidence(&sample(25.0, 200, pair[1], 1));
            assert!(low >= high);
        }
        for pair in paragraphs.windows(2) {
            let low = scorer.calculate_confidence(&sample(25.0, 200, 0.3, pair[0]));
            let high = scorer.calculate_confidence(&sample(25.0, 200, 0.3, pair[1]));
            assert!(low <= high);
        }
        for s in scores {
            for l in lengths {
                let c = scorer.calculate_confidence(&sample(s, l, 0.5, 2));
                assert!((0.0..=1.0).contains(&c));
            }
        }
    }
}
