//! Heuristic cleaning of a document arena.
//!
//! Cleaning is destructive, so callers run it on a clone. Each pass walks
//! the tree top-down, never descends into a subtree it has already chosen
//! to remove, and then detaches everything it collected. `<html>`, `<body>`
//! and the element a pass starts from are never removed.

use ego_tree::NodeId;
use ego_tree::iter::Edge;
use tracing::debug;

use crate::dom_tree::text_stats;
use crate::parse::{Document, Element};
use crate::scoring::{ScoreConfig, class_id_score};

/// Tags removed wholesale before scoring.
const UNWANTED_TAGS: [&str; 6] = ["script", "style", "noscript", "iframe", "embed", "object"];

/// Configuration for heuristic cleaning
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove script/style/noscript/iframe/embed/object
    pub remove_unwanted_tags: bool,
    /// Whether to remove hidden elements
    pub remove_hidden: bool,
    /// Whether to remove elements with a strongly negative class/id score
    pub remove_unlikely: bool,
    /// Class/id score below which an element is removed
    pub unlikely_threshold: f64,
    /// Whether to remove short, link-heavy elements
    pub remove_link_heavy: bool,
    /// Link density above which a short element counts as navigation
    pub max_link_density: f64,
    /// Elements with at least this much text are kept regardless of links
    pub link_heavy_max_text: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            remove_unwanted_tags: true,
            remove_hidden: true,
            remove_unlikely: true,
            unlikely_threshold: -40.0,
            remove_link_heavy: true,
            max_link_density: 0.75,
            link_heavy_max_text: 500,
        }
    }
}

/// Cleans `doc` in place, pass by pass.
///
/// Returns the number of subtrees removed.
pub fn clean_document(doc: &mut Document, config: &PreprocessConfig, score_config: &ScoreConfig) -> usize {
    let root = doc.root_element().id();
    clean_subtree(doc, root, config, score_config)
}

/// Cleans only the subtree under `root`, which itself is kept.
///
/// Used to prune a rule-selected body without touching the rest of the page.
pub fn clean_subtree(doc: &mut Document, root: NodeId, config: &PreprocessConfig, score_config: &ScoreConfig) -> usize {
    let mut removed = 0;

    if config.remove_unwanted_tags {
        removed += remove_where(doc, root, |el| UNWANTED_TAGS.contains(&el.tag_name().as_str()));
    }

    if config.remove_hidden {
        removed += remove_where(doc, root, is_hidden);
    }

    if config.remove_unlikely {
        removed += remove_where(doc, root, |el| class_id_score(el, score_config) < config.unlikely_threshold);
    }

    if config.remove_link_heavy {
        removed += remove_where(doc, root, |el| {
            if el.tag_name() == "a" {
                return false;
            }
            let stats = text_stats(el.node());
            stats.link_density() > config.max_link_density && stats.text_length < config.link_heavy_max_text
        });
    }

    debug!(removed, "cleaned document");
    removed
}

/// Whether an element is hidden by attribute or inline style.
pub fn is_hidden(element: &Element<'_>) -> bool {
    if element.attr("hidden").is_some() {
        return true;
    }
    if element
        .attr("aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }

    element.attr("style").is_some_and(|style| {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    })
}

fn remove_where(doc: &mut Document, root: NodeId, should_remove: impl Fn(&Element<'_>) -> bool) -> usize {
    let ids = collect_removals(doc, root, should_remove);
    let count = ids.len();
    doc.remove_all(ids);
    count
}

fn collect_removals(doc: &Document, root: NodeId, should_remove: impl Fn(&Element<'_>) -> bool) -> Vec<NodeId> {
    let mut ids = Vec::new();
    let mut skip_depth = 0usize;
    let Some(start) = doc.node(root) else {
        return ids;
    };

    for edge in start.traverse() {
        match edge {
            Edge::Open(node) => {
                let Some(element) = Element::from_node(node) else {
                    continue;
                };
                if skip_depth > 0 {
                    skip_depth += 1;
                    continue;
                }
                let tag = element.tag_name();
                if element.id() != root && tag != "html" && tag != "body" && should_remove(&element) {
                    ids.push(element.id());
                    skip_depth = 1;
                }
            }
            Edge::Close(node) if node.value().is_element() && skip_depth > 0 => skip_depth -= 1,
            _ => {}
        }
    }

    ids
}
