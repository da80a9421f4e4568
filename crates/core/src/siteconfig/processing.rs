use std::collections::HashSet;

use ego_tree::NodeId;
use tracing::debug;

use crate::error::Result;
use crate::parse::Document;
use crate::siteconfig::directives::ParsingRule;
use crate::siteconfig::xpath::{XPathIndex, string_literal};

/// Tags stripped from every rule-extracted page after the rule's own strips
const BOILERPLATE_SELECTOR: &str = "script, style, noscript";

/// Applies `find_string`/`replace_string` pairs to raw HTML in order;
/// pairs with an empty find string are skipped.
pub fn apply_text_replacements(html: &str, replacements: &[(String, String)]) -> String {
    let mut result = html.to_string();

    for (find, replace) in replacements {
        if !find.is_empty() {
            result = result.replace(find.as_str(), replace);
        }
    }

    result
}

/// `//*[contains(@class, L) or contains(@id, L)]` for an identifier fragment
pub fn strip_id_or_class_expression(identifier: &str) -> String {
    let literal = string_literal(identifier);
    format!("//*[contains(@class, {literal}) or contains(@id, {literal})]")
}

/// Elements a rule strips: `strip` paths first, then `strip_id_or_class`.
///
/// Everything is evaluated against the same index, so every id refers to
/// the unmodified document.
pub fn collect_strip_targets(index: &XPathIndex, rule: &ParsingRule) -> Result<Vec<NodeId>> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    let expressions = rule
        .strip
        .iter()
        .cloned()
        .chain(rule.strip_id_or_class.iter().map(|id| strip_id_or_class_expression(id)));

    for expression in expressions {
        for id in index.find_all(&expression)? {
            if seen.insert(id) {
                targets.push(id);
            }
        }
    }

    Ok(targets)
}

/// Strips rule-excluded subtrees and default boilerplate from `doc`.
///
/// `keep` (the selected body) is never removed, and neither is any
/// ancestor of it, even if a strip path matches. Returns the number of
/// subtrees removed.
pub fn strip_document(doc: &mut Document, rule: &ParsingRule, keep: Option<NodeId>) -> Result<usize> {
    let targets = collect_strip_targets(&XPathIndex::new(doc), rule)?;
    let boilerplate = default_boilerplate(doc);

    let protected: HashSet<NodeId> = keep
        .and_then(|id| doc.node(id))
        .map(|node| std::iter::once(node.id()).chain(node.ancestors().map(|a| a.id())).collect())
        .unwrap_or_default();

    let removals: Vec<NodeId> = targets
        .into_iter()
        .chain(boilerplate)
        .filter(|id| !protected.contains(id))
        .collect();
    let count = removals.len();

    debug!(domain = %rule.domain, count, "stripping rule exclusions");
    doc.remove_all(removals);
    Ok(count)
}

/// `script`, `style` and `noscript` elements.
pub fn default_boilerplate(doc: &Document) -> Vec<NodeId> {
    doc.select(BOILERPLATE_SELECTOR)
        .map(|elements| elements.iter().map(|el| el.id()).collect())
        .unwrap_or_default()
}
