//! XPath over the scraper arena.
//!
//! `sxd-xpath` evaluates against its own document model, so [`XPathIndex`]
//! mirrors the arena into an `sxd-document` package once and tags every
//! mirrored element with its arena position. Query results are mapped back
//! to arena [`NodeId`]s, which is what stripping and body selection need.
//!
//! The position tag lives in a private namespace; expressions that test for
//! the presence of *any* attribute (`@*`) will see it.

use std::collections::HashSet;

use ego_tree::NodeId;
use ego_tree::iter::Edge;
use scraper::Node;
use sxd_document::{Package, QName, dom};
use sxd_xpath::nodeset::Node as XNode;
use sxd_xpath::{Context, Factory, Value, XPath};

use crate::error::{FolioError, Result};
use crate::parse::Document;

const INDEX_NAMESPACE: &str = "urn:folio:node-index";
const INDEX_ATTR: &str = "node";

fn index_name() -> QName<'static> {
    QName::with_namespace_uri(Some(INDEX_NAMESPACE), INDEX_ATTR)
}

/// A queryable XPath mirror of one [`Document`].
///
/// Node ids returned here belong to the document the index was built
/// from; rebuild the index after structural changes.
pub struct XPathIndex {
    package: Package,
    nodes: Vec<NodeId>,
    factory: Factory,
}

impl XPathIndex {
    /// Mirrors `doc` starting at its `<html>` element.
    pub fn new(doc: &Document) -> Self {
        let package = Package::new();
        let mut nodes = Vec::new();

        {
            let mirror = package.as_document();
            let mut stack: Vec<dom::Element<'_>> = Vec::new();

            for edge in doc.root_element().node().traverse() {
                match edge {
                    Edge::Open(node) => match node.value() {
                        Node::Element(el) => {
                            let element = mirror.create_element(el.name());
                            for (name, value) in el.attrs() {
                                element.set_attribute_value(name, value);
                            }
                            element.set_attribute_value(index_name(), &nodes.len().to_string());
                            nodes.push(node.id());

                            match stack.last() {
                                Some(parent) => parent.append_child(element),
                                None => mirror.root().append_child(element),
                            }
                            stack.push(element);
                        }
                        Node::Text(text) => {
                            if let Some(parent) = stack.last() {
                                parent.append_child(mirror.create_text(text));
                            }
                        }
                        _ => {}
                    },
                    Edge::Close(node) => {
                        if node.value().is_element() {
                            stack.pop();
                        }
                    }
                }
            }
        }

        Self { package, nodes, factory: Factory::new() }
    }

    fn compile(&self, expression: &str) -> Result<XPath> {
        self.factory
            .build(expression)
            .map_err(|e| xpath_error(expression, e.to_string()))?
            .ok_or_else(|| xpath_error(expression, "empty expression".to_string()))
    }

    fn evaluate(&self, expression: &str) -> Result<Value<'_>> {
        let xpath = self.compile(expression)?;
        let document = self.package.as_document();
        xpath
            .evaluate(&Context::new(), document.root())
            .map_err(|e| xpath_error(expression, e.to_string()))
    }

    /// Arena element for a result node; attribute and text results map to
    /// their owning element.
    fn node_id(&self, node: XNode<'_>) -> Option<NodeId> {
        let element = match node {
            XNode::Element(el) => el,
            XNode::Attribute(attr) => attr.parent()?,
            XNode::Text(text) => text.parent()?,
            _ => return None,
        };
        let index: usize = element.attribute_value(index_name())?.parse().ok()?;
        self.nodes.get(index).copied()
    }

    /// All matching elements in document order, without duplicates.
    ///
    /// Non-nodeset results (strings, numbers, booleans) match nothing.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::XPath`] if the expression does not compile or
    /// evaluate.
    pub fn find_all(&self, expression: &str) -> Result<Vec<NodeId>> {
        let Value::Nodeset(nodeset) = self.evaluate(expression)? else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::new();
        Ok(nodeset
            .document_order()
            .into_iter()
            .filter_map(|node| self.node_id(node))
            .filter(|id| seen.insert(*id))
            .collect())
    }

    /// First matching element in document order.
    pub fn find_one(&self, expression: &str) -> Result<Option<NodeId>> {
        Ok(self.find_all(expression)?.into_iter().next())
    }

    /// String value of an expression, trimmed; `None` when empty.
    ///
    /// Nodesets yield the string value of their first node, so both
    /// `//h1` and `//meta[@property='og:title']/@content` work.
    pub fn evaluate_string(&self, expression: &str) -> Result<Option<String>> {
        let text = match self.evaluate(expression)? {
            Value::String(s) => s,
            Value::Nodeset(nodeset) => match nodeset.document_order_first() {
                Some(node) => node.string_value(),
                None => return Ok(None),
            },
            Value::Number(_) | Value::Boolean(_) => return Ok(None),
        };

        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(if text.is_empty() { None } else { Some(text) })
    }

    /// First non-empty string among `expressions`, tried in order.
    pub fn first_string(&self, expressions: &[String]) -> Result<Option<String>> {
        for expression in expressions {
            if let Some(text) = self.evaluate_string(expression)? {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }

    /// First element matched by any of `expressions`, tried in order.
    pub fn first_node(&self, expressions: &[String]) -> Result<Option<NodeId>> {
        for expression in expressions {
            if let Some(id) = self.find_one(expression)? {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }
}

/// One-shot [`XPathIndex::find_one`]; build an index when running several
/// expressions against the same document.
pub fn find_one(doc: &Document, expression: &str) -> Result<Option<NodeId>> {
    XPathIndex::new(doc).find_one(expression)
}

/// One-shot [`XPathIndex::find_all`].
pub fn find_all(doc: &Document, expression: &str) -> Result<Vec<NodeId>> {
    XPathIndex::new(doc).find_all(expression)
}

/// One-shot [`XPathIndex::evaluate_string`].
pub fn evaluate_string(doc: &Document, expression: &str) -> Result<Option<String>> {
    XPathIndex::new(doc).evaluate_string(expression)
}

fn xpath_error(expression: &str, message: String) -> FolioError {
    FolioError::XPath { expression: expression.to_string(), message }
}

/// Quotes `value` as an XPath string literal.
///
/// XPath 1.0 has no escape sequences, so a value containing both quote
/// characters is assembled with `concat()`.
pub fn string_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }

    let parts: Vec<String> = value.split('\'').map(|part| format!("'{part}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}
