//! Text statistics and flattening over the document arena.
//!
//! Every walk here is iterative (`NodeRef::traverse`) and skips the
//! subtrees of `script`, `style` and `noscript`, so scoring, cleaning and
//! output all see the same notion of "visible text".

use ego_tree::NodeRef;
use ego_tree::iter::Edge;
use scraper::Node;

/// Elements whose text is never counted or emitted.
pub const SKIPPED_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Elements that start a new paragraph when flattened.
const BLOCK_TAGS: [&str; 33] = [
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "details",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tr",
    "ul",
    "summary",
];

/// Text and link statistics for one subtree.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextStats {
    /// Characters of trimmed visible text.
    pub text_length: usize,
    /// Characters of trimmed text inside `<a>` descendants.
    pub link_length: usize,
}

impl TextStats {
    /// Fraction of the text that sits inside links, in `[0, 1]`.
    ///
    /// Zero when there is no text at all.
    pub fn link_density(&self) -> f64 {
        if self.text_length == 0 {
            return 0.0;
        }
        (self.link_length as f64 / self.text_length as f64).clamp(0.0, 1.0)
    }
}

/// Whether `node` is an element whose subtree is never read.
pub fn is_skipped(node: NodeRef<'_, Node>) -> bool {
    node.value()
        .as_element()
        .is_some_and(|el| SKIPPED_TAGS.contains(&el.name()))
}

/// Walks the visible text of `node`, calling `visit(text, inside_anchor)`.
fn walk_text<'a>(node: NodeRef<'a, Node>, mut visit: impl FnMut(&'a str, bool)) {
    let mut skip_depth = 0usize;
    let mut anchor_depth = 0usize;

    for edge in node.traverse() {
        match edge {
            Edge::Open(n) => match n.value() {
                Node::Element(el) => {
                    if skip_depth > 0 || SKIPPED_TAGS.contains(&el.name()) {
                        skip_depth += 1;
                    } else if el.name() == "a" {
                        anchor_depth += 1;
                    }
                }
                Node::Text(text) if skip_depth == 0 => visit(text, anchor_depth > 0),
                _ => {}
            },
            Edge::Close(n) => {
                if let Node::Element(el) = n.value() {
                    if skip_depth > 0 {
                        skip_depth -= 1;
                    } else if el.name() == "a" {
                        anchor_depth = anchor_depth.saturating_sub(1);
                    }
                }
            }
        }
    }
}

/// Concatenated visible text of `node`.
pub fn node_text(node: NodeRef<'_, Node>) -> String {
    let mut out = String::new();
    walk_text(node, |text, _| out.push_str(text));
    out
}

/// Text length and anchor text length of `node`.
pub fn text_stats(node: NodeRef<'_, Node>) -> TextStats {
    let mut all = String::new();
    let mut links = String::new();
    walk_text(node, |text, in_anchor| {
        all.push_str(text);
        if in_anchor {
            links.push_str(text);
        }
    });

    TextStats { text_length: all.trim().chars().count(), link_length: links.trim().chars().count() }
}

/// Number of `<p>` elements in the subtree, the node itself included.
pub fn paragraph_count(node: NodeRef<'_, Node>) -> usize {
    node.descendants()
        .filter(|n| n.value().as_element().is_some_and(|el| el.name() == "p"))
        .count()
}

/// Flattens `node` into readable plain text.
///
/// Block elements are separated by blank lines, list items get a `- `
/// prefix, inline elements run together with whitespace collapsed, `<br>`
/// breaks the line and `<pre>` keeps its text verbatim.
pub fn flatten_text(node: NodeRef<'_, Node>) -> String {
    let mut out = FlatText::default();
    let mut skip_depth = 0usize;
    let mut pre_depth = 0usize;

    for edge in node.traverse() {
        match edge {
            Edge::Open(n) => match n.value() {
                Node::Element(el) => {
                    let name = el.name();
                    if skip_depth > 0 || SKIPPED_TAGS.contains(&name) {
                        skip_depth += 1;
                        continue;
                    }
                    match name {
                        "br" => out.line_break(),
                        "li" => {
                            out.block_break();
                            out.push_raw("- ");
                        }
                        "pre" => {
                            out.block_break();
                            pre_depth += 1;
                        }
                        _ if BLOCK_TAGS.contains(&name) => out.block_break(),
                        _ => {}
                    }
                }
                Node::Text(text) if skip_depth == 0 => {
                    if pre_depth > 0 {
                        out.push_raw(text);
                    } else {
                        out.push_collapsed(text);
                    }
                }
                _ => {}
            },
            Edge::Close(n) => {
                if let Node::Element(el) = n.value() {
                    if skip_depth > 0 {
                        skip_depth -= 1;
                        continue;
                    }
                    let name = el.name();
                    if name == "pre" {
                        pre_depth = pre_depth.saturating_sub(1);
                    }
                    if BLOCK_TAGS.contains(&name) {
                        out.block_break();
                    }
                }
            }
        }
    }

    out.finish()
}

#[derive(Default)]
struct FlatText {
    out: String,
    pending_space: bool,
}

impl FlatText {
    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n') || self.out.ends_with("- ")
    }

    fn push_collapsed(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                self.pending_space = true;
                continue;
            }
            if self.pending_space && !self.at_line_start() {
                self.out.push(' ');
            }
            self.pending_space = false;
            self.out.push(c);
        }
    }

    fn push_raw(&mut self, text: &str) {
        self.out.push_str(text);
        self.pending_space = false;
    }

    fn trim_trailing_spaces(&mut self) {
        let trimmed = self.out.trim_end_matches([' ', '\t']).len();
        self.out.truncate(trimmed);
    }

    fn line_break(&mut self) {
        self.trim_trailing_spaces();
        self.out.push('\n');
        self.pending_space = false;
    }

    fn block_break(&mut self) {
        self.trim_trailing_spaces();
        self.pending_space = false;
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }

    fn finish(self) -> String {
        let mut text = String::with_capacity(self.out.len());
        let mut newlines = 0;
        for c in self.out.trim().chars() {
            if c == '\n' {
                newlines += 1;
                if newlines > 2 {
                    continue;
                }
            } else {
                newlines = 0;
            }
            text.push(c);
        }
        text
    }
}
