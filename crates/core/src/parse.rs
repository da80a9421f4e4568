//! HTML parsing and the owned document arena.
//!
//! A [`Document`] owns a parsed `scraper::Html`, whose nodes live in an
//! `ego_tree` arena addressed by [`NodeId`]. Cloning a document copies the
//! whole arena, so destructive passes (heuristic cleaning, rule stripping)
//! run on their own copy and never disturb the caller's tree. Node ids are
//! only meaningful for the arena they came from.
//!
//! # Example
//!
//! ```rust
//! use folio_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use ego_tree::NodeId;
use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};

use crate::{FolioError, Result};

/// A parsed HTML document backed by an owned node arena.
///
/// # Example
///
/// ```rust
/// use folio_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
#[derive(Clone, Debug)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// The HTML5 parser recovers from almost any markup, so the only input
    /// rejected here is one with no content at all.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::DocumentParse`] for empty or whitespace-only input.
    pub fn parse(html: &str) -> Result<Self> {
        if html.trim().is_empty() {
            return Err(FolioError::DocumentParse("document is empty".to_string()));
        }
        Ok(Self { html: Html::parse_document(html) })
    }

    /// Gets the underlying `scraper::Html`.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Serializes the (possibly modified) tree back to HTML.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// The `<html>` element.
    pub fn root_element(&self) -> Element<'_> {
        Element { element: self.html.root_element() }
    }

    /// Looks up a raw arena node.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id)
    }

    /// Looks up an element by arena id.
    ///
    /// Returns `None` when the id does not name an element of this arena.
    pub fn element(&self, id: NodeId) -> Option<Element<'_>> {
        self.node(id).and_then(ElementRef::wrap).map(|element| Element { element })
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::DocumentParse`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use folio_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|element| Element { element }).collect())
    }

    /// Detaches a node (and its subtree) from the tree.
    ///
    /// Unknown ids and the document root are ignored.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.html.tree.root().id() {
            return;
        }
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Detaches every node in `ids`.
    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        for id in ids {
            self.remove(id);
        }
    }

    /// Gets the content of the `<title>` element, trimmed.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    }

    /// Gets the visible text of the whole document.
    ///
    /// Text inside `script`, `style` and `noscript` is skipped.
    pub fn text_content(&self) -> String {
        crate::dom_tree::node_text(*self.html.root_element())
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| FolioError::DocumentParse(format!("Invalid selector '{selector}': {e}")))
}

/// A wrapper around scraper's ElementRef.
///
/// # Example
///
/// ```rust
/// use folio_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Wraps an arena node if it is an element.
    pub fn from_node(node: NodeRef<'a, Node>) -> Option<Self> {
        ElementRef::wrap(node).map(|element| Self { element })
    }

    /// Arena id of this element.
    pub fn id(&self) -> NodeId {
        self.element.id()
    }

    /// The underlying arena node.
    pub fn node(&self) -> NodeRef<'a, Node> {
        *self.element
    }

    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Visible text of this element (script/style/noscript skipped).
    pub fn text(&self) -> String {
        crate::dom_tree::node_text(self.node())
    }

    /// All text under this element, including `<script>` contents.
    pub fn raw_text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name (e.g., "div", "a", "span").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Parent element, if any.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(Element::from_node)
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::DocumentParse`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|element| Element { element }).collect())
    }
}
