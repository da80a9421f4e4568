//! Output renderers: Markdown with a metadata header, and a standalone
//! HTML document rendered from that Markdown.

pub mod html;
pub mod markdown;

pub use html::{escape_html, markdown_to_html, render_html, sanitize_html};
pub use markdown::{MarkdownHeader, SAVED_FORMAT, parse_markdown_header, render_markdown};
