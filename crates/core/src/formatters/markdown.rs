use chrono::NaiveDateTime;

use crate::article::ParsedContent;

/// Timestamp format of the `**Saved:**` line
pub const SAVED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header fields recovered from a rendered article
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownHeader {
    pub title: String,
    pub author: String,
    pub date: String,
    pub source: String,
}

/// Render an article as Markdown.
///
/// The output is a fixed header (title heading, optional author and date,
/// source, save time), a horizontal rule, then the content. Deterministic
/// for a given `saved_at`.
pub fn render_markdown(content: &ParsedContent, saved_at: NaiveDateTime) -> String {
    let mut output = format!("# {}\n\n", content.title);

    if !content.author.is_empty() {
        output.push_str(&format!("**Author:** {}\n\n", content.author));
    }

    if !content.date.is_empty() {
        output.push_str(&format!("**Date:** {}\n\n", content.date));
    }

    output.push_str(&format!("**Source:** {}\n\n", content.url));
    output.push_str(&format!("**Saved:** {}\n\n", saved_at.format(SAVED_FORMAT)));
    output.push_str("---\n\n");
    output.push_str(&content.content);

    output
}

/// Read back the header written by [`render_markdown`].
///
/// Only lines before the first `---` are considered; missing fields stay
/// empty.
pub fn parse_markdown_header(markdown: &str) -> MarkdownHeader {
    let mut header = MarkdownHeader::default();

    for line in markdown.lines() {
        let line = line.trim();
        if line == "---" {
            break;
        }

        if let Some(title) = line.strip_prefix("# ") {
            if header.title.is_empty() {
                header.title = title.trim().to_string();
            }
        } else if let Some(author) = line.strip_prefix("**Author:**") {
            header.author = author.trim().to_string();
        } else if let Some(date) = line.strip_prefix("**Date:**") {
            header.date = date.trim().to_string();
        } else if let Some(source) = line.strip_prefix("**Source:**") {
            header.source = source.trim().to_string();
        }
    }

    header
}
