//! Markdown to standalone HTML.
//!
//! The rendered Markdown may carry raw HTML from the source page, so the
//! body is sanitized before it is wrapped in the document shell.

use pulldown_cmark::{Options, Parser, html};
use tracing::warn;

const STYLE: &str = "body{max-width:42rem;margin:2rem auto;padding:0 1rem;\
font-family:Georgia,'Times New Roman',serif;font-size:1.125rem;line-height:1.6;color:#222;background:#fdfdfd}\
h1,h2,h3{font-family:system-ui,sans-serif;line-height:1.25}\
img{max-width:100%;height:auto}\
pre{overflow-x:auto;padding:.75rem;background:#f4f4f4}\
blockquote{margin-left:0;padding-left:1rem;border-left:3px solid #ccc;color:#555}\
hr{border:0;border-top:1px solid #ddd}";

/// Elements dropped from rendered output along with their content
const UNSAFE_ELEMENTS: &str = "script, style, iframe, object, embed";

/// Render Markdown to a sanitized HTML fragment
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);

    sanitize_html(&rendered).unwrap_or_else(|e| {
        warn!(error = %e, "sanitizer failed, rendering as preformatted text");
        format!("<pre>{}</pre>", escape_html(markdown))
    })
}

/// Render Markdown as a complete HTML document titled `title`
pub fn render_html(title: &str, markdown: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<article>\n{}</article>\n</body>\n</html>\n",
        escape_html(title),
        markdown_to_html(markdown)
    )
}

/// Remove unsafe elements, `on*` event handler attributes and
/// `javascript:` links.
pub fn sanitize_html(fragment: &str) -> Result<String, lol_html::errors::RewritingError> {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                lol_html::element!(UNSAFE_ELEMENTS, |el| {
                    el.remove();
                    Ok(())
                }),
                lol_html::element!("*", |el| {
                    let unsafe_attrs: Vec<String> = el
                        .attributes()
                        .iter()
                        .filter(|attr| {
                            let name = attr.name();
                            name.starts_with("on")
                                || (matches!(name.as_str(), "href" | "src")
                                    && attr.value().trim_start().to_ascii_lowercase().starts_with("javascript:"))
                        })
                        .map(|attr| attr.name())
                        .collect();
                    for name in unsafe_attrs {
                        el.remove_attribute(&name);
                    }
                    Ok(())
                }),
            ],
            ..lol_html::Settings::new()
        },
        |c: &[u8]| output.push_str(&String::from_utf8_lossy(c)),
    );

    rewriter.write(fragment.as_bytes())?;
    rewriter.end()?;

    Ok(output)
}

/// Escape text for use in HTML content or a quoted attribute
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
