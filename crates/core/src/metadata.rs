use serde_json::{Map, Value};
use tracing::debug;

use crate::Document;
use crate::article::ExtractionResult;

/// A JSON-LD property value whose shape varies between publishers.
///
/// `author` and `publisher` in particular show up as plain strings,
/// nested objects with a `name`, or lists of either.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonLdField {
    Text(String),
    Object(Map<String, Value>),
    List(Vec<JsonLdField>),
    Other,
}

impl From<&Value> for JsonLdField {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s.clone()),
            Value::Object(map) => Self::Object(map.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            _ => Self::Other,
        }
    }
}

impl JsonLdField {
    /// Resolves a display name: the string itself, an object's `name`, or
    /// the first element of a list.
    pub fn resolve_name(&self) -> Option<String> {
        match self {
            Self::Text(s) => non_empty(s),
            Self::Object(map) => map.get("name").and_then(|v| Self::from(v).resolve_name()),
            Self::List(items) => items.first().and_then(Self::resolve_name),
            Self::Other => None,
        }
    }

    /// Resolves a plain string value, taking the first list element.
    pub fn resolve_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => non_empty(s),
            Self::List(items) => items.first().and_then(Self::resolve_text),
            Self::Object(_) | Self::Other => None,
        }
    }
}

impl Document {
    /// Extract title with priority fallback:
    /// 1. Open Graph `og:title`
    /// 2. JSON-LD `headline`, then `name`
    /// 3. Twitter `twitter:title`
    /// 4. `article:title`
    /// 5. First `<h1>` element
    /// 6. `<title>` element
    pub fn extract_title(&self) -> String {
        self.get_meta_content("og:title")
            .or_else(|| self.json_ld_text("headline"))
            .or_else(|| self.json_ld_text("name"))
            .or_else(|| self.get_meta_content("twitter:title"))
            .or_else(|| self.get_meta_content("article:title"))
            .or_else(|| self.first_text("h1"))
            .or_else(|| self.title().and_then(|t| non_empty(&t)))
            .unwrap_or_default()
    }

    /// Extract author with priority fallback:
    /// 1. `og:author`
    /// 2. JSON-LD `author` (string, object name, or first list entry)
    /// 3. `article:author`, `twitter:creator`, `meta[name=author]`
    /// 4. `[rel=author]` text
    /// 5. First element with a byline or author class
    pub fn extract_author(&self) -> String {
        self.get_meta_content("og:author")
            .or_else(|| self.json_ld_name("author"))
            .or_else(|| self.get_meta_content("article:author"))
            .or_else(|| self.get_meta_content("twitter:creator"))
            .or_else(|| self.get_meta_content("author"))
            .or_else(|| self.first_text("[rel=\"author\"]"))
            .or_else(|| self.first_text("[class*=\"byline\"], [class*=\"author\"]"))
            .unwrap_or_default()
    }

    /// Extract publication date with priority fallback:
    /// 1. `og:published_time`
    /// 2. JSON-LD `datePublished`, then `publishDate`
    /// 3. `article:published_time`
    /// 4. `publication_date` / `date` meta
    /// 5. `<time datetime>` attribute
    pub fn extract_date(&self) -> String {
        self.get_meta_content("og:published_time")
            .or_else(|| self.json_ld_text("datePublished"))
            .or_else(|| self.json_ld_text("publishDate"))
            .or_else(|| self.get_meta_content("article:published_time"))
            .or_else(|| self.get_meta_content("publication_date"))
            .or_else(|| self.get_meta_content("date"))
            .or_else(|| self.first_attr("time[datetime]", "datetime"))
            .unwrap_or_default()
    }

    /// Extract site name: `og:site_name`, JSON-LD `publisher`, then
    /// `application-name`.
    pub fn extract_site_name(&self) -> String {
        self.get_meta_content("og:site_name")
            .or_else(|| self.json_ld_name("publisher"))
            .or_else(|| self.get_meta_content("application-name"))
            .unwrap_or_default()
    }

    /// Extract language: `<html lang>`, `og:locale`, then a
    /// `content-language` meta (by `name` or `http-equiv`).
    pub fn extract_language(&self) -> String {
        self.root_element()
            .attr("lang")
            .and_then(non_empty)
            .or_else(|| self.get_meta_content("og:locale"))
            .or_else(|| self.get_meta_content("content-language"))
            .or_else(|| self.http_equiv("content-language"))
            .unwrap_or_default()
    }

    /// Runs every metadata chain; content is left empty.
    pub fn extract_metadata(&self) -> ExtractionResult {
        ExtractionResult {
            title: self.extract_title(),
            author: self.extract_author(),
            published_date: self.extract_date(),
            site_name: self.extract_site_name(),
            language: self.extract_language(),
            ..Default::default()
        }
    }

    /// `content` of the first `meta[property=…]`, then `meta[name=…]`.
    fn get_meta_content(&self, key: &str) -> Option<String> {
        ["property", "name"].iter().find_map(|attr| {
            self.first_attr(&format!("meta[{attr}=\"{key}\"]"), "content")
        })
    }

    fn http_equiv(&self, key: &str) -> Option<String> {
        self.select("meta[http-equiv]")
            .ok()?
            .into_iter()
            .filter(|el| el.attr("http-equiv").is_some_and(|v| v.eq_ignore_ascii_case(key)))
            .find_map(|el| el.attr("content").and_then(non_empty))
    }

    fn first_attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.select(selector)
            .ok()?
            .into_iter()
            .find_map(|el| el.attr(attr).and_then(non_empty))
    }

    fn first_text(&self, selector: &str) -> Option<String> {
        self.select(selector)
            .ok()?
            .into_iter()
            .find_map(|el| non_empty(&el.text()))
    }

    fn json_ld_text(&self, key: &str) -> Option<String> {
        self.json_ld_value(key, JsonLdField::resolve_text)
    }

    fn json_ld_name(&self, key: &str) -> Option<String> {
        self.json_ld_value(key, JsonLdField::resolve_name)
    }

    /// First article whose `key` resolves to a non-empty value.
    fn json_ld_value(&self, key: &str, resolve: fn(&JsonLdField) -> Option<String>) -> Option<String> {
        self.json_ld_articles()
            .iter()
            .find_map(|article| article.get(key).and_then(|value| resolve(&JsonLdField::from(value))))
    }

    /// Article objects from every schema.org JSON-LD block.
    ///
    /// Top-level arrays and `@graph` lists are searched; the `@context` of
    /// a block applies to the objects nested in it.
    fn json_ld_articles(&self) -> Vec<Map<String, Value>> {
        let Ok(scripts) = self.select("script[type=\"application/ld+json\"]") else {
            return Vec::new();
        };

        let mut articles = Vec::new();
        for script in scripts {
            let raw = script.raw_text();
            let value = match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => value,
                Err(e) => {
                    debug!(error = %e, "skipping malformed JSON-LD block");
                    continue;
                }
            };
            collect_articles(&value, None, &mut articles);
        }
        articles
    }
}

fn collect_articles(value: &Value, context: Option<&Value>, out: &mut Vec<Map<String, Value>>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_articles(item, context, out);
            }
        }
        Value::Object(map) => {
            let context = map.get("@context").or(context);
            if let Some(graph) = map.get("@graph") {
                collect_articles(graph, context, out);
            }

            let is_schema_org = context.is_some_and(|c| c.to_string().contains("schema.org"));
            let is_article = map.get("@type").is_some_and(|t| match t {
                Value::String(s) => s.contains("Article"),
                Value::Array(types) => types.iter().any(|t| t.as_str().is_some_and(|s| s.contains("Article"))),
                _ => false,
            });
            if is_schema_org && is_article {
                out.push(map.clone());
            }
        }
        _ => {}
    }
}

/// Whitespace-collapsed, or `None` when blank.
fn non_empty(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() { None } else { Some(collapsed) }
}
