use std::collections::HashMap;

use tracing::debug;

/// A single `key: value` line from a rule file
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// XPath expressions for content extraction; repeats are fallbacks
    Title(String),
    Body(String),
    Date(String),
    Author(String),

    /// Subtrees removed before the body is read
    Strip(String),
    StripIdOrClass(String),

    /// Behavior options
    Tidy(bool),
    Prune(bool),
    AutodetectOnFailure(bool),

    /// Text replacement applied to raw HTML, paired in order
    FindString(String),
    ReplaceString(String),

    /// Request header sent when fetching pages of this domain
    HttpHeader(String, String),

    /// Example page used to check the rule by hand
    TestUrl(String),

    /// A well-formed key this engine does not act on
    Ignored(String),
}

/// Extraction rule for one domain.
///
/// Immutable once loaded into a [`RuleStore`](crate::RuleStore).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsingRule {
    /// Domain key, lowercase, without a leading dot
    pub domain: String,

    /// Extraction paths, evaluated in order until one matches
    pub title: Vec<String>,
    pub body: Vec<String>,
    pub date: Vec<String>,
    pub author: Vec<String>,

    /// Strip directives
    pub strip: Vec<String>,
    pub strip_id_or_class: Vec<String>,

    /// Behavior options
    pub tidy: Option<bool>,
    pub prune: Option<bool>,
    pub autodetect_on_failure: Option<bool>,

    /// Text replacement (paired)
    pub text_replacements: Vec<(String, String)>,

    /// HTTP headers
    pub http_headers: HashMap<String, String>,

    pub test_urls: Vec<String>,
}

impl ParsingRule {
    /// Create an empty rule for `domain`
    pub fn new(domain: &str) -> Self {
        Self { domain: normalize_domain(domain), ..Default::default() }
    }

    /// Add a directive to this rule
    pub fn add_directive(&mut self, directive: Directive) {
        match directive {
            Directive::Title(xpath) => self.title.push(xpath),
            Directive::Body(xpath) => self.body.push(xpath),
            Directive::Date(xpath) => self.date.push(xpath),
            Directive::Author(xpath) => self.author.push(xpath),

            Directive::Strip(xpath) => self.strip.push(xpath),
            Directive::StripIdOrClass(pattern) => self.strip_id_or_class.push(pattern),
            Directive::Tidy(value) => self.tidy = Some(value),
            Directive::Prune(value) => self.prune = Some(value),
            Directive::AutodetectOnFailure(value) => self.autodetect_on_failure = Some(value),
            Directive::FindString(find) => self.text_replacements.push((find, String::new())),
            Directive::ReplaceString(replace) => match self.text_replacements.last_mut() {
                Some(last) if last.1.is_empty() => last.1 = replace,
                _ => self.text_replacements.push((String::new(), replace)),
            },

            Directive::HttpHeader(name, value) => {
                self.http_headers.insert(name, value);
            }

            Directive::TestUrl(url) => self.test_urls.push(url),

            Directive::Ignored(key) => debug!(domain = %self.domain, key = %key, "ignoring unsupported rule key"),
        }
    }

    /// Whether heuristic extraction may take over when no body path matches
    /// (default: true)
    pub fn should_autodetect(&self) -> bool {
        self.autodetect_on_failure.unwrap_or(true)
    }

    /// Whether the rule body is pruned of hidden and unlikely elements
    /// (default: false)
    pub fn should_prune(&self) -> bool {
        self.prune.unwrap_or(false)
    }

    /// Get effective tidy setting (default: false)
    pub fn should_tidy(&self) -> bool {
        self.tidy.unwrap_or(false)
    }

    /// Check if this rule has any extraction paths
    pub fn has_extraction_paths(&self) -> bool {
        !self.body.is_empty() || !self.title.is_empty()
    }
}

/// Lowercase, trimmed, without leading or trailing dots.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_matches('.').to_lowercase()
}

/// Parse a directive line.
///
/// Blank and comment lines are the caller's business. The error is a
/// plain message; the parser adds the file name and line number.
pub fn parse_directive(line: &str) -> std::result::Result<Directive, String> {
    let line = line.trim();
    let Some((key, value)) = line.split_once(':') else {
        return Err(format!("expected 'key: value', found '{line}'"));
    };
    let key = key.trim();
    let value = value.trim().to_string();

    if let Some(rest) = key.strip_prefix("http_header(") {
        let name = rest
            .strip_suffix(')')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| format!("invalid http_header key '{key}'"))?;
        return Ok(Directive::HttpHeader(name.to_string(), value));
    }

    match key {
        "title" => Ok(Directive::Title(value)),
        "body" => Ok(Directive::Body(value)),
        "date" => Ok(Directive::Date(value)),
        "author" => Ok(Directive::Author(value)),

        "strip" => Ok(Directive::Strip(value)),
        "strip_id_or_class" => Ok(Directive::StripIdOrClass(value)),

        "tidy" => parse_boolean(&value).map(Directive::Tidy),
        "prune" => parse_boolean(&value).map(Directive::Prune),
        "autodetect_on_failure" => parse_boolean(&value).map(Directive::AutodetectOnFailure),

        "find_string" => Ok(Directive::FindString(value)),
        "replace_string" => Ok(Directive::ReplaceString(value)),

        "test_url" => Ok(Directive::TestUrl(value)),

        _ if is_key(key) => Ok(Directive::Ignored(key.to_string())),
        _ => Err(format!("invalid key '{key}'")),
    }
}

/// Rule keys are identifiers, optionally followed by a parenthesised
/// argument as in `replace_string(<br>)`.
fn is_key(key: &str) -> bool {
    let name = key.split_once('(').map_or(key, |(name, _)| name);
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a boolean value: `1`, `true`, `yes`, `on` or `0`, `false`, `no`, `off`
fn parse_boolean(value: &str) -> std::result::Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("invalid boolean value '{value}'")),
    }
}
