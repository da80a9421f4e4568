use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{FolioError, Result};
use crate::siteconfig::directives::{ParsingRule, normalize_domain};
use crate::siteconfig::parser::{RuleParser, domain_from_path};

/// Rule files compiled into the library.
const BUNDLED_RULES: &[(&str, &str)] = &[
    ("arstechnica.com", include_str!("../../site_rules/arstechnica.com.txt")),
    ("bbc.co.uk", include_str!("../../site_rules/bbc.co.uk.txt")),
    ("en.wikipedia.org", include_str!("../../site_rules/en.wikipedia.org.txt")),
    ("github.com", include_str!("../../site_rules/github.com.txt")),
    ("medium.com", include_str!("../../site_rules/medium.com.txt")),
    ("nytimes.com", include_str!("../../site_rules/nytimes.com.txt")),
    ("theguardian.com", include_str!("../../site_rules/theguardian.com.txt")),
];

/// Immutable table of per-domain extraction rules.
///
/// Rules are kept sorted by domain length (longest first) so that suffix
/// resolution is deterministic regardless of the order rules were added.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: Vec<ParsingRule>,
}

impl RuleStore {
    /// An empty store; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The rules shipped with the library.
    pub fn bundled() -> Result<Self> {
        let mut store = Self::empty();
        for (domain, content) in BUNDLED_RULES {
            store.insert(RuleParser::parse_str(domain, content)?);
        }
        Ok(store)
    }

    /// Bundled rules overlaid with the user's rule directory
    /// (`~/.config/folio/rules`), when it exists.
    ///
    /// User files that fail to parse are skipped with a warning; a user
    /// rule replaces the bundled rule for the same domain.
    pub fn with_user_rules() -> Result<Self> {
        let mut store = Self::bundled()?;

        if let Some(dir) = Self::user_dir().filter(|dir| dir.is_dir()) {
            for path in rule_files(&dir)? {
                match RuleParser::parse_file(&path) {
                    Ok(rule) => store.insert(rule),
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping user rule file"),
                }
            }
        }

        Ok(store)
    }

    /// Every `*.txt` rule file in `dir`.
    ///
    /// Unlike [`with_user_rules`](Self::with_user_rules) a malformed file
    /// is an error.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut store = Self::empty();
        for path in rule_files(dir.as_ref())? {
            store.insert(RuleParser::parse_file(&path)?);
        }
        Ok(store)
    }

    pub fn from_rules(rules: impl IntoIterator<Item = ParsingRule>) -> Self {
        let mut store = Self::empty();
        for rule in rules {
            store.insert(rule);
        }
        store
    }

    /// Add a rule, replacing any rule for the same domain.
    pub fn insert(&mut self, rule: ParsingRule) {
        self.rules.retain(|existing| existing.domain != rule.domain);
        self.rules.push(rule);
        self.rules
            .sort_by(|a, b| b.domain.len().cmp(&a.domain.len()).then_with(|| a.domain.cmp(&b.domain)));
    }

    /// Rules from `other` replace rules for the same domains here.
    pub fn merge(&mut self, other: RuleStore) {
        for rule in other.rules {
            self.insert(rule);
        }
    }

    /// Find the rule for a host: exact match, else the longest rule domain
    /// that is a suffix of `host` on a label boundary.
    pub fn resolve(&self, host: &str) -> Option<&ParsingRule> {
        let host = normalize_domain(host);
        if host.is_empty() {
            return None;
        }

        if let Some(rule) = self.rules.iter().find(|rule| rule.domain == host) {
            return Some(rule);
        }

        let rule = self.rules.iter().find(|rule| {
            host.strip_suffix(rule.domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
        });
        if let Some(rule) = rule {
            debug!(host = %host, domain = %rule.domain, "resolved rule by suffix");
        }
        rule
    }

    pub fn get(&self, domain: &str) -> Option<&ParsingRule> {
        let domain = normalize_domain(domain);
        self.rules.iter().find(|rule| rule.domain == domain)
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.domain.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// `~/.config/folio/rules`; never created here.
    pub fn user_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("folio").join("rules"))
    }
}

/// Rule files in `dir`, sorted by path. Files whose name is not a domain
/// are skipped.
fn rule_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| FolioError::RuleParse {
        source_name: dir.display().to_string(),
        line: 0,
        message: format!("cannot read rule directory: {e}"),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && domain_from_path(&path).is_some() {
            paths.push(path);
        } else {
            debug!(path = %path.display(), "not a rule file");
        }
    }
    paths.sort();
    Ok(paths)
}
