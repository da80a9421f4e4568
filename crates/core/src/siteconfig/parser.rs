use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{FolioError, Result};
use crate::siteconfig::directives::{ParsingRule, parse_directive};

/// Rule file parser
#[derive(Debug)]
pub struct RuleParser;

impl RuleParser {
    /// Parse a rule file; the domain is the file stem (`example.com.txt`).
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsingRule> {
        let path = path.as_ref();
        let domain = domain_from_path(path).ok_or_else(|| FolioError::RuleParse {
            source_name: path.display().to_string(),
            line: 0,
            message: "file name is not a domain".to_string(),
        })?;

        let file = std::fs::File::open(path).map_err(|e| FolioError::RuleParse {
            source_name: path.display().to_string(),
            line: 0,
            message: format!("cannot open file: {e}"),
        })?;

        Self::parse_reader(&domain, BufReader::new(file))
    }

    /// Parse rule lines from a reader
    pub fn parse_reader<R: BufRead>(domain: &str, reader: R) -> Result<ParsingRule> {
        let mut rule = ParsingRule::new(domain);

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| rule_error(domain, index + 1, format!("read error: {e}")))?;
            add_line(&mut rule, index + 1, &line)?;
        }

        Ok(rule)
    }

    /// Parse rule lines from a string
    pub fn parse_str(domain: &str, content: &str) -> Result<ParsingRule> {
        let mut rule = ParsingRule::new(domain);

        for (index, line) in content.lines().enumerate() {
            add_line(&mut rule, index + 1, line)?;
        }

        Ok(rule)
    }
}

fn add_line(rule: &mut ParsingRule, line_number: usize, line: &str) -> Result<()> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }

    let directive = parse_directive(line).map_err(|message| rule_error(&rule.domain, line_number, message))?;
    rule.add_directive(directive);
    Ok(())
}

fn rule_error(source_name: &str, line: usize, message: String) -> FolioError {
    FolioError::RuleParse { source_name: source_name.to_string(), line, message }
}

/// `example.com.txt` → `example.com`; `.example.com.txt` → `example.com`.
pub(crate) fn domain_from_path(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some("txt") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let domain = crate::siteconfig::directives::normalize_domain(stem);
    if domain.is_empty() || !domain.contains('.') { None } else { Some(domain) }
}
