//! Content fetching from URLs, files, and stdin.
//!
//! URL fetching needs the `fetch` feature (reqwest + tokio). Requests are
//! single-shot: no retries, bounded by [`FetchConfig::timeout`], and
//! cancelled by dropping the future.

use std::fs;
use std::path::PathBuf;

use crate::{FolioError, Result};

#[cfg(feature = "fetch")]
pub use http::fetch_url;

/// User-Agent sent when neither the caller nor the site rule sets one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; Folio/0.1; +https://github.com/folio-rs/folio)";

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Caller User-Agent; takes precedence over rule headers.
    pub user_agent: Option<String>,
    /// Caller headers; take precedence over rule headers.
    pub headers: Vec<(String, String)>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: None, headers: Vec::new() }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Effective request headers: caller headers (User-Agent included),
    /// then rule headers whose names the caller did not set, then the
    /// default User-Agent if nobody set one. Names compare
    /// case-insensitively.
    pub fn merged_headers<'r>(&self, rule_headers: impl IntoIterator<Item = (&'r str, &'r str)>) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = Vec::new();
        let mut push_unset = |name: &str, value: &str| {
            if !merged.iter().any(|(existing, _)| existing.eq_ignore_ascii_case(name)) {
                merged.push((name.to_string(), value.to_string()));
            }
        };

        if let Some(user_agent) = &self.user_agent {
            push_unset("User-Agent", user_agent);
        }
        for (name, value) in &self.headers {
            push_unset(name, value);
        }
        for (name, value) in rule_headers {
            push_unset(name, value);
        }
        push_unset("User-Agent", DEFAULT_USER_AGENT);

        merged
    }
}

#[cfg(feature = "fetch")]
mod http {
    use std::time::Duration;

    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use reqwest::{Client, StatusCode};
    use tracing::{debug, warn};
    use url::Url;

    use super::FetchConfig;
    use crate::{FolioError, Result};

    const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

    /// Fetches HTML content from a URL.
    ///
    /// `rule_headers` are the matching site rule's `http_header` entries;
    /// they never override headers set in `config`. Anything other than
    /// `200 OK` is an [`FolioError::HttpStatus`].
    pub async fn fetch_url<'r>(
        url: &str, config: &FetchConfig, rule_headers: impl IntoIterator<Item = (&'r str, &'r str)>,
    ) -> Result<String> {
        let parsed_url = Url::parse(url).map_err(|e| FolioError::InvalidUrl(format!("{url}: {e}")))?;

        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(FolioError::InvalidUrl(format!(
                "{url}: URL must use http:// or https://"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static(ACCEPT));
        for (name, value) in config.merged_headers(rule_headers) {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %name, "skipping invalid request header"),
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(FolioError::Http)?;

        debug!(url = %parsed_url, "fetching");
        let response = client
            .get(parsed_url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| transport_error(e, config.timeout))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FolioError::HttpStatus { status: status.as_u16(), url: url.to_string() });
        }

        response.text().await.map_err(|e| transport_error(e, config.timeout))
    }

    fn transport_error(error: reqwest::Error, timeout: u64) -> FolioError {
        if error.is_timeout() { FolioError::Timeout { timeout } } else { FolioError::Http(error) }
    }
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(FolioError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(FolioError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(FolioError::from)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.is_none());
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_default_user_agent_only_when_unset() {
        let headers = FetchConfig::default().merged_headers([]);
        assert_eq!(header(&headers, "user-agent"), Some(DEFAULT_USER_AGENT));

        let headers = FetchConfig::default().merged_headers([("user-agent", "RuleBot/2")]);
        assert_eq!(header(&headers, "User-Agent"), Some("RuleBot/2"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_rule_headers_never_override_caller() {
        let config = FetchConfig::default()
            .with_user_agent("CallerBot/1")
            .with_header("cookie", "caller=1");
        let headers = config.merged_headers([("User-Agent", "RuleBot/2"), ("Cookie", "rule=1"), ("Referer", "r")]);

        assert_eq!(header(&headers, "User-Agent"), Some("CallerBot/1"));
        assert_eq!(header(&headers, "Cookie"), Some("caller=1"));
        assert_eq!(header(&headers, "Referer"), Some("r"));
        assert_eq!(headers.len(), 3);
    }

    #[cfg(feature = "fetch")]
    #[tokio::test]
    async fn test_fetch_url_invalid() {
        let config = FetchConfig::default();

        let result = fetch_url("not-a-url", &config, []).await;
        assert!(matches!(result, Err(FolioError::InvalidUrl(_))));

        let result = fetch_url("ftp://example.com/file", &config, []).await;
        assert!(matches!(result, Err(FolioError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(FolioError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<p>saved</p>").unwrap();

        assert_eq!(fetch_file(path.to_str().unwrap()).unwrap(), "<p>saved</p>");
    }
}
