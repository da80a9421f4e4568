//! Library API integration tests
use folio_core::*;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

fn heuristic_parser() -> ArticleParser {
    ArticleParser::with_rules(RuleStore::empty())
}

#[test]
fn test_heuristic_parse_news_article() {
    let html = fixture("news_article.html");
    let article = heuristic_parser()
        .parse(&html, "news.example.org", "https://news.example.org/cranes")
        .expect("should parse");

    assert_eq!(article.title, "Harbour cranes return to service after winter refit");
    assert_eq!(article.author, "Morgan Reyes");
    assert_eq!(article.date, "2024-02-14T08:30:00Z");
    assert_eq!(article.site_name, "The Coastal Courier");
    assert_eq!(article.language, "en-GB");
    assert_eq!(article.method, ExtractionMethod::SemanticHtml);
    assert!((article.confidence - 0.90).abs() < 1e-9);

    assert!(article.content.contains("north quay"));
    assert!(article.content.contains("south quay"));
    assert!(!article.content.contains("We use cookies"));
    assert!(!article.content.contains("Ferry timetable"));
    assert!(!article.content.contains("window.analytics"));
    assert_eq!(article.word_count, article.content.split_whitespace().count());
}

#[test]
fn test_rule_parse_wikipedia_article() {
    let html = fixture("wikipedia_article.html");
    let parser = ArticleParser::with_rules(RuleStore::bundled().unwrap());
    let article = parser
        .parse(&html, "en.wikipedia.org", "https://en.wikipedia.org/wiki/Lighthouse")
        .expect("should parse");

    assert_eq!(article.title, "Lighthouse");
    assert_eq!(article.language, "en");
    assert_eq!(article.method, ExtractionMethod::DualValidated);
    assert!((article.confidence - 0.95).abs() < 1e-9);

    assert!(article.content.contains("beacon for navigational aid"));
    assert!(article.content.contains("entrance marker"));
    for stripped in ["Navigational aid", "[edit]", "[1]", "Contents", "For other uses", "Lightvessel", "Random article"] {
        assert!(!article.content.contains(stripped), "{stripped} survived");
    }
}

#[test]
fn test_empty_content_is_low_confidence() {
    let html = fixture("empty_content.html");
    let result = heuristic_parser().parse(&html, "example.com", "https://example.com/");

    assert!(matches!(result, Err(FolioError::ConfidenceTooLow { .. })));
}

#[test]
fn test_empty_input_is_parse_error() {
    let result = heuristic_parser().parse("  ", "example.com", "https://example.com/");
    assert!(matches!(result, Err(FolioError::DocumentParse(_))));
}

#[test]
fn test_rules_from_dir_override_bundled() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("en.wikipedia.org.txt"),
        "title: //title\nbody: //div[@id='mw-content-text']\nautodetect_on_failure: no\n",
    )
    .unwrap();

    let mut rules = RuleStore::bundled().unwrap();
    rules.merge(RuleStore::from_dir(dir.path()).unwrap());
    let parser = ArticleParser::with_rules(rules);

    let article = parser
        .parse(&fixture("wikipedia_article.html"), "en.wikipedia.org", "https://en.wikipedia.org/wiki/Lighthouse")
        .unwrap();
    assert_eq!(article.title, "Lighthouse - Wikipedia");
}

#[test]
fn test_markdown_and_json_outputs() {
    let article = heuristic_parser()
        .parse(&fixture("news_article.html"), "news.example.org", "https://news.example.org/cranes")
        .unwrap();

    let markdown = article.to_markdown();
    let header = parse_markdown_header(&markdown);
    assert_eq!(header.title, article.title);
    assert_eq!(header.author, "Morgan Reyes");
    assert_eq!(header.date, "2024-02-14T08:30:00Z");
    assert_eq!(header.source, "https://news.example.org/cranes");

    let json: serde_json::Value = serde_json::from_str(&article.to_json().unwrap()).unwrap();
    assert_eq!(json["method"], "semantic-html");
    assert_eq!(json["url"], "https://news.example.org/cranes");
    assert!(json["word_count"].as_u64().unwrap() > 100);

    let html = article.to_html();
    assert!(html.contains("<title>Harbour cranes return to service after winter refit</title>"));
    assert!(!html.contains("<script"));
}

#[test]
fn test_save_article_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let parser = heuristic_parser();
    let article = parser
        .parse(&fixture("news_article.html"), "news.example.org", "https://news.example.org/cranes")
        .unwrap();

    let first = parser.save_article(&article, dir.path()).unwrap();
    let second = parser.save_article(&article, dir.path()).unwrap();

    let slug = "harbour-cranes-return-to-service-after-winter-refit";
    assert_eq!(first.markdown_path, dir.path().join(format!("{slug}.md")));
    assert_eq!(second.html_path, dir.path().join(format!("{slug}_1.html")));

    let markdown = std::fs::read_to_string(&first.markdown_path).unwrap();
    assert_eq!(parse_markdown_header(&markdown).source, "https://news.example.org/cranes");
}

#[cfg(feature = "fetch")]
mod http {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves one request with `status` and `body`, returning the raw
    /// request head it received.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).to_lowercase()
        });

        (format!("http://{addr}/story"), handle)
    }

    fn local_rules() -> RuleStore {
        let rule = RuleParser::parse_str(
            "127.0.0.1",
            "http_header(User-Agent): RuleBot/2\nhttp_header(X-Folio-Test): from-rule\n",
        )
        .unwrap();
        RuleStore::from_rules([rule])
    }

    #[tokio::test]
    async fn test_parse_url_sends_merged_headers() {
        let (url, server) = serve_once("200 OK", fixture("news_article.html")).await;
        let config = ParserConfig::builder().user_agent("CallerBot/1").timeout(5).build();
        let parser = ArticleParser::with_config(config, local_rules());

        let article = parser.parse_url(&url).await.expect("should parse");
        let request = server.await.unwrap();

        assert_eq!(article.title, "Harbour cranes return to service after winter refit");
        assert_eq!(article.url, url);
        assert!(request.contains("user-agent: callerbot/1"));
        assert!(!request.contains("rulebot"));
        assert!(request.contains("x-folio-test: from-rule"));
    }

    #[tokio::test]
    async fn test_parse_url_uses_default_user_agent() {
        let (url, server) = serve_once("200 OK", fixture("news_article.html")).await;
        let parser = ArticleParser::with_rules(RuleStore::empty());

        parser.parse_url(&url).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.contains(&format!("user-agent: {}", fetch::DEFAULT_USER_AGENT.to_lowercase())));
    }

    #[tokio::test]
    async fn test_parse_url_non_200_is_status_error() {
        let (url, server) = serve_once("404 Not Found", "<p>gone</p>".to_string()).await;
        let parser = ArticleParser::with_rules(RuleStore::empty());

        let result = parser.parse_url(&url).await;
        server.await.unwrap();

        match result {
            Err(FolioError::HttpStatus { status, url: failed }) => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_parse_url_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/slow", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(3)).await;
            drop(socket);
        });

        let config = ParserConfig::builder().timeout(1).build();
        let parser = ArticleParser::with_config(config, RuleStore::empty());

        let result = parser.parse_url(&url).await;
        assert!(matches!(result, Err(FolioError::Timeout { timeout: 1 })));
        server.abort();
    }

    #[tokio::test]
    async fn test_parse_url_rejects_bad_urls() {
        let parser = ArticleParser::with_rules(RuleStore::empty());

        assert!(matches!(parser.parse_url("not a url").await, Err(FolioError::InvalidUrl(_))));
        assert!(matches!(parser.parse_url("file:///etc/hosts").await, Err(FolioError::InvalidUrl(_))));
    }
}
