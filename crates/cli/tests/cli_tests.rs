//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("folio");
    // keep user rule directories out of the picture
    cmd.env("HOME", std::env::temp_dir());
    cmd
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

#[test]
fn test_cli_file_input() {
    cmd()
        .arg(get_fixture_path("news_article.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "# Harbour cranes return to service after winter refit",
        ))
        .stdout(predicate::str::contains("**Author:** Morgan Reyes"));
}

#[test]
fn test_cli_stdin_input() {
    let html = std::fs::read_to_string(get_fixture_path("news_article.html")).unwrap();
    cmd()
        .args(["-", "--url", "https://news.example.org/cranes"])
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("**Source:** https://news.example.org/cranes"));
}

#[test]
fn test_cli_html_format() {
    cmd()
        .args(["-f", "html", &get_fixture_path("news_article.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("north quay"))
        .stdout(predicate::str::contains("window.analytics").not());
}

#[test]
fn test_cli_json_format() {
    let output = cmd()
        .args(["-f", "json", &get_fixture_path("news_article.html")])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["title"], "Harbour cranes return to service after winter refit");
    assert_eq!(json["method"], "semantic-html");
    assert!(json["confidence"].as_f64().unwrap() > 0.3);
}

#[test]
fn test_cli_invalid_format() {
    cmd()
        .args(["-f", "text", &get_fixture_path("news_article.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_cli_domain_selects_site_rule() {
    let output = cmd()
        .args([
            "-f",
            "json",
            "--domain",
            "en.wikipedia.org",
            &get_fixture_path("wikipedia_article.html"),
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["title"], "Lighthouse");
    assert_eq!(json["method"], "dual-validated");
}

#[test]
fn test_cli_url_flag_selects_site_rule() {
    cmd()
        .args([
            "-f",
            "json",
            "--url",
            "https://en.wikipedia.org/wiki/Lighthouse",
            &get_fixture_path("wikipedia_article.html"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dual-validated\""))
        .stdout(predicate::str::contains("https://en.wikipedia.org/wiki/Lighthouse"));
}

#[test]
fn test_cli_rules_dir_override() {
    let rules = TempDir::new().unwrap();
    std::fs::write(
        rules.path().join("en.wikipedia.org.txt"),
        "title: //title\nbody: //div[@id='mw-content-text']\n",
    )
    .unwrap();

    cmd()
        .args(["--domain", "en.wikipedia.org", "--rules-dir"])
        .arg(rules.path())
        .arg(get_fixture_path("wikipedia_article.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("# Lighthouse - Wikipedia"));
}

#[test]
fn test_cli_malformed_rules_dir_fails() {
    let rules = TempDir::new().unwrap();
    std::fs::write(rules.path().join("example.com.txt"), "this line has no colon\n").unwrap();

    cmd()
        .arg("--rules-dir")
        .arg(rules.path())
        .arg(get_fixture_path("news_article.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load site rules"));
}

#[test]
fn test_cli_output_file() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("output.md");

    cmd()
        .args(["-o", output_path.to_str().unwrap(), &get_fixture_path("news_article.html")])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = std::fs::read_to_string(&output_path).unwrap();
    assert!(content.starts_with("# Harbour cranes return to service after winter refit"));
}

#[test]
fn test_cli_save_dir() {
    let temp_dir = TempDir::new().unwrap();
    let save_dir = temp_dir.path().join("archive");

    cmd()
        .arg("--save-dir")
        .arg(&save_dir)
        .arg(get_fixture_path("news_article.html"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved"));

    let slug = "harbour-cranes-return-to-service-after-winter-refit";
    assert!(save_dir.join(format!("{slug}.md")).exists());
    assert!(save_dir.join(format!("{slug}.html")).exists());
}

#[test]
fn test_cli_missing_file() {
    cmd()
        .arg("nonexistent.html")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_cli_empty_content_fails() {
    cmd()
        .arg(get_fixture_path("empty_content.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("confidence"));
}

#[test]
fn test_cli_verbose() {
    cmd()
        .args(["-v", &get_fixture_path("news_article.html")])
        .assert()
        .success()
        .stderr(predicate::str::contains("Folio"))
        .stderr(predicate::str::contains("Extraction Details"));
}

#[test]
fn test_cli_completions() {
    cmd()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("folio"));
}

#[test]
fn test_cli_requires_input() {
    cmd().assert().failure();
}

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Extract and archive articles"))
        .stdout(predicate::str::contains("--save-dir"));
}
