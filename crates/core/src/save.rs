//! Writing articles to disk as a Markdown + HTML pair.
//!
//! File names come from the title slug. Existing files are never
//! overwritten: `slug`, `slug_1`, `slug_2`, … are probed until neither the
//! `.md` nor the `.html` name is taken. The probe is not atomic, so two
//! processes saving the same title at once can still collide.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::article::ParsedContent;
use crate::error::{FolioError, Result};
use crate::formatters::{render_html, render_markdown};

/// Longest slug produced by [`slugify`], in bytes.
///
/// Keeps `slug_N.html` well inside the usual 255-byte file name limit.
pub const MAX_SLUG_LEN: usize = 100;

/// Slug used when the title has no usable characters
const FALLBACK_SLUG: &str = "article";

/// Paths written by [`save_article`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedArticle {
    pub markdown_path: PathBuf,
    pub html_path: PathBuf,
}

/// Lowercase, runs of non-alphanumerics collapsed to `-`, no edge hyphens,
/// at most [`MAX_SLUG_LEN`] bytes (cut on a character boundary).
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        let mut end = MAX_SLUG_LEN;
        while !slug.is_char_boundary(end) {
            end -= 1;
        }
        slug.truncate(end);
        slug.truncate(slug.trim_end_matches('-').len());
    }

    slug
}

/// Save `content` under `dir`, stamped with the current local time.
///
/// Creates `dir` if needed.
pub fn save_article<P: AsRef<Path>>(content: &ParsedContent, dir: P) -> Result<SavedArticle> {
    save_article_at(content, dir, chrono::Local::now().naive_local())
}

/// [`save_article`] with an explicit save time.
pub fn save_article_at<P: AsRef<Path>>(
    content: &ParsedContent, dir: P, saved_at: NaiveDateTime,
) -> Result<SavedArticle> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| FolioError::Persistence { path: dir.to_path_buf(), source })?;

    let slug = match slugify(&content.title) {
        slug if slug.is_empty() => FALLBACK_SLUG.to_string(),
        slug => slug,
    };
    let saved = available_paths(dir, &slug);

    let markdown = render_markdown(content, saved_at);
    let html = render_html(&content.title, &markdown);

    write_file(&saved.markdown_path, &markdown)?;
    write_file(&saved.html_path, &html)?;

    info!(path = %saved.markdown_path.display(), "saved article");
    Ok(saved)
}

fn available_paths(dir: &Path, slug: &str) -> SavedArticle {
    let candidate = |stem: &str| SavedArticle {
        markdown_path: dir.join(format!("{stem}.md")),
        html_path: dir.join(format!("{stem}.html")),
    };

    let mut saved = candidate(slug);
    let mut suffix = 1;
    while saved.markdown_path.exists() || saved.html_path.exists() {
        saved = candidate(&format!("{slug}_{suffix}"));
        suffix += 1;
    }
    saved
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| FolioError::Persistence { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::ExtractionMethod;
    use crate::formatters::parse_markdown_header;
    use rstest::rstest;
    use tempfile::TempDir;

    fn article(title: &str) -> ParsedContent {
        ParsedContent {
            title: title.to_string(),
            author: "Ferris".to_string(),
            date: String::new(),
            content: "Body text.".to_string(),
            url: "https://example.com/a".to_string(),
            confidence: 0.9,
            method: ExtractionMethod::SemanticHtml,
            site_name: String::new(),
            language: String::new(),
            word_count: 2,
        }
    }

    #[rstest]
    #[case("Hello, World!", "hello-world")]
    #[case("  --Rust 2024: What's New?--  ", "rust-2024-what-s-new")]
    #[case("Ünïcode Títle", "ünïcode-títle")]
    #[case("", "")]
    #[case("!!!", "")]
    fn test_slugify(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(slugify(title), expected);
    }

    #[test]
    fn test_slugify_caps_length_without_trailing_hyphen() {
        let title = format!("{} tail", "a".repeat(99));
        let slug = slugify(&title);

        assert_eq!(slug, "a".repeat(99));
        assert!(slugify(&"word ".repeat(50)).len() <= MAX_SLUG_LEN);
    }

    #[test]
    fn test_slugify_caps_multibyte_titles_by_bytes() {
        let slug = slugify(&"漢".repeat(120));

        assert_eq!(slug, "漢".repeat(33));
        assert!(slug.len() <= MAX_SLUG_LEN);
    }

    #[test]
    fn test_save_article_long_cjk_title() {
        let dir = TempDir::new().unwrap();
        let title = "漢字".repeat(60);

        let first = save_article(&article(&title), dir.path()).unwrap();
        let second = save_article(&article(&title), dir.path()).unwrap();

        assert!(first.markdown_path.exists());
        assert!(second.html_path.exists());
        assert_ne!(first.html_path, second.html_path);
        assert_eq!(parse_markdown_header(&fs::read_to_string(&first.markdown_path).unwrap()).title, title);
    }

    #[test]
    fn test_save_article_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("out");

        let saved = save_article(&article("My Post"), &target).unwrap();

        assert_eq!(saved.markdown_path, target.join("my-post.md"));
        assert_eq!(saved.html_path, target.join("my-post.html"));

        let markdown = fs::read_to_string(&saved.markdown_path).unwrap();
        assert_eq!(parse_markdown_header(&markdown).title, "My Post");
        let html = fs::read_to_string(&saved.html_path).unwrap();
        assert!(html.contains("<title>My Post</title>"));
    }

    #[test]
    fn test_save_article_never_overwrites() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("my-post.html"), "existing").unwrap();

        let first = save_article(&article("My Post"), dir.path()).unwrap();
        let second = save_article(&article("My Post"), dir.path()).unwrap();

        assert_eq!(first.markdown_path, dir.path().join("my-post_1.md"));
        assert_eq!(second.markdown_path, dir.path().join("my-post_2.md"));
        assert_eq!(fs::read_to_string(dir.path().join("my-post.html")).unwrap(), "existing");
    }

    #[test]
    fn test_save_article_untitled_uses_fallback() {
        let dir = TempDir::new().unwrap();
        let saved = save_article(&article("???"), dir.path()).unwrap();

        assert_eq!(saved.markdown_path, dir.path().join("article.md"));
    }

    #[test]
    fn test_save_article_reports_unwritable_dir() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let result = save_article(&article("x"), blocker.join("sub"));
        assert!(matches!(result, Err(FolioError::Persistence { .. })));
    }
}
