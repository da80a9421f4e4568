pub mod article;
pub mod article_parser;
pub mod dom_tree;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod formatters;
pub mod metadata;
pub mod parse;
pub mod preprocess;
pub mod save;
pub mod scoring;
pub mod siteconfig;

pub use article::{ExtractionMethod, ExtractionResult, ParsedContent};
pub use article_parser::{ArticleParser, ParserConfig, ParserConfigBuilder};
pub use error::{FolioError, Result};
pub use extract::{ExtractConfig, HeuristicExtractor, calculate_similarity};
pub use fetch::{FetchConfig, fetch_file, fetch_stdin};
#[cfg(feature = "fetch")]
pub use fetch::fetch_url;
pub use formatters::{MarkdownHeader, parse_markdown_header, render_html, render_markdown};
pub use metadata::JsonLdField;
pub use parse::{Document, Element};
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use save::{SavedArticle, save_article, slugify};
#[doc(hidden)]
pub use scoring::{ContentScore, ScoreConfig, Scorer};
pub use siteconfig::{Directive, ParsingRule, RuleParser, RuleStore};
