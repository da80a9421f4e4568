//! Per-domain extraction rules.
//!
//! Rules are plain text files of `key: value` lines named after the domain
//! they apply to (`example.com.txt`). Their title, body, date and author
//! paths are XPath 1.0 expressions evaluated through [`XPathIndex`].

pub mod directives;
pub mod loader;
pub mod parser;
pub mod processing;
pub mod xpath;

pub use directives::{Directive, ParsingRule};
pub use loader::RuleStore;
pub use parser::RuleParser;
pub use processing::{strip_document, strip_id_or_class_expression};
pub use xpath::{XPathIndex, find_all, find_one, evaluate_string, string_literal};
