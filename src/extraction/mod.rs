//! Declaration extraction from script source.
//!
//! This module handles:
//! - Parsing scripts with tree-sitter and rejecting files with syntax errors
//! - Collecting comments into a line-keyed map before any traversal
//! - Parsing doc comments (`@param`, `@returns`, `@type`, `@extends`, `@deprecated`)
//! - Walking top-level statements into functions, classes and variables
//!
//! Extraction is a pure function of the file text: the same input always
//! yields the same `ExtractionResult`.

mod comments;
mod extractor;
mod jsdoc;
mod treesitter;

pub use comments::{Comment, CommentMap};
pub use extractor::{extract_file, extract_source};
pub use jsdoc::{DocComment, DocTag};
pub use treesitter::{is_function_expression, literal_kind, named_children, ParseError, SourceTree};
