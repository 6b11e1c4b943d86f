//! Tree-sitter parsing for platform scripts.
//!
//! Scripts are plain JavaScript, so the `tree-sitter-javascript` grammar is
//! used as-is. Parsing is the first of two passes: `SourceTree::parse`
//! produces the syntax tree *and* an immutable `CommentMap` (collected with a
//! `(comment)` query), and every later traversal only reads both.
//!
//! Tree-sitter recovers from syntax errors, but a tree that contains error
//! nodes is rejected here: the analyzers only work on well-formed files.

use std::cell::RefCell;

use once_cell::sync::Lazy;
use streaming_iterator::StreamingIterator;
use thiserror::Error;
use tree_sitter::{Language, Node, Parser as TsParser, Query, QueryCursor, Tree};

use super::comments::{Comment, CommentMap};
use crate::typesys::LiteralKind;

static LANGUAGE: Lazy<Language> = Lazy::new(|| tree_sitter_javascript::LANGUAGE.into());

/// Captures every comment node, wherever it appears.
static COMMENT_QUERY: Lazy<Query> = Lazy::new(|| {
    Query::new(&LANGUAGE, "(comment) @comment").expect("comment query compiles against the grammar")
});

thread_local! {
    /// Thread-local parser (tree-sitter parsers are not thread-safe)
    static PARSER: RefCell<TsParser> = RefCell::new(TsParser::new());
}

/// Why a source file could not be analyzed.
#[derive(Debug, Error)]
pub enum ParseError {
    /// 1-based position of the first error node.
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },
    #[error("failed to load the script grammar: {0}")]
    Grammar(String),
    #[error("parser produced no syntax tree")]
    NoTree,
}

/// A parsed, error-free source file plus its comments.
pub struct SourceTree<'s> {
    source: &'s str,
    tree: Tree,
    comments: CommentMap,
}

impl<'s> SourceTree<'s> {
    pub fn parse(source: &'s str) -> Result<Self, ParseError> {
        let tree = PARSER.with(|parser| {
            let mut parser = parser.borrow_mut();
            parser
                .set_language(&LANGUAGE)
                .map_err(|e| ParseError::Grammar(e.to_string()))?;
            parser.parse(source, None).ok_or(ParseError::NoTree)
        })?;

        let root = tree.root_node();
        if root.has_error() {
            let at = first_error(root).unwrap_or(root).start_position();
            return Err(ParseError::Syntax {
                line: at.row + 1,
                column: at.column + 1,
            });
        }

        let comments = collect_comments(source, root);
        Ok(Self {
            source,
            tree,
            comments,
        })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Source text covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &'s str {
        &self.source[node.byte_range()]
    }

    pub fn comments(&self) -> &CommentMap {
        &self.comments
    }

    /// The comment attached to the declaration starting at `node`.
    pub fn comment_for(&self, node: Node<'_>) -> Option<&Comment> {
        self.comments.attached_to(node.start_position().row)
    }
}

fn collect_comments(source: &str, root: Node<'_>) -> CommentMap {
    let mut found = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&COMMENT_QUERY, root, source.as_bytes());
    while let Some(m) = matches.next() {
        for capture in m.captures {
            let node = capture.node;
            let rest_of_line = source[node.end_byte()..].lines().next().unwrap_or("");
            found.push(Comment {
                text: source[node.byte_range()].to_string(),
                start_line: node.start_position().row,
                end_line: node.end_position().row,
                ends_line: rest_of_line.trim().is_empty(),
            });
        }
    }
    CommentMap::from_comments(found)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}

/// Named children of `node`, skipping comments.
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Node kinds of function-valued expressions.
pub fn is_function_expression(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "function_expression" | "function" | "arrow_function" | "generator_function"
    )
}

/// Literal category of an expression node, if it is a literal.
pub fn literal_kind(node: Node<'_>) -> Option<LiteralKind> {
    match node.kind() {
        "string" | "template_string" => Some(LiteralKind::String),
        "number" => Some(LiteralKind::Number),
        "true" | "false" => Some(LiteralKind::Boolean),
        "null" => Some(LiteralKind::Null),
        "regex" => Some(LiteralKind::Regex),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_source() {
        let tree = SourceTree::parse("var a = 1;\nfunction f() {}\n").unwrap();
        let kinds: Vec<&str> = named_children(tree.root()).iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec!["variable_declaration", "function_declaration"]);
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        let err = SourceTree::parse("var a = ;\n").err().expect("should fail");
        match err {
            ParseError::Syntax { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_comments_are_collected() {
        let source = "/** doc */\nvar a = 1;\n// tail\n";
        let tree = SourceTree::parse(source).unwrap();
        assert_eq!(tree.comments().len(), 2);

        let decl = named_children(tree.root())
            .into_iter()
            .find(|n| n.kind() == "variable_declaration")
            .unwrap();
        let comment = tree.comment_for(decl).expect("attached");
        assert_eq!(comment.text, "/** doc */");
    }

    #[test]
    fn test_comment_followed_by_code_does_not_attach() {
        let source = "/** doc */ foo();\nvar a = 1;\n";
        let tree = SourceTree::parse(source).unwrap();
        let decl = named_children(tree.root())
            .into_iter()
            .find(|n| n.kind() == "variable_declaration")
            .unwrap();
        assert!(tree.comment_for(decl).is_none());
    }

    #[test]
    fn test_literal_kinds() {
        let tree = SourceTree::parse("f('a', 1, true, null, /x/, b);").unwrap();
        let call = tree.root().named_child(0).unwrap().named_child(0).unwrap();
        let args = named_children(call.child_by_field_name("arguments").unwrap());
        let kinds: Vec<Option<LiteralKind>> = args.iter().map(|a| literal_kind(*a)).collect();
        assert_eq!(
            kinds,
            vec![
                Some(LiteralKind::String),
                Some(LiteralKind::Number),
                Some(LiteralKind::Boolean),
                Some(LiteralKind::Null),
                Some(LiteralKind::Regex),
                None,
            ]
        );
    }
}
