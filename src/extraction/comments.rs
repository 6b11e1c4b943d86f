//! Comments keyed by the line they attach to.
//!
//! A comment attaches to a declaration only when its last line is exactly one
//! line above the declaration's first line, and nothing else follows the
//! comment on that last line.

use std::collections::BTreeMap;

/// One comment as it appears in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Raw text including delimiters
    pub text: String,
    /// 0-based first line
    pub start_line: usize,
    /// 0-based last line
    pub end_line: usize,
    /// No code follows the comment on its last line
    pub ends_line: bool,
}

impl Comment {
    /// `/** ... */` style block.
    pub fn is_doc_block(&self) -> bool {
        self.text.starts_with("/**") && !self.text.starts_with("/**/")
    }
}

/// Immutable map from "line a declaration starts on" to its comment.
#[derive(Debug, Clone, Default)]
pub struct CommentMap {
    by_next_line: BTreeMap<usize, Comment>,
    total: usize,
}

impl CommentMap {
    /// Build from comments in source order. When two comments end on the
    /// same line, the later one wins.
    pub fn from_comments(comments: impl IntoIterator<Item = Comment>) -> Self {
        let mut by_next_line = BTreeMap::new();
        let mut total = 0;
        for comment in comments {
            total += 1;
            if comment.ends_line {
                by_next_line.insert(comment.end_line + 1, comment);
            }
        }
        Self { by_next_line, total }
    }

    /// Comment whose last line is `line - 1`.
    pub fn attached_to(&self, line: usize) -> Option<&Comment> {
        self.by_next_line.get(&line)
    }

    /// Number of comments seen, attached or not.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
