//! Call-site diagnostics.
//!
//! ```text
//! document text ──► SourceTree ──► engine (ScopeStack walk) ──► overload::resolve ──► Diagnostic
//!                                          │
//!                                     SymbolIndex
//! ```

mod engine;
mod overload;
mod scope;

pub use engine::DiagnosticEngine;
pub use overload::{mismatches, resolve, ResolveOptions};
pub use scope::ScopeStack;

use serde::Serialize;
use tree_sitter::Node;

/// Editor severity levels, numbered as the language-server protocol numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "info",
            Severity::Hint => "hint",
        }
    }
}

/// Zero-based line, and column in UTF-16 code units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    /// Position of byte offset `byte` in `source`.
    pub fn at(source: &str, byte: usize) -> Self {
        let before = &source[..byte.min(source.len())];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self {
            line: before.matches('\n').count() as u32,
            character: before[line_start..].encode_utf16().count() as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Position,
    pub end: Position,
}

impl SourceRange {
    /// Range covered by a syntax node of `source`.
    pub fn of(source: &str, node: Node<'_>) -> Self {
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start: Position::at(source, node.start_byte()),
            end: Position::at(source, node.end_byte()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub range: SourceRange,
    pub severity: Severity,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_counts_utf16_units() {
        let source = "a\nxé😀y";
        assert_eq!(Position::at(source, 0), Position { line: 0, character: 0 });
        assert_eq!(Position::at(source, 2), Position { line: 1, character: 0 });
        // 'x' (1) + 'é' (1) + '😀' (2)
        let y = source.find('y').unwrap();
        assert_eq!(Position::at(source, y), Position { line: 1, character: 4 });
        assert_eq!(Position::at(source, 999).line, 1);
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::Error.label(), "error");
        assert_eq!(Severity::Error as u8, 1);
    }
}
