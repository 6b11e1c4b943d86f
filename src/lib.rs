//! scriptsense - code intelligence for doc-commented platform scripts
//!
//! Indexes a workspace of JavaScript "solutions" (project units) against a
//! platform reference catalog and answers the questions an editor asks:
//! what members an object has, which modules a unit can see, and whether a
//! call site matches any overload of the function it calls.
//!
//! # Architecture
//!
//! ```text
//! Discovery → Extraction (cached) → Symbol Index ─┐
//!     ↓            ↓                              ├─→ Diagnostic Engine → Diagnostics
//!   ignore     tree-sitter          Scope Graph ──┘         ↓
//!   crate      + doc comments       (petgraph)         overload resolution
//! ```
//!
//! Everything except the diagnostic pass is built once by
//! [`Workspace::open`] and read-only afterwards. Each diagnostic pass owns
//! its scope stack, so concurrent passes never interact.

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod extraction;
pub mod index;
pub mod render;
pub mod scope;
pub mod types;
pub mod typesys;
pub mod workspace;

// Re-export core types
pub use types::{
    Class, ExtractionResult, Function, Param, ScriptObject, SourceLocation, TypeInfo, Variable,
};

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticEngine, Severity};
pub use index::SymbolIndex;
pub use scope::{ModuleRef, ScopeGraph, SolutionInfo};
pub use workspace::Workspace;
