//! Symbol index: platform catalog + project globals, with fuzzy lookup.
//!
//! ```text
//! catalog.json ──► catalog::Catalog ──────────────┐
//!                                                  ├──► SymbolIndex (lookup, list_names, fuzzy)
//! **/globals.js ──► extraction ──► globals::aggregate ┘
//! ```

mod catalog;
mod fuzzy;
mod globals;
mod store;

pub use catalog::Catalog;
pub use fuzzy::{fuzzy_search, levenshtein};
pub use globals::{aggregate, collect_globals, GlobalsAggregate};
pub use store::{SymbolIndex, GLOBALS_OBJECT};
