//! Project units ("solutions") and what each one can see.
//!
//! ```text
//! solution_settings.obj ──► settings::SolutionInfo ──► graph::DependencyGraph
//!                                     │                          │
//!                                     └── unit files ──► ScopeGraph (solution_for_path,
//!                                                          references_of, visible_modules)
//! ```

mod graph;
mod manager;
mod settings;

pub use graph::DependencyGraph;
pub use manager::{ModuleRef, ScopeGraph};
pub use settings::{load_solution, parse_settings, solution_from_settings, SolutionInfo};
