//! Unit dependency graph.
//!
//! Nodes are unit names, edges point from a unit to the units it references.
//! Visibility is direct only: a unit sees itself and what it names, not what
//! those name in turn.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use super::settings::SolutionInfo;

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    /// Fast lookup: unit name -> NodeIndex
    index: HashMap<String, NodeIndex>,
    /// Units backed by a settings file (referenced-only names are not)
    declared: HashSet<String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_solutions(solutions: &[SolutionInfo]) -> Self {
        let mut graph = Self::new();
        for solution in solutions {
            graph.declare(&solution.name);
            for reference in &solution.references {
                graph.add_reference(&solution.name, reference);
            }
        }
        graph
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Register a unit backed by a settings file.
    pub fn declare(&mut self, name: &str) {
        self.node(name);
        self.declared.insert(name.to_string());
    }

    /// `from` references `to`. Idempotent.
    pub fn add_reference(&mut self, from: &str, to: &str) {
        let from_idx = self.node(from);
        let to_idx = self.node(to);
        if self.graph.find_edge(from_idx, to_idx).is_none() {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    /// Units visible from `name`: itself plus its direct references.
    /// Empty for undeclared units.
    pub fn direct(&self, name: &str) -> BTreeSet<String> {
        if !self.contains(name) {
            return BTreeSet::new();
        }
        let idx = self.index[name];
        let mut visible: BTreeSet<String> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].clone())
            .collect();
        visible.insert(name.to_string());
        visible
    }

    /// Every unit reachable from `name`, excluding `name` itself.
    /// Cycle-safe. Not used for visibility.
    pub fn transitive_closure(&self, name: &str) -> BTreeSet<String> {
        let Some(&start) = self.index.get(name) else {
            return BTreeSet::new();
        };
        let mut reachable = BTreeSet::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(idx) = dfs.next(&self.graph) {
            if idx != start {
                reachable.insert(self.graph[idx].clone());
            }
        }
        reachable
    }

    /// Number of declared units.
    pub fn unit_count(&self) -> usize {
        self.declared.len()
    }

    pub fn reference_count(&self) -> usize {
        self.graph.edge_count()
    }
}
