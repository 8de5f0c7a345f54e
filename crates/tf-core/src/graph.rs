//! Dependency graph queries over the discovered model set.

use crate::model_name::ModelName;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A directed graph of model dependencies.
///
/// Edges run dependency → dependent, so walking `Outgoing` edges yields
/// downstream consumers and `Incoming` edges yields upstream inputs.
/// Construction does not check acyclicity; the validator owns that.
#[derive(Debug)]
pub struct ModelGraph {
    graph: DiGraph<ModelName, ()>,
    node_map: HashMap<ModelName, NodeIndex>,
}

impl ModelGraph {
    /// Build from a dependency map (`model → direct dependencies`).
    /// Dependencies absent from the map (already flagged by validation) are
    /// skipped.
    pub fn build(dependencies: &BTreeMap<ModelName, Vec<ModelName>>) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for name in dependencies.keys() {
            let idx = graph.add_node(name.clone());
            node_map.insert(name.clone(), idx);
        }

        for (name, deps) in dependencies {
            let to = node_map[name];
            for dep in deps {
                if let Some(&from) = node_map.get(dep.as_str()) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Self { graph, node_map }
    }

    pub fn contains(&self, model: &str) -> bool {
        self.node_map.contains_key(model)
    }

    /// Get direct dependencies of a model
    pub fn dependencies(&self, model: &str) -> Vec<ModelName> {
        self.neighbors(model, petgraph::Direction::Incoming)
    }

    /// Get direct dependents of a model
    pub fn dependents(&self, model: &str) -> Vec<ModelName> {
        self.neighbors(model, petgraph::Direction::Outgoing)
    }

    /// Get all ancestors (transitive dependencies) of a model
    pub fn ancestors(&self, model: &str) -> Vec<ModelName> {
        self.reachable(model, petgraph::Direction::Incoming)
    }

    /// Get all descendants (transitive dependents) of a model
    pub fn descendants(&self, model: &str) -> Vec<ModelName> {
        self.reachable(model, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, model: &str, direction: petgraph::Direction) -> Vec<ModelName> {
        let Some(&idx) = self.node_map.get(model) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, direction)
            .map(|e| {
                let other = match direction {
                    petgraph::Direction::Incoming => e.source(),
                    petgraph::Direction::Outgoing => e.target(),
                };
                self.graph[other].clone()
            })
            .collect()
    }

    fn reachable(&self, model: &str, direction: petgraph::Direction) -> Vec<ModelName> {
        let Some(&start) = self.node_map.get(model) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            for edge in self.graph.edges_directed(idx, direction) {
                let neighbor = match direction {
                    petgraph::Direction::Incoming => edge.source(),
                    petgraph::Direction::Outgoing => edge.target(),
                };
                if visited.insert(neighbor) {
                    result.push(self.graph[neighbor].clone());
                    stack.push(neighbor);
                }
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
