//! Execution plans: ordered parallel-safe levels plus rendering.

use crate::model_name::ModelName;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The ordered levels a run will execute.
///
/// Every selected model appears in exactly one level, and a model's level
/// index is strictly greater than every dependency's. Plans are derived
/// fresh from the immutable graph on every call, never cached.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan {
    levels: Vec<Vec<ModelName>>,
    total_models: usize,
    /// Materialization kind per model, for diagram labels.
    kinds: BTreeMap<ModelName, &'static str>,
    /// Edges restricted to the plan, dependency → dependent.
    edges: Vec<(ModelName, ModelName)>,
}

impl ExecutionPlan {
    pub(crate) fn new(
        levels: Vec<Vec<ModelName>>,
        kinds: BTreeMap<ModelName, &'static str>,
        edges: Vec<(ModelName, ModelName)>,
    ) -> Self {
        let total_models = levels.iter().map(Vec::len).sum();
        Self {
            levels,
            total_models,
            kinds,
            edges,
        }
    }

    pub fn levels(&self) -> &[Vec<ModelName>] {
        &self.levels
    }

    pub fn total_models(&self) -> usize {
        self.total_models
    }

    /// All planned models, level order.
    pub fn models(&self) -> impl Iterator<Item = &ModelName> {
        self.levels.iter().flatten()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models().any(|name| name == model)
    }

    /// Level index of a model, if planned.
    pub fn level_of(&self, model: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.iter().any(|name| name == model))
    }

    /// Render the plan as a DOT digraph: nodes labeled
    /// `name (materialization kind)`, edges `dependency -> dependent`.
    pub fn to_diagram(&self) -> String {
        let mut out = String::from("digraph tideflow {\n  rankdir=LR;\n");
        for name in self.models() {
            let kind = self.kinds.get(name.as_str()).copied().unwrap_or("ephemeral");
            out.push_str(&format!("  \"{}\" [label=\"{} ({})\"];\n", name, name, kind));
        }
        for (dependency, dependent) in &self.edges {
            out.push_str(&format!("  \"{}\" -> \"{}\";\n", dependency, dependent));
        }
        out.push_str("}\n");
        out
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Execution plan: {} models, {} levels",
            self.total_models,
            self.levels.len()
        )?;
        for (idx, level) in self.levels.iter().enumerate() {
            let names: Vec<&str> = level.iter().map(|n| n.as_str()).collect();
            writeln!(f, "  {}. {}", idx + 1, names.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
