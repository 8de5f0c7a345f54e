//! Structural validation of a discovered graph.
//!
//! Pure: takes a [`DiscoveredGraph`], returns a [`ValidationReport`], never
//! throws. Project construction turns any reported error into a fail-fast
//! rejection; callers can also re-run validation as a query.

use crate::discovery::DiscoveredGraph;
use crate::error::CoreError;
use crate::model_name::ModelName;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// What a validation issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DuplicateName,
    MissingRef,
    Cycle,
    Orphan,
}

/// One validation finding.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
    pub model_names: Vec<ModelName>,
}

/// The validator's verdict on a graph.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a discovered graph: duplicate names, missing references, cycles
/// (errors), then orphans (warning).
pub fn validate(graph: &DiscoveredGraph) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for name in &graph.duplicates {
        errors.push(ValidationIssue {
            kind: IssueKind::DuplicateName,
            message: CoreError::DuplicateModel {
                name: name.to_string(),
            }
            .to_string(),
            model_names: vec![name.clone()],
        });
    }

    for (model, reference) in &graph.unresolved {
        errors.push(ValidationIssue {
            kind: IssueKind::MissingRef,
            message: CoreError::MissingReference {
                model: model.to_string(),
                reference: reference.to_string(),
            }
            .to_string(),
            model_names: vec![model.clone(), reference.clone()],
        });
    }

    if let Some(cycle) = find_cycle(&graph.dependencies) {
        let mut path: Vec<String> = cycle.iter().map(|n| n.to_string()).collect();
        path.push(cycle[0].to_string());
        errors.push(ValidationIssue {
            kind: IssueKind::Cycle,
            message: CoreError::CircularDependency {
                cycle: path.join(" -> "),
            }
            .to_string(),
            model_names: cycle,
        });
    }

    let sinks = orphan_models(&graph.dependencies);
    if sinks.len() > 1 {
        warnings.push(ValidationIssue {
            kind: IssueKind::Orphan,
            message: format!(
                "{} models have no downstream dependent: {}",
                sinks.len(),
                sinks
                    .iter()
                    .map(|n| n.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            model_names: sinks,
        });
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Find one dependency cycle, reported as the minimal ordered name sequence
/// (`[a, b, c]` meaning a → b → c → a). Depth-first search with an explicit
/// recursion stack; the first back edge found closes the cycle.
fn find_cycle(dependencies: &BTreeMap<ModelName, Vec<ModelName>>) -> Option<Vec<ModelName>> {
    let mut finished: HashSet<&ModelName> = HashSet::new();

    for start in dependencies.keys() {
        if finished.contains(start) {
            continue;
        }
        // (node, next dependency index to visit)
        let mut stack: Vec<(&ModelName, usize)> = vec![(start, 0)];
        let mut on_stack: HashSet<&ModelName> = HashSet::new();
        on_stack.insert(start);

        while let Some(&(node, next)) = stack.last() {
            let deps = dependencies.get(node.as_str()).map(Vec::as_slice);
            match deps.and_then(|d| d.get(next)) {
                Some(dep) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.1 += 1;
                    }
                    if on_stack.contains(dep) {
                        // Back edge: the cycle is the stack slice from the
                        // first occurrence of `dep` to the top.
                        let pos = stack
                            .iter()
                            .position(|(n, _)| *n == dep)
                            .unwrap_or(0);
                        return Some(
                            stack[pos..].iter().map(|(n, _)| (*n).clone()).collect(),
                        );
                    }
                    if !finished.contains(dep) && dependencies.contains_key(dep.as_str()) {
                        on_stack.insert(dep);
                        stack.push((dep, 0));
                    }
                }
                None => {
                    stack.pop();
                    on_stack.remove(node);
                    finished.insert(node);
                }
            }
        }
    }
    None
}

/// Models no other model depends on. A single terminal target is normal;
/// several may indicate an accidental disconnection, hence the warning.
fn orphan_models(dependencies: &BTreeMap<ModelName, Vec<ModelName>>) -> Vec<ModelName> {
    let depended_on: HashSet<&ModelName> = dependencies.values().flatten().collect();
    dependencies
        .keys()
        .filter(|name| !depended_on.contains(name))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
