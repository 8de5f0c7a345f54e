//! Graph discovery: walk root models out to the full node set.

use crate::model::Model;
use crate::model_name::ModelName;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// The full node set reachable from a set of roots, plus everything the
/// validator needs: the derived dependency map, names claimed by more than
/// one distinct model object, and by-name references that never resolved.
#[derive(Debug)]
pub struct DiscoveredGraph {
    pub models: BTreeMap<ModelName, Arc<Model>>,
    /// Direct dependencies per model. May name models absent from `models`
    /// (those show up in `unresolved`).
    pub dependencies: BTreeMap<ModelName, Vec<ModelName>>,
    pub duplicates: Vec<ModelName>,
    /// `(model, referenced name)` pairs with no registered model.
    pub unresolved: Vec<(ModelName, ModelName)>,
}

/// Breadth-first walk over `from` edges and foreign references embedded in
/// stage trees (including nested sub-pipelines). Each name registers at most
/// once, so repeated encounters terminate; a second distinct object under a
/// registered name is recorded as a duplicate, never silently resolved.
pub fn discover(roots: &[Arc<Model>]) -> DiscoveredGraph {
    let mut models: BTreeMap<ModelName, Arc<Model>> = BTreeMap::new();
    let mut duplicates: Vec<ModelName> = Vec::new();
    let mut queue: VecDeque<Arc<Model>> = roots.iter().map(Arc::clone).collect();

    while let Some(model) = queue.pop_front() {
        if let Some(existing) = models.get(model.name.as_str()) {
            if !Arc::ptr_eq(existing, &model) && !duplicates.contains(&model.name) {
                duplicates.push(model.name.clone());
            }
            continue;
        }
        log::debug!("discovered model '{}'", model.name);
        for linked in model.linked_models() {
            queue.push_back(Arc::clone(linked));
        }
        models.insert(model.name.clone(), model);
    }

    // Resolve by-name references only after the walk, so a ModelRef may
    // point at any model reachable from any root.
    let mut dependencies = BTreeMap::new();
    let mut unresolved = Vec::new();
    for (name, model) in &models {
        let deps = model.direct_dependencies();
        for dep in &deps {
            if !models.contains_key(dep.as_str()) {
                unresolved.push((name.clone(), dep.clone()));
            }
        }
        dependencies.insert(name.clone(), deps);
    }

    DiscoveredGraph {
        models,
        dependencies,
        duplicates,
        unresolved,
    }
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
