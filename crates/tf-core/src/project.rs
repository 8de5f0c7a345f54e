//! Project assembly: discovery, validation, planning.

use crate::discovery::{discover, DiscoveredGraph};
use crate::error::{CoreError, CoreResult};
use crate::graph::ModelGraph;
use crate::model::Model;
use crate::model_name::ModelName;
use crate::plan::ExecutionPlan;
use crate::schedule::level_schedule;
use crate::validate::{validate, ValidationReport};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Which models a plan or run covers.
///
/// `targets` selects named models plus their transitive dependencies;
/// `exclude` removes names from the requested set (dependencies of retained
/// models are still pulled back in). Both default to everything/nothing.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub targets: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn targets(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            targets: Some(names.into_iter().map(Into::into).collect()),
            exclude: None,
        }
    }

    pub fn exclude(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            targets: None,
            exclude: Some(names.into_iter().map(Into::into).collect()),
        }
    }
}

/// The assembled, validated model graph.
///
/// Construction discovers every model reachable from the given roots
/// (explicit `from` edges and references embedded in pipeline stage trees),
/// validates the result, and rejects structurally-broken configurations
/// before anything can run. Immutable thereafter: adding models means
/// building a new project.
#[derive(Debug)]
pub struct Project {
    name: String,
    models: BTreeMap<ModelName, Arc<Model>>,
    dependencies: BTreeMap<ModelName, Vec<ModelName>>,
    graph: ModelGraph,
}

impl Project {
    /// Assemble a project from root models. All transitive dependencies are
    /// auto-registered. Fails with a single aggregated `[E006]` error if
    /// validation reports any error (warnings are logged, not fatal).
    pub fn new(name: impl Into<String>, roots: Vec<Arc<Model>>) -> CoreResult<Self> {
        let name = name.into();
        let discovered = discover(&roots);
        let report = validate(&discovered);

        for warning in &report.warnings {
            log::warn!("project '{}': {}", name, warning.message);
        }

        if !report.valid {
            let errors: Vec<&str> = report.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(CoreError::ProjectInvalid {
                project: name,
                errors: errors.join("\n"),
            });
        }

        let DiscoveredGraph {
            models,
            dependencies,
            ..
        } = discovered;
        let graph = ModelGraph::build(&dependencies);

        Ok(Self {
            name,
            models,
            dependencies,
            graph,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn models(&self) -> &BTreeMap<ModelName, Arc<Model>> {
        &self.models
    }

    pub fn get_model(&self, name: &str) -> Option<&Arc<Model>> {
        self.models.get(name)
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(|n| n.as_str()).collect()
    }

    /// Direct dependencies per model.
    pub fn dependencies(&self) -> &BTreeMap<ModelName, Vec<ModelName>> {
        &self.dependencies
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// Re-run structural validation as a pure query. A constructed project
    /// is already valid; this re-derives the report for inspection (orphan
    /// warnings included).
    pub fn validate(&self) -> ValidationReport {
        let roots: Vec<Arc<Model>> = self.models.values().map(Arc::clone).collect();
        validate(&discover(&roots))
    }

    /// Resolve a selection to the concrete model set: requested names
    /// (minus exclusions) plus the transitive dependencies of what remains.
    pub fn selection(&self, selection: &Selection) -> CoreResult<BTreeSet<ModelName>> {
        let requested: Vec<ModelName> = match &selection.targets {
            Some(targets) => targets
                .iter()
                .map(|t| self.resolve_name(t))
                .collect::<CoreResult<_>>()?,
            None => self.models.keys().cloned().collect(),
        };

        let excluded: BTreeSet<ModelName> = match &selection.exclude {
            Some(names) => names
                .iter()
                .map(|t| self.resolve_name(t))
                .collect::<CoreResult<_>>()?,
            None => BTreeSet::new(),
        };

        let retained: Vec<ModelName> = requested
            .into_iter()
            .filter(|name| !excluded.contains(name))
            .collect();

        // Close over dependencies: a retained model always runs after its
        // full upstream chain, excluded or not.
        let mut selected: BTreeSet<ModelName> = BTreeSet::new();
        for name in retained {
            selected.extend(self.graph.ancestors(name.as_str()));
            selected.insert(name);
        }

        Ok(selected)
    }

    fn resolve_name(&self, name: &str) -> CoreResult<ModelName> {
        match self.models.get_key_value(name) {
            Some((key, _)) => Ok(key.clone()),
            None => Err(CoreError::TargetNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Compute an execution plan for a selection. Derived fresh on every
    /// call; identical selections on this (immutable) project yield
    /// identical plans.
    pub fn plan(&self, selection: &Selection) -> CoreResult<ExecutionPlan> {
        let subset = self.selection(selection)?;
        let levels = level_schedule(&self.dependencies, &subset)?;

        let kinds: BTreeMap<ModelName, &'static str> = subset
            .iter()
            .filter_map(|name| {
                self.models
                    .get(name.as_str())
                    .map(|m| (name.clone(), m.materialize.kind()))
            })
            .collect();

        let mut edges: Vec<(ModelName, ModelName)> = Vec::new();
        for name in &subset {
            if let Some(deps) = self.dependencies.get(name.as_str()) {
                for dep in deps {
                    if subset.contains(dep) {
                        edges.push((dep.clone(), name.clone()));
                    }
                }
            }
        }

        Ok(ExecutionPlan::new(levels, kinds, edges))
    }
}

#[cfg(test)]
#[path = "project_test.rs"]
mod tests;
