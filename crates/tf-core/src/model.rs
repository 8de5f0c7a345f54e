//! Model representation

use crate::materialize::Materialize;
use crate::model_name::ModelName;
use crate::source::Source;
use crate::stage::{referenced_sources, Stage};
use std::sync::Arc;

/// A named transformation unit: read source, pipeline, materialization.
///
/// Models are constructed once and shared immutably via [`Arc`]; graph edges
/// are the `Arc` links (or late-bound name references) inside [`Source`]
/// values, both on the `from` edge and embedded in pipeline stages.
#[derive(Debug)]
pub struct Model {
    pub name: ModelName,
    pub source: Source,
    /// Opaque stage list produced by the pipeline compiler.
    pub pipeline: Vec<Stage>,
    pub materialize: Materialize,
}

impl Model {
    /// An ephemeral model (the default materialization).
    pub fn new(name: impl Into<String>, source: Source, pipeline: Vec<Stage>) -> Arc<Self> {
        Self::materialized(name, source, pipeline, Materialize::Ephemeral)
    }

    /// A model with an explicit materialization.
    pub fn materialized(
        name: impl Into<String>,
        source: Source,
        pipeline: Vec<Stage>,
        materialize: Materialize,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: ModelName::new(name),
            source,
            pipeline,
            materialize,
        })
    }

    pub fn is_ephemeral(&self) -> bool {
        self.materialize.is_ephemeral()
    }

    /// Every source this model reads: the `from` edge plus all foreign
    /// sources embedded in the stage tree.
    pub fn sources(&self) -> Vec<&Source> {
        let mut out = vec![&self.source];
        out.extend(referenced_sources(&self.pipeline));
        out
    }

    /// Directly-linked upstream models (discovery follows these).
    pub fn linked_models(&self) -> Vec<&Arc<Model>> {
        self.sources()
            .into_iter()
            .filter_map(Source::linked_model)
            .collect()
    }

    /// Names of all direct dependencies, deduplicated, declaration order.
    pub fn direct_dependencies(&self) -> Vec<ModelName> {
        let mut deps: Vec<ModelName> = Vec::new();
        for source in self.sources() {
            if let Some(name) = source.model_name() {
                if !deps.iter().any(|d| d == name.as_str()) {
                    deps.push(name.clone());
                }
            }
        }
        deps
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
