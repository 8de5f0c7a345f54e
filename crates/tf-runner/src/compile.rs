//! Per-model compilation.
//!
//! Turns a model into everything the executor needs to dispatch it: the
//! resolved read namespace, the fully rendered stage list (upstream
//! ephemeral chains spliced in front, embedded foreign references resolved
//! to concrete collection names), and the output action. Pure; runs before
//! any store interaction so structural problems fail the run up front.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tf_core::stage::set_body_field;
use tf_core::{
    output_action, CoreError, CoreResult, Materialize, Model, ModelName, OutputAction, Source,
    Stage,
};

/// A model ready for dispatch.
#[derive(Debug, Clone)]
pub(crate) struct CompiledModel {
    pub(crate) name: ModelName,
    pub(crate) read_database: Option<String>,
    pub(crate) read_collection: String,
    /// Spliced upstream stages plus the model's own, rendered.
    pub(crate) stages: Vec<Value>,
    pub(crate) action: OutputAction,
}

type Registry = BTreeMap<ModelName, Arc<Model>>;

pub(crate) fn compile_model(model: &Model, registry: &Registry) -> CoreResult<CompiledModel> {
    let (read_database, read_collection, mut stages) =
        resolve_read(&model.source, registry, &model.name)?;
    stages.extend(render_stages(&model.pipeline, registry, &model.name)?);
    Ok(CompiledModel {
        name: model.name.clone(),
        read_database,
        read_collection,
        stages,
        action: output_action(&model.name, &model.materialize),
    })
}

/// Resolve a read source to `(database, collection, spliced stages)`.
///
/// A materialized upstream reads from its output collection. An ephemeral
/// upstream has no collection: the read falls through to the base of its
/// chain and the chain's stages are spliced in front. Chains are finite
/// because validation already rejected cycles.
fn resolve_read(
    source: &Source,
    registry: &Registry,
    owner: &ModelName,
) -> CoreResult<(Option<String>, String, Vec<Value>)> {
    match source {
        Source::Collection {
            database,
            collection,
        } => Ok((
            database.as_ref().map(|d| d.to_string()),
            collection.to_string(),
            Vec::new(),
        )),
        Source::Model(model) => resolve_model_read(model, registry),
        Source::ModelRef(name) => {
            let model = lookup(registry, owner, name)?;
            resolve_model_read(&model, registry)
        }
    }
}

fn resolve_model_read(
    model: &Arc<Model>,
    registry: &Registry,
) -> CoreResult<(Option<String>, String, Vec<Value>)> {
    match &model.materialize {
        Materialize::Ephemeral => {
            let (database, collection, mut spliced) =
                resolve_read(&model.source, registry, &model.name)?;
            spliced.extend(render_stages(&model.pipeline, registry, &model.name)?);
            Ok((database, collection, spliced))
        }
        materialized => Ok((
            materialized.database().map(|d| d.to_string()),
            model.name.to_string(),
            Vec::new(),
        )),
    }
}

fn render_stages(
    stages: &[Stage],
    registry: &Registry,
    owner: &ModelName,
) -> CoreResult<Vec<Value>> {
    stages
        .iter()
        .map(|stage| render_stage(stage, registry, owner))
        .collect()
}

/// Render one stage: clone the opaque body, then write the resolved foreign
/// collection name and the combined (spliced + nested) sub-pipeline into the
/// fields the compiler declared.
fn render_stage(stage: &Stage, registry: &Registry, owner: &ModelName) -> CoreResult<Value> {
    let mut body = stage.body().clone();
    if let Some(foreign) = stage.foreign() {
        let resolved = resolve_foreign(&foreign.source, registry, owner)?;
        set_body_field(
            &mut body,
            &foreign.collection_field,
            Value::String(resolved.collection),
        );
        match (&foreign.sub_pipeline, resolved.spliced.is_empty()) {
            (Some(sub), _) => {
                let mut combined = resolved.spliced;
                combined.extend(render_stages(&sub.stages, registry, owner)?);
                set_body_field(&mut body, &sub.field, Value::Array(combined));
            }
            (None, true) => {}
            (None, false) => {
                // The reference resolved to an ephemeral chain but the stage
                // shape cannot carry an inlined pipeline.
                let name = resolved
                    .ephemeral
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                return Err(CoreError::EphemeralReference {
                    name,
                    context: format!(
                        "stage field '{}' has no sub-pipeline slot to inline into",
                        foreign.collection_field
                    ),
                });
            }
        }
    }
    Ok(body)
}

struct ResolvedForeign {
    collection: String,
    spliced: Vec<Value>,
    ephemeral: Option<ModelName>,
}

fn resolve_foreign(
    source: &Source,
    registry: &Registry,
    owner: &ModelName,
) -> CoreResult<ResolvedForeign> {
    match source {
        Source::Collection { collection, .. } => Ok(ResolvedForeign {
            collection: collection.to_string(),
            spliced: Vec::new(),
            ephemeral: None,
        }),
        Source::Model(model) => resolve_foreign_model(model, registry),
        Source::ModelRef(name) => {
            let model = lookup(registry, owner, name)?;
            resolve_foreign_model(&model, registry)
        }
    }
}

fn resolve_foreign_model(model: &Arc<Model>, registry: &Registry) -> CoreResult<ResolvedForeign> {
    if model.is_ephemeral() {
        let (_, collection, spliced) = resolve_model_read(model, registry)?;
        Ok(ResolvedForeign {
            collection,
            spliced,
            ephemeral: Some(model.name.clone()),
        })
    } else {
        Ok(ResolvedForeign {
            collection: model.name.to_string(),
            spliced: Vec::new(),
            ephemeral: None,
        })
    }
}

fn lookup(registry: &Registry, owner: &ModelName, name: &ModelName) -> CoreResult<Arc<Model>> {
    registry
        .get(name.as_str())
        .map(Arc::clone)
        .ok_or_else(|| CoreError::MissingReference {
            model: owner.to_string(),
            reference: name.to_string(),
        })
}

#[cfg(test)]
#[path = "compile_test.rs"]
mod tests;
