//! Aggregation pipeline stages as emitted by the pipeline compiler.
//!
//! Stage bodies are opaque JSON documents; the orchestrator never interprets
//! them. The only structured parts are the optional [`ForeignSource`] slot
//! (how join/union-style stages reference another collection or model) and
//! its nested sub-pipeline. Scanning and rendering walk exactly that
//! structure, so traversal terminates on the stage tree itself.

use crate::source::Source;
use serde_json::Value;

/// One pipeline stage.
#[derive(Debug, Clone)]
pub struct Stage {
    body: Value,
    foreign: Option<ForeignSource>,
}

/// A foreign source embedded in a stage (join/union-style stages).
#[derive(Debug, Clone)]
pub struct ForeignSource {
    /// The referenced collection or model.
    pub source: Source,
    /// Dot path in the stage body that receives the resolved collection
    /// name at execution time, e.g. `$lookup.from`.
    pub collection_field: String,
    /// Nested sub-pipeline attached to the stage, if the stage shape has
    /// one. Its stages may reference further models, recursively.
    pub sub_pipeline: Option<SubPipeline>,
}

/// A nested sub-pipeline and the body field it renders into.
#[derive(Debug, Clone)]
pub struct SubPipeline {
    /// Dot path in the stage body, e.g. `$lookup.pipeline`.
    pub field: String,
    pub stages: Vec<Stage>,
}

impl Stage {
    /// A plain stage with no foreign reference.
    pub fn new(body: Value) -> Self {
        Self {
            body,
            foreign: None,
        }
    }

    /// A stage referencing a foreign collection or model.
    pub fn with_foreign(body: Value, foreign: ForeignSource) -> Self {
        Self {
            body,
            foreign: Some(foreign),
        }
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn foreign(&self) -> Option<&ForeignSource> {
        self.foreign.as_ref()
    }
}

impl ForeignSource {
    pub fn new(source: Source, collection_field: impl Into<String>) -> Self {
        Self {
            source,
            collection_field: collection_field.into(),
            sub_pipeline: None,
        }
    }

    /// Attach a nested sub-pipeline rendered into `field`.
    pub fn with_pipeline(mut self, field: impl Into<String>, stages: Vec<Stage>) -> Self {
        self.sub_pipeline = Some(SubPipeline {
            field: field.into(),
            stages,
        });
        self
    }
}

/// Collect every foreign source in a stage tree, descending into nested
/// sub-pipelines.
pub fn referenced_sources(stages: &[Stage]) -> Vec<&Source> {
    let mut out = Vec::new();
    collect_sources(stages, &mut out);
    out
}

fn collect_sources<'a>(stages: &'a [Stage], out: &mut Vec<&'a Source>) {
    for stage in stages {
        if let Some(foreign) = &stage.foreign {
            out.push(&foreign.source);
            if let Some(sub) = &foreign.sub_pipeline {
                collect_sources(&sub.stages, out);
            }
        }
    }
}

/// Set a dot-path field inside a stage body, creating intermediate objects.
///
/// Used when rendering: resolved collection names and inlined sub-pipelines
/// are written back into the opaque body at the paths the compiler declared.
pub fn set_body_field(body: &mut Value, path: &str, value: Value) {
    let mut current = body;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if parts.peek().is_none() {
            map.insert(part.to_string(), value);
            return;
        }
        current = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
}

#[cfg(test)]
#[path = "stage_test.rs"]
mod tests;
