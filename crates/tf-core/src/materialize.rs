//! Materialization configuration and the mapping to output actions.

use crate::model_name::ModelName;
use crate::names::{CollectionName, DatabaseName};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// How (and whether) a model's result is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Materialize {
    /// No output of its own; inlined wherever referenced.
    #[default]
    Ephemeral,
    /// A store-side view defined by the model's pipeline.
    View { database: Option<DatabaseName> },
    /// A written collection.
    Collection {
        database: Option<DatabaseName>,
        mode: WriteMode,
        timeseries: Option<TimeseriesSpec>,
    },
}

impl Materialize {
    /// Collection materialization in the default database.
    pub fn collection(mode: WriteMode) -> Self {
        Materialize::Collection {
            database: None,
            mode,
            timeseries: None,
        }
    }

    /// View materialization in the default database.
    pub fn view() -> Self {
        Materialize::View { database: None }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Materialize::Ephemeral)
    }

    /// Short label used in plan diagrams.
    pub fn kind(&self) -> &'static str {
        match self {
            Materialize::Ephemeral => "ephemeral",
            Materialize::View { .. } => "view",
            Materialize::Collection { .. } => "collection",
        }
    }

    /// The output database, where one applies.
    pub fn database(&self) -> Option<&DatabaseName> {
        match self {
            Materialize::Ephemeral => None,
            Materialize::View { database } => database.as_ref(),
            Materialize::Collection { database, .. } => database.as_ref(),
        }
    }
}

/// Write mode for collection materializations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Destructively replace the destination's entire contents.
    Replace,
    /// Insert-only; a key collision fails the run instead of corrupting an
    /// append-only destination.
    Append,
    /// Replace on `_id` match, insert otherwise.
    Upsert,
    /// Merge keyed on caller-supplied fields.
    Merge(MergeSpec),
}

/// Caller-keyed merge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeSpec {
    /// Identity field(s). Falls back to `_id` when empty.
    pub on: Vec<String>,
    pub when_matched: Option<MergeMatched>,
    pub when_not_matched: Option<MergeNotMatched>,
}

impl MergeSpec {
    pub fn on(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            on: fields.into_iter().map(Into::into).collect(),
            when_matched: None,
            when_not_matched: None,
        }
    }
}

/// Action when a merged document matches an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeMatched {
    Replace,
    Merge,
    KeepExisting,
    Fail,
}

impl MergeMatched {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeMatched::Replace => "replace",
            MergeMatched::Merge => "merge",
            MergeMatched::KeepExisting => "keepExisting",
            MergeMatched::Fail => "fail",
        }
    }
}

/// Action when a merged document matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeNotMatched {
    Insert,
    Discard,
    Fail,
}

impl MergeNotMatched {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeNotMatched::Insert => "insert",
            MergeNotMatched::Discard => "discard",
            MergeNotMatched::Fail => "fail",
        }
    }
}

/// Time-series provisioning options for a destination collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesSpec {
    pub time_field: String,
    pub meta_field: Option<String>,
    pub expire_after_secs: Option<u64>,
}

impl TimeseriesSpec {
    pub fn new(time_field: impl Into<String>) -> Self {
        Self {
            time_field: time_field.into(),
            meta_field: None,
            expire_after_secs: None,
        }
    }
}

/// The concrete output action for one model in one run.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputAction {
    /// Ephemeral: never independently run.
    None,
    /// Drop any same-named view, then (re)create it from the model's
    /// pipeline over the resolved upstream collection.
    CreateView {
        database: Option<DatabaseName>,
        name: CollectionName,
    },
    /// Append `stage` to the model's pipeline and drain; `timeseries`
    /// provisions the destination before first use.
    WriteStage {
        database: Option<DatabaseName>,
        collection: CollectionName,
        stage: Value,
        timeseries: Option<TimeseriesSpec>,
    },
}

/// Map a model's materialization config to its output action.
///
/// Total over `Materialize`; evaluated once per non-ephemeral model per run.
pub fn output_action(name: &ModelName, config: &Materialize) -> OutputAction {
    match config {
        Materialize::Ephemeral => OutputAction::None,
        Materialize::View { database } => OutputAction::CreateView {
            database: database.clone(),
            name: CollectionName::new(name.as_str()),
        },
        Materialize::Collection {
            database,
            mode,
            timeseries,
        } => OutputAction::WriteStage {
            database: database.clone(),
            collection: CollectionName::new(name.as_str()),
            stage: write_stage(name.as_str(), database.as_deref(), mode),
            timeseries: timeseries.clone(),
        },
    }
}

/// Build the terminal write stage for a collection materialization.
fn write_stage(collection: &str, database: Option<&str>, mode: &WriteMode) -> Value {
    let target = match database {
        Some(db) => json!({ "db": db, "coll": collection }),
        None => json!(collection),
    };
    match mode {
        WriteMode::Replace => json!({ "$out": target }),
        WriteMode::Append => json!({ "$merge": {
            "into": target,
            "on": "_id",
            "whenMatched": "fail",
            "whenNotMatched": "insert",
        } }),
        WriteMode::Upsert => json!({ "$merge": {
            "into": target,
            "on": "_id",
            "whenMatched": "replace",
            "whenNotMatched": "insert",
        } }),
        WriteMode::Merge(spec) => {
            let on = match spec.on.as_slice() {
                [] => json!("_id"),
                [single] => json!(single),
                many => json!(many),
            };
            json!({ "$merge": {
                "into": target,
                "on": on,
                "whenMatched": spec.when_matched.unwrap_or(MergeMatched::Replace).as_str(),
                "whenNotMatched": spec
                    .when_not_matched
                    .unwrap_or(MergeNotMatched::Insert)
                    .as_str(),
            } })
        }
    }
}

#[cfg(test)]
#[path = "materialize_test.rs"]
mod tests;
