//! In-memory store backend.
//!
//! Reference backend used by tests and local experimentation. It implements
//! the *write* semantics of terminal output instructions (`$out`, `$merge`)
//! and passes every other stage through untouched; interpreting
//! transformation stages is the real store's query engine, which is out of
//! scope here. A `{"$fail": "reason"}` stage aborts the pipeline, giving
//! failure-path tests a deterministic injection point.

use crate::error::{StoreError, StoreResult};
use crate::traits::StoreDriver;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tf_core::TimeseriesSpec;

/// `(database, collection)` pair.
type Namespace = (String, String);

/// A stored view definition.
#[derive(Debug, Clone)]
pub struct ViewDef {
    pub source: String,
    pub pipeline: Vec<Value>,
}

/// One aggregate call as seen by the store.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub database: String,
    pub collection: String,
    pub stages: Vec<Value>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<Namespace, Vec<Value>>,
    views: HashMap<Namespace, ViewDef>,
    timeseries: HashSet<Namespace>,
    dispatches: Vec<Dispatch>,
}

/// In-memory document store.
pub struct MemoryStore {
    default_database: String,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create a store whose default database is `main`.
    pub fn new() -> Self {
        Self::with_default_database("main")
    }

    pub fn with_default_database(name: impl Into<String>) -> Self {
        Self {
            default_database: name.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn namespace(&self, database: Option<&str>, name: &str) -> Namespace {
        (
            database.unwrap_or(&self.default_database).to_string(),
            name.to_string(),
        )
    }

    /// Insert documents into a collection, creating it if absent.
    pub fn seed(&self, database: Option<&str>, collection: &str, docs: Vec<Value>) {
        let key = self.namespace(database, collection);
        self.lock().collections.entry(key).or_default().extend(docs);
    }

    /// Current contents of a collection (empty if absent).
    pub fn documents(&self, database: Option<&str>, collection: &str) -> Vec<Value> {
        let key = self.namespace(database, collection);
        self.lock().collections.get(&key).cloned().unwrap_or_default()
    }

    /// The stored definition of a view, if one exists.
    pub fn view(&self, database: Option<&str>, name: &str) -> Option<ViewDef> {
        let key = self.namespace(database, name);
        self.lock().views.get(&key).cloned()
    }

    pub fn is_timeseries(&self, database: Option<&str>, name: &str) -> bool {
        let key = self.namespace(database, name);
        self.lock().timeseries.contains(&key)
    }

    /// Every aggregate call dispatched so far, in order.
    pub fn dispatches(&self) -> Vec<Dispatch> {
        self.lock().dispatches.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreDriver for MemoryStore {
    async fn aggregate(
        &self,
        database: Option<&str>,
        collection: &str,
        stages: &[Value],
    ) -> StoreResult<u64> {
        let database = database.unwrap_or(&self.default_database).to_string();
        let mut inner = self.lock();
        inner.dispatches.push(Dispatch {
            database: database.clone(),
            collection: collection.to_string(),
            stages: stages.to_vec(),
        });
        run_pipeline(&mut inner, &database, collection, stages)
    }

    async fn drop_if_exists(&self, database: Option<&str>, name: &str) -> StoreResult<()> {
        let key = self.namespace(database, name);
        let mut inner = self.lock();
        inner.collections.remove(&key);
        inner.views.remove(&key);
        inner.timeseries.remove(&key);
        Ok(())
    }

    async fn create_view(
        &self,
        database: Option<&str>,
        name: &str,
        source: &str,
        pipeline: &[Value],
    ) -> StoreResult<()> {
        let key = self.namespace(database, name);
        let mut inner = self.lock();
        if inner.collections.contains_key(&key) || inner.views.contains_key(&key) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        inner.views.insert(
            key,
            ViewDef {
                source: source.to_string(),
                pipeline: pipeline.to_vec(),
            },
        );
        Ok(())
    }

    async fn exists(&self, database: Option<&str>, name: &str) -> StoreResult<bool> {
        let key = self.namespace(database, name);
        let inner = self.lock();
        Ok(inner.collections.contains_key(&key) || inner.views.contains_key(&key))
    }

    async fn create_timeseries(
        &self,
        database: Option<&str>,
        name: &str,
        spec: &TimeseriesSpec,
    ) -> StoreResult<()> {
        let key = self.namespace(database, name);
        let mut inner = self.lock();
        if inner.collections.contains_key(&key) || inner.views.contains_key(&key) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        if spec.time_field.is_empty() {
            return Err(StoreError::InvalidStage(
                "time-series spec requires a time field".to_string(),
            ));
        }
        inner.collections.insert(key.clone(), Vec::new());
        inner.timeseries.insert(key);
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}

/// Drive a pipeline: pass transformation stages through, apply write
/// instructions, honor `$fail` injections.
fn run_pipeline(
    inner: &mut Inner,
    database: &str,
    collection: &str,
    stages: &[Value],
) -> StoreResult<u64> {
    let source = (database.to_string(), collection.to_string());
    let docs = inner.collections.get(&source).cloned().unwrap_or_default();

    for stage in stages {
        let Some(obj) = stage.as_object() else {
            return Err(StoreError::InvalidStage(stage.to_string()));
        };
        if let Some(reason) = obj.get("$fail") {
            let message = reason.as_str().unwrap_or("injected failure").to_string();
            return Err(StoreError::Execution(message));
        }
        if let Some(target) = obj.get("$out") {
            // Full overwrite, applied atomically at the end of the stream.
            let destination = parse_namespace(target, database)?;
            inner.collections.insert(destination, docs.clone());
        } else if let Some(merge) = obj.get("$merge") {
            apply_merge(inner, &docs, merge, database)?;
        }
    }

    Ok(docs.len() as u64)
}

/// `$out`/`$merge.into` accept a bare collection name or `{db, coll}`.
/// A bare name lands in the database being aggregated.
fn parse_namespace(target: &Value, current_database: &str) -> StoreResult<Namespace> {
    match target {
        Value::String(name) => Ok((current_database.to_string(), name.clone())),
        Value::Object(obj) => {
            let db = obj.get("db").and_then(Value::as_str);
            let coll = obj.get("coll").and_then(Value::as_str);
            match (db, coll) {
                (Some(db), Some(coll)) => Ok((db.to_string(), coll.to_string())),
                _ => Err(StoreError::InvalidStage(format!(
                    "output target must have db and coll: {}",
                    target
                ))),
            }
        }
        other => Err(StoreError::InvalidStage(format!(
            "output target must be a name or namespace: {}",
            other
        ))),
    }
}

fn apply_merge(
    inner: &mut Inner,
    docs: &[Value],
    merge: &Value,
    current_database: &str,
) -> StoreResult<()> {
    let spec = merge
        .as_object()
        .ok_or_else(|| StoreError::InvalidStage(merge.to_string()))?;
    let into = spec
        .get("into")
        .ok_or_else(|| StoreError::InvalidStage("$merge without into".to_string()))?;
    let destination = parse_namespace(into, current_database)?;

    let on: Vec<String> = match spec.get("on") {
        None => vec!["_id".to_string()],
        Some(Value::String(field)) => vec![field.clone()],
        Some(Value::Array(fields)) => fields
            .iter()
            .filter_map(|f| f.as_str().map(String::from))
            .collect(),
        Some(other) => {
            return Err(StoreError::InvalidStage(format!(
                "$merge.on must be a field or field list: {}",
                other
            )))
        }
    };
    let when_matched = spec
        .get("whenMatched")
        .and_then(Value::as_str)
        .unwrap_or("merge");
    let when_not_matched = spec
        .get("whenNotMatched")
        .and_then(Value::as_str)
        .unwrap_or("insert");

    // Work on a copy so a mid-stream conflict leaves the destination intact.
    let mut dest = inner
        .collections
        .get(&destination)
        .cloned()
        .unwrap_or_default();

    for doc in docs {
        let matched = dest
            .iter()
            .position(|existing| keys_match(existing, doc, &on));
        match matched {
            Some(idx) => match when_matched {
                "replace" => dest[idx] = doc.clone(),
                "merge" => shallow_merge(&mut dest[idx], doc),
                "keepExisting" => {}
                "fail" => {
                    return Err(StoreError::MergeConflict {
                        collection: destination.1,
                        message: format!("document already exists for keys {:?}", on),
                    })
                }
                other => {
                    return Err(StoreError::InvalidStage(format!(
                        "unknown whenMatched action '{}'",
                        other
                    )))
                }
            },
            None => match when_not_matched {
                "insert" => dest.push(doc.clone()),
                "discard" => {}
                "fail" => {
                    return Err(StoreError::Execution(format!(
                        "no match for keys {:?} in '{}'",
                        on, destination.1
                    )))
                }
                other => {
                    return Err(StoreError::InvalidStage(format!(
                        "unknown whenNotMatched action '{}'",
                        other
                    )))
                }
            },
        }
    }

    inner.collections.insert(destination, dest);
    Ok(())
}

/// All `on` fields equal between two documents.
fn keys_match(existing: &Value, incoming: &Value, on: &[String]) -> bool {
    on.iter()
        .all(|key| existing.get(key) == incoming.get(key))
}

/// Field-level merge; non-object documents are replaced outright.
fn shallow_merge(existing: &mut Value, incoming: &Value) {
    match (existing.as_object_mut(), incoming.as_object()) {
        (Some(dest), Some(src)) => {
            for (k, v) in src {
                dest.insert(k.clone(), v.clone());
            }
        }
        _ => *existing = incoming.clone(),
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
