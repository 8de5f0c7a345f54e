//! Run options and observability callbacks.

use crate::report::ModelStats;
use std::fmt;
use std::sync::Arc;
use tf_core::Selection;
use tf_store::{StoreDriver, StoreError};

pub type ModelStartFn = dyn Fn(&str) + Send + Sync;
pub type ModelCompleteFn = dyn Fn(&str, &ModelStats) + Send + Sync;
pub type ModelErrorFn = dyn Fn(&str, &StoreError) + Send + Sync;

/// Observability side channel. Callbacks are invoked from the task that ran
/// the model and never affect control flow.
#[derive(Clone, Default)]
pub struct RunCallbacks {
    pub on_model_start: Option<Arc<ModelStartFn>>,
    pub on_model_complete: Option<Arc<ModelCompleteFn>>,
    pub on_model_error: Option<Arc<ModelErrorFn>>,
}

impl RunCallbacks {
    pub(crate) fn started(&self, name: &str) {
        if let Some(cb) = &self.on_model_start {
            cb(name);
        }
    }

    pub(crate) fn completed(&self, name: &str, stats: &ModelStats) {
        if let Some(cb) = &self.on_model_complete {
            cb(name, stats);
        }
    }

    pub(crate) fn errored(&self, name: &str, error: &StoreError) {
        if let Some(cb) = &self.on_model_error {
            cb(name, error);
        }
    }
}

impl fmt::Debug for RunCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunCallbacks")
            .field("on_model_start", &self.on_model_start.is_some())
            .field("on_model_complete", &self.on_model_complete.is_some())
            .field("on_model_error", &self.on_model_error.is_some())
            .finish()
    }
}

/// Options for one `run()` invocation.
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Run only these models (plus their transitive dependencies).
    pub targets: Option<Vec<String>>,
    /// Run everything except these models (dependencies of retained models
    /// are still included).
    pub exclude: Option<Vec<String>>,
    /// Compute and return the plan without touching the store.
    pub dry_run: bool,
    /// Default database for models without an explicit namespace.
    pub database: Option<String>,
    /// Store handle override for this run.
    pub store: Option<Arc<dyn StoreDriver>>,
    /// Upper bound on concurrently executing models within a level.
    /// Defaults to the level width.
    pub max_concurrency: Option<usize>,
    pub callbacks: RunCallbacks,
}

impl RunOptions {
    pub fn targets(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            targets: Some(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    pub(crate) fn selection(&self) -> Selection {
        Selection {
            targets: self.targets.clone(),
            exclude: self.exclude.clone(),
        }
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("targets", &self.targets)
            .field("exclude", &self.exclude)
            .field("dry_run", &self.dry_run)
            .field("database", &self.database)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}
