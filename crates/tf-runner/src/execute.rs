//! Level-synchronous concurrent executor.

use crate::compile::{compile_model, CompiledModel};
use crate::options::RunOptions;
use crate::report::{ModelStats, RunReport};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tf_core::{CoreResult, OutputAction, Project};
use tf_store::{StoreDriver, StoreResult};
use tokio::sync::Semaphore;

/// Drives validated projects against a store.
pub struct Runner {
    store: Arc<dyn StoreDriver>,
}

struct TaskOutcome {
    name: String,
    duration_ms: u64,
    error: Option<String>,
}

impl Runner {
    pub fn new(store: Arc<dyn StoreDriver>) -> Self {
        Self { store }
    }

    /// Run a project.
    ///
    /// Levels execute sequentially; models within a level run concurrently
    /// and all settle before the failure decision. A failed level stops the
    /// run before the next level; completed levels are not rolled back.
    /// Configuration and target errors return `Err`; execution failures
    /// return `Ok` with `success == false` and the failure list.
    pub async fn run(&self, project: &Project, options: &RunOptions) -> CoreResult<RunReport> {
        let clock = Instant::now();
        let mut report = RunReport::started();

        let plan = project.plan(&options.selection())?;
        let store = options
            .store
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.store));

        // Compile every level up front: structural problems surface before
        // the store is touched at all.
        let mut batches: Vec<Vec<Arc<CompiledModel>>> = Vec::new();
        for level in plan.levels() {
            let mut batch = Vec::new();
            for name in level {
                let Some(model) = project.get_model(name.as_str()) else {
                    log::warn!("planned model '{}' missing from project, skipping", name);
                    continue;
                };
                // Ephemeral models are never independently executed; their
                // stages were spliced into dependents during compilation.
                if model.is_ephemeral() {
                    continue;
                }
                batch.push(Arc::new(compile_model(model, project.models())?));
            }
            batches.push(batch);
        }

        if options.dry_run {
            log::debug!(
                "dry run of '{}': {} models across {} levels, store untouched",
                project.name(),
                plan.total_models(),
                plan.levels().len()
            );
            report.total_duration_ms = clock.elapsed().as_millis() as u64;
            return Ok(report);
        }

        let mut halted = false;
        for batch in batches {
            if batch.is_empty() {
                continue;
            }

            let permits = options.max_concurrency.unwrap_or(batch.len()).max(1);
            let semaphore = Arc::new(Semaphore::new(permits));
            let mut handles = Vec::with_capacity(batch.len());

            for model in batch {
                let store = Arc::clone(&store);
                let semaphore = Arc::clone(&semaphore);
                let callbacks = options.callbacks.clone();
                let database = options.database.clone();

                handles.push(tokio::spawn(async move {
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return TaskOutcome {
                                name: model.name.to_string(),
                                duration_ms: 0,
                                error: Some("semaphore closed".to_string()),
                            }
                        }
                    };

                    callbacks.started(model.name.as_str());
                    let clock = Instant::now();
                    let result = dispatch(store.as_ref(), &model, database.as_deref()).await;
                    let duration_ms = clock.elapsed().as_millis() as u64;

                    match result {
                        Ok(()) => {
                            let stats = ModelStats { duration_ms };
                            callbacks.completed(model.name.as_str(), &stats);
                            TaskOutcome {
                                name: model.name.to_string(),
                                duration_ms,
                                error: None,
                            }
                        }
                        Err(error) => {
                            callbacks.errored(model.name.as_str(), &error);
                            TaskOutcome {
                                name: model.name.to_string(),
                                duration_ms,
                                error: Some(error.to_string()),
                            }
                        }
                    }
                }));
            }

            // Every task in the level settles, success or failure, before
            // the decision to continue.
            let mut level_failed = false;
            for joined in join_all(handles).await {
                match joined {
                    Ok(outcome) => {
                        report.stats.insert(
                            outcome.name.clone(),
                            ModelStats {
                                duration_ms: outcome.duration_ms,
                            },
                        );
                        match outcome.error {
                            None => report.models_run.push(outcome.name),
                            Some(message) => {
                                log::warn!("model '{}' failed: {}", outcome.name, message);
                                report.models_failed.push(outcome.name);
                                level_failed = true;
                            }
                        }
                    }
                    Err(join_error) => {
                        log::warn!("task join error: {}", join_error);
                        level_failed = true;
                    }
                }
            }

            if level_failed {
                halted = true;
                break;
            }
        }

        report.success = !halted;
        report.total_duration_ms = clock.elapsed().as_millis() as u64;
        Ok(report)
    }
}

/// Dispatch one compiled model to the store.
async fn dispatch(
    store: &dyn StoreDriver,
    model: &CompiledModel,
    default_database: Option<&str>,
) -> StoreResult<()> {
    match &model.action {
        // Compiled batches never contain ephemeral models.
        OutputAction::None => Ok(()),
        OutputAction::CreateView { database, name } => {
            let database = database.as_deref().or(default_database);
            store.drop_if_exists(database, name.as_str()).await?;
            store
                .create_view(database, name.as_str(), &model.read_collection, &model.stages)
                .await
        }
        OutputAction::WriteStage {
            database,
            collection,
            stage,
            timeseries,
        } => {
            let out_database = database.as_deref().or(default_database);
            if let Some(spec) = timeseries {
                // One-time provisioning: only when the destination is absent.
                if !store.exists(out_database, collection.as_str()).await? {
                    store
                        .create_timeseries(out_database, collection.as_str(), spec)
                        .await?;
                }
            }

            let mut stages = model.stages.clone();
            stages.push(stage.clone());
            let read_database = model.read_database.as_deref().or(default_database);
            // An output-only pipeline yields no rows but must still be
            // driven to completion.
            store
                .aggregate(read_database, &model.read_collection, &stages)
                .await
                .map(|_| ())
        }
    }
}
