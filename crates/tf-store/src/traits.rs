//! Store driver trait definition

use crate::error::StoreResult;
use async_trait::async_trait;
use serde_json::Value;
use tf_core::TimeseriesSpec;

/// Backing-store abstraction for Tideflow.
///
/// Implementations must be Send + Sync; one handle is shared read-only
/// across concurrent model tasks. Write isolation between concurrently
/// materializing destinations is the store's responsibility.
#[async_trait]
pub trait StoreDriver: Send + Sync {
    /// Execute an aggregation pipeline against a source collection and
    /// drain it to completion. Returns the number of documents that left
    /// the pipeline; zero is normal for output-only pipelines, which must
    /// still be driven to completion.
    async fn aggregate(
        &self,
        database: Option<&str>,
        collection: &str,
        stages: &[Value],
    ) -> StoreResult<u64>;

    /// Drop a collection or view if it exists. Idempotent.
    async fn drop_if_exists(&self, database: Option<&str>, name: &str) -> StoreResult<()>;

    /// Create a view named `name` defined by `pipeline` over `source`.
    async fn create_view(
        &self,
        database: Option<&str>,
        name: &str,
        source: &str,
        pipeline: &[Value],
    ) -> StoreResult<()>;

    /// Check whether a collection or view exists.
    async fn exists(&self, database: Option<&str>, name: &str) -> StoreResult<bool>;

    /// Create a time-series collection. Fails if the name already exists.
    async fn create_timeseries(
        &self,
        database: Option<&str>,
        name: &str,
        spec: &TimeseriesSpec,
    ) -> StoreResult<()>;

    /// Store type identifier for logging
    fn store_type(&self) -> &'static str;
}
