//! tf-core - Core library for Tideflow
//!
//! This crate provides the model graph: shared types, graph discovery,
//! structural validation, topological level scheduling, materialization
//! strategy, and execution planning. Everything here is pure and
//! synchronous; talking to the backing store is the runner's job.

pub mod discovery;
pub mod error;
pub mod graph;
pub mod materialize;
pub mod model;
pub mod model_name;
pub mod names;
mod newtype_string;
pub mod plan;
pub mod project;
pub mod schedule;
pub mod source;
pub mod stage;
pub mod validate;

pub use discovery::{discover, DiscoveredGraph};
pub use error::{CoreError, CoreResult};
pub use graph::ModelGraph;
pub use materialize::{
    output_action, Materialize, MergeMatched, MergeNotMatched, MergeSpec, OutputAction,
    TimeseriesSpec, WriteMode,
};
pub use model::Model;
pub use model_name::ModelName;
pub use names::{CollectionName, DatabaseName};
pub use plan::ExecutionPlan;
pub use project::{Project, Selection};
pub use source::Source;
pub use stage::{ForeignSource, Stage, SubPipeline};
pub use validate::{validate, IssueKind, ValidationIssue, ValidationReport};
