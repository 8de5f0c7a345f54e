//! Model read sources.

use crate::model::Model;
use crate::model_name::ModelName;
use crate::names::{CollectionName, DatabaseName};
use std::sync::Arc;

/// Where a model reads from.
///
/// An explicit discriminant: callers match exhaustively instead of probing
/// values for model-ness. `Model` links the upstream directly and is what
/// discovery follows; `ModelRef` is late-bound and resolved against the
/// project registry, so a name that never resolves is a validation error
/// rather than a silent miss.
#[derive(Debug, Clone)]
pub enum Source {
    /// A raw collection in the backing store.
    Collection {
        database: Option<DatabaseName>,
        collection: CollectionName,
    },
    /// Another model, linked directly.
    Model(Arc<Model>),
    /// Another model, referenced by name.
    ModelRef(ModelName),
}

impl Source {
    /// Read from a collection in the default database.
    pub fn collection(name: impl Into<String>) -> Self {
        Source::Collection {
            database: None,
            collection: CollectionName::new(name),
        }
    }

    /// Read from a collection in an explicit database.
    pub fn collection_in(database: impl Into<String>, name: impl Into<String>) -> Self {
        Source::Collection {
            database: Some(DatabaseName::new(database)),
            collection: CollectionName::new(name),
        }
    }

    /// Read from another model.
    pub fn model(model: &Arc<Model>) -> Self {
        Source::Model(Arc::clone(model))
    }

    /// Read from another model, referenced by name.
    pub fn model_named(name: impl Into<String>) -> Self {
        Source::ModelRef(ModelName::new(name))
    }

    /// Name of the model this source points at, if any.
    pub fn model_name(&self) -> Option<&ModelName> {
        match self {
            Source::Collection { .. } => None,
            Source::Model(model) => Some(&model.name),
            Source::ModelRef(name) => Some(name),
        }
    }

    /// The directly-linked upstream model, if any.
    pub fn linked_model(&self) -> Option<&Arc<Model>> {
        match self {
            Source::Model(model) => Some(model),
            Source::Collection { .. } | Source::ModelRef(_) => None,
        }
    }
}
