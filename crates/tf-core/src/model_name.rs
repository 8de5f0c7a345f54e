//! Strongly-typed model name wrapper.

use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// Strongly-typed wrapper for model names.
    ///
    /// Prevents accidental mixing of model names with collection names or
    /// database names, and lets maps keyed by `ModelName` be queried with a
    /// plain `&str` via `Borrow<str>`.
    pub struct ModelName;
}
