//! Store-side name wrappers.

use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// Strongly-typed wrapper for collection (and view) names.
    pub struct CollectionName;
}

define_newtype_string! {
    /// Strongly-typed wrapper for database names.
    pub struct DatabaseName;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_name() {
        let name = CollectionName::new("raw_orders");
        assert_eq!(name.as_str(), "raw_orders");
        assert!(CollectionName::try_new("").is_none());
    }

    #[test]
    fn test_database_name() {
        let name = DatabaseName::new("analytics");
        assert_eq!(name, "analytics");
    }
}
