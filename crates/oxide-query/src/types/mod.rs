//! Logical types: per-query type maps, the type registry and value casters.

mod caster;
mod registry;

pub use caster::{CasterHandle, DatabaseTypeCaster, StringTypeCaster, TypeCaster};
pub use registry::{
    BinaryType, BooleanType, DateTimeType, DateType, FloatType, IntegerType, JsonType, SqlType,
    StringType, TypeRegistry,
};

use indexmap::IndexMap;

/// Suffix marking a logical type as a collection of that type.
pub const MULTIPLE_SUFFIX: &str = "[]";

/// Returns `true` when `type_name` denotes a collection (`integer[]`).
#[must_use]
pub fn is_multiple(type_name: Option<&str>) -> bool {
    type_name.is_some_and(|t| t.contains(MULTIPLE_SUFFIX))
}

/// Strips the collection suffix from a type name.
#[must_use]
pub fn base_type(type_name: &str) -> &str {
    type_name.trim_end_matches(MULTIPLE_SUFFIX)
}

/// Maps column names (or positions) to logical type names.
///
/// `defaults` hold the query-wide typing. `types` are single-use overrides
/// that shadow the defaults for one call; setting them never touches the
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMap {
    defaults: IndexMap<String, String>,
    types: IndexMap<String, String>,
}

impl TypeMap {
    /// Creates a type map with the given defaults.
    #[must_use]
    pub fn new<I, K, V>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            defaults: collect(defaults),
            types: IndexMap::new(),
        }
    }

    /// Replaces the default types.
    pub fn set_defaults<I, K, V>(&mut self, defaults: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.defaults = collect(defaults);
        self
    }

    /// Merges new default types, overwriting existing keys.
    pub fn add_defaults<I, K, V>(&mut self, defaults: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.defaults.extend(collect(defaults));
        self
    }

    /// Replaces the single-use override types.
    pub fn set_types<I, K, V>(&mut self, types: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.types = collect(types);
        self
    }

    /// Returns a copy of this map with the given override types.
    #[must_use]
    pub fn with_types<I, K, V>(&self, types: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = self.clone();
        map.set_types(types);
        map
    }

    /// The default types.
    #[must_use]
    pub const fn defaults(&self) -> &IndexMap<String, String> {
        &self.defaults
    }

    /// The single-use override types.
    #[must_use]
    pub const fn types(&self) -> &IndexMap<String, String> {
        &self.types
    }

    /// Resolves the type of a column: overrides first, then defaults.
    #[must_use]
    pub fn type_of(&self, column: &str) -> Option<&str> {
        self.types
            .get(column)
            .or_else(|| self.defaults.get(column))
            .map(String::as_str)
    }

    /// Returns overrides merged over defaults.
    #[must_use]
    pub fn to_map(&self) -> IndexMap<String, String> {
        let mut merged = self.defaults.clone();
        merged.extend(self.types.clone());
        merged
    }
}

fn collect<I, K, V>(items: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    items
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_shadow_defaults() {
        let mut map = TypeMap::new([("id", "integer"), ("created", "datetime")]);
        map.set_types([("id", "string")]);
        assert_eq!(map.type_of("id"), Some("string"));
        assert_eq!(map.type_of("created"), Some("datetime"));
        assert_eq!(map.defaults().get("id").map(String::as_str), Some("integer"));
        assert_eq!(map.type_of("missing"), None);
    }

    #[test]
    fn test_with_types_does_not_mutate_original() {
        let map = TypeMap::new([("id", "integer")]);
        let local = map.with_types([("id", "float")]);
        assert_eq!(local.type_of("id"), Some("float"));
        assert_eq!(map.type_of("id"), Some("integer"));
    }

    #[test]
    fn test_to_map_merges() {
        let mut map = TypeMap::new([("a", "integer"), ("b", "string")]);
        map.set_types([("b", "text")]);
        let merged = map.to_map();
        assert_eq!(merged.get("a").map(String::as_str), Some("integer"));
        assert_eq!(merged.get("b").map(String::as_str), Some("text"));
    }

    #[test]
    fn test_multiple_helpers() {
        assert!(is_multiple(Some("integer[]")));
        assert!(!is_multiple(Some("integer")));
        assert!(!is_multiple(None));
        assert_eq!(base_type("integer[]"), "integer");
    }
}
