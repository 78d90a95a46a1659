//! Placeholder generation and bound parameter bookkeeping.

use std::collections::HashSet;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::trace;

use crate::value::{SqlValue, ToSqlValue};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w:])(:\w+|\?)").expect("valid placeholder regex"));

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundValue {
    /// The bound value.
    pub value: SqlValue,
    /// The logical type of the value, if known.
    pub type_name: Option<String>,
    /// The placeholder name without its `:` prefix.
    pub placeholder: String,
}

/// Accumulates bound values and generates unique placeholder names.
///
/// Bindings are kept in insertion order, which is the order the compiler
/// produced them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueBinder {
    bindings: IndexMap<String, BoundValue>,
    count: usize,
}

impl ValueBinder {
    /// Creates an empty binder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` to `param`.
    ///
    /// The parameter gets a `:` prefix unless it already has one or is the
    /// positional `?` token. Rebinding a parameter replaces its value.
    pub fn bind(
        &mut self,
        param: &str,
        value: impl ToSqlValue,
        type_name: Option<&str>,
    ) -> &mut Self {
        let param = normalize(param);
        let placeholder = param.strip_prefix(':').unwrap_or(&param).to_string();
        self.bindings.insert(
            param,
            BoundValue {
                value: value.to_sql_value(),
                type_name: type_name.map(String::from),
                placeholder,
            },
        );
        self
    }

    /// Generates a unique placeholder from `token` (e.g. `c` becomes `:c_0`).
    ///
    /// Tokens already starting with `:` and the `?` token are returned as
    /// they are. The counter advances either way.
    pub fn placeholder(&mut self, token: &str) -> String {
        let number = self.count;
        self.count += 1;
        if token == "?" || token.starts_with(':') {
            return token.to_string();
        }
        format!(":{token}_{number}")
    }

    /// Binds every value under a freshly generated placeholder.
    ///
    /// Returns the placeholders in the same order as the values.
    pub fn generate_many_named<I>(&mut self, values: I, type_name: Option<&str>) -> Vec<String>
    where
        I: IntoIterator<Item = SqlValue>,
    {
        values
            .into_iter()
            .map(|value| {
                let placeholder = self.placeholder("c");
                self.bind(&placeholder, value, type_name);
                placeholder
            })
            .collect()
    }

    /// All bindings, keyed by placeholder (with `:` prefix), in bind order.
    #[must_use]
    pub const fn bindings(&self) -> &IndexMap<String, BoundValue> {
        &self.bindings
    }

    /// Looks up a binding by placeholder, with or without the `:` prefix.
    #[must_use]
    pub fn get(&self, param: &str) -> Option<&BoundValue> {
        self.bindings.get(&normalize(param))
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Current value of the placeholder counter.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Removes all bindings and resets the placeholder counter.
    pub fn reset(&mut self) {
        self.bindings.clear();
        self.count = 0;
    }

    /// Resets the placeholder counter, keeping existing bindings.
    pub fn reset_count(&mut self) {
        self.count = 0;
    }

    /// Copies bindings from `other` whose placeholder appears in `sql`.
    ///
    /// Placeholders are matched as whole words, so `:c_1` does not match
    /// inside `:c_10`. Existing bindings in `self` win.
    pub fn merge_from(&mut self, other: &Self, sql: &str) {
        let mentioned = placeholders_in(sql);
        for (param, bound) in &other.bindings {
            if self.bindings.contains_key(param) || !mentioned.contains(param.as_str()) {
                continue;
            }
            trace!(placeholder = %param, "merging binding from embedded query");
            self.bindings.insert(param.clone(), bound.clone());
        }
    }
}

fn normalize(param: &str) -> String {
    if param == "?" || param.starts_with(':') {
        param.to_string()
    } else {
        format!(":{param}")
    }
}

/// Placeholders appearing in `sql`. `::type` casts are not placeholders.
fn placeholders_in(sql: &str) -> HashSet<&str> {
    PLACEHOLDER
        .captures_iter(sql)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_numbering() {
        let mut binder = ValueBinder::new();
        assert_eq!(binder.placeholder("c"), ":c_0");
        assert_eq!(binder.placeholder("c"), ":c_1");
        assert_eq!(binder.placeholder("param"), ":param_2");
        assert_eq!(binder.placeholder(":named"), ":named");
        assert_eq!(binder.placeholder("?"), "?");
        assert_eq!(binder.count(), 5);
    }

    #[test]
    fn test_bind_prefixes_colon() {
        let mut binder = ValueBinder::new();
        binder.bind("id", 1, Some("integer"));
        binder.bind(":name", "x", None);

        let id = binder.get(":id").unwrap();
        assert_eq!(id.value, SqlValue::Int(1));
        assert_eq!(id.type_name.as_deref(), Some("integer"));
        assert_eq!(id.placeholder, "id");
        assert!(binder.get("name").is_some());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut binder = ValueBinder::new();
        binder.generate_many_named(vec![SqlValue::Int(1), SqlValue::Int(2)], None);
        assert_eq!(binder.len(), 2);
        binder.reset();
        assert!(binder.is_empty());
        assert_eq!(binder.placeholder("c"), ":c_0");
    }

    #[test]
    fn test_reset_count_keeps_bindings() {
        let mut binder = ValueBinder::new();
        let names = binder.generate_many_named(vec![SqlValue::Int(1)], Some("integer"));
        assert_eq!(names, vec![":c_0".to_string()]);
        binder.reset_count();
        assert_eq!(binder.len(), 1);
        assert_eq!(binder.count(), 0);
    }

    #[test]
    fn test_bindings_keep_order() {
        let mut binder = ValueBinder::new();
        binder.bind("b", 2, None);
        binder.bind("a", 1, None);
        let keys: Vec<_> = binder.bindings().keys().cloned().collect();
        assert_eq!(keys, vec![":b".to_string(), ":a".to_string()]);
    }

    #[test]
    fn test_merge_matches_whole_words() {
        let mut child = ValueBinder::new();
        child.bind(":c_1", 1, None);
        child.bind(":c_10", 10, None);
        child.bind(":unused", 3, None);

        let mut parent = ValueBinder::new();
        parent.merge_from(&child, "SELECT a FROM t WHERE x = :c_10");
        assert!(parent.get(":c_10").is_some());
        assert!(parent.get(":c_1").is_none());
        assert!(parent.get(":unused").is_none());
    }

    #[test]
    fn test_merge_skips_casts_and_reads_positional() {
        let mut child = ValueBinder::new();
        child.bind(":int", 1, None);
        child.bind(":name", "x", None);
        child.bind("?", 2, None);

        let mut parent = ValueBinder::new();
        parent.merge_from(&child, "SELECT id::int FROM t WHERE (name = :name) OR id = ?");
        assert!(parent.get(":int").is_none());
        assert!(parent.get(":name").is_some());
        assert!(parent.get("?").is_some());
    }

    #[test]
    fn test_placeholders_in_sql() {
        let found = placeholders_in(":c_0 + :c_10, x::text, ?");
        assert_eq!(found, HashSet::from([":c_0", ":c_10", "?"]));
    }
}
