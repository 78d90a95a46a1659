//! UPDATE and DELETE builder methods.

use super::{Query, QueryKind};
use crate::error::Result;
use crate::expression::{Conditions, QueryExpression};
use crate::value::{Field, Operand};

impl Query {
    /// An UPDATE of `table`.
    #[must_use]
    pub fn update(table: impl Into<Field>) -> Self {
        let mut query = Self::new(QueryKind::Update);
        query.parts.update.push(table.into());
        query
    }

    fn set_tree(&mut self) -> &mut QueryExpression {
        let tree = self.parts.set.get_or_insert_with(|| {
            QueryExpression::with_context(self.type_map.clone(), self.caster.clone()).tie_with(",")
        });
        tree.set_type_map(self.type_map.clone());
        tree
    }

    /// Adds `field = value` to `SET`.
    ///
    /// The value is typed from `type_name`, or the query type map.
    pub fn set(
        mut self,
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        let tree = self.set_tree();
        *tree = std::mem::take(tree).eq(field, value, type_name)?;
        Ok(self)
    }

    /// Adds several assignments parsed like conditions (`("field", value)`).
    pub fn set_many(mut self, assignments: impl Into<Conditions>) -> Result<Self> {
        self.set_tree().append(assignments)?;
        Ok(self)
    }

    /// A DELETE, optionally from `table`.
    #[must_use]
    pub fn delete(table: Option<&str>) -> Self {
        let query = Self::new(QueryKind::Delete);
        match table {
            Some(table) => query.from([table]),
            None => query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use crate::query::{Clause, ClauseName};

    #[test]
    fn test_set_builds_comma_tree() {
        let query = Query::update("articles")
            .set("title", "mark", None)
            .unwrap()
            .set_many([("body", "text")])
            .unwrap();
        let Clause::Set(Some(tree)) = query.part(ClauseName::Set) else {
            panic!("missing set");
        };
        assert_eq!(tree.conjunction(), ",");
        assert_eq!(tree.count(), 2);
    }

    #[test]
    fn test_set_null_is_allowed() {
        let query = Query::update("articles")
            .set_many([("published", None::<bool>)])
            .unwrap();
        let Clause::Set(Some(tree)) = query.part(ClauseName::Set) else {
            panic!("missing set");
        };
        assert!(matches!(tree.conditions()[0], Expression::Comparison(_)));
    }

    #[test]
    fn test_delete_from_table() {
        let query = Query::delete(Some("articles"));
        assert_eq!(query.kind(), QueryKind::Delete);
        assert!(query.part(ClauseName::From).is_compilable());
    }
}
