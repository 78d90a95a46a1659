//! SELECT builder methods.

use super::{condition_tree, Aliased, Distinct, NamedWindow, Query, QueryKind, SetOperation, SetOperator};
use crate::error::{QueryError, Result};
use crate::expression::{
    Conditions, Expression, OrderByExpression, OrderClauseExpression, OrderItem, QueryExpression,
    WindowExpression,
};
use crate::value::{Field, Operand, SqlValue};

/// Rows per page when `page()` is called without a limit.
pub const DEFAULT_PAGE_SIZE: i64 = 25;

impl Query {
    /// A SELECT of the given fields.
    ///
    /// Entries are column names, expressions or `(alias, field)` pairs.
    #[must_use]
    pub fn select<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Aliased>,
    {
        Self::new(QueryKind::Select).fields(fields)
    }

    /// Appends select fields.
    #[must_use]
    pub fn fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Aliased>,
    {
        self.parts.select.extend(fields.into_iter().map(Into::into));
        self
    }

    /// `SELECT DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.parts.distinct = Distinct::All;
        self
    }

    /// `SELECT DISTINCT ON (fields)`.
    #[must_use]
    pub fn distinct_on<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.parts.distinct = Distinct::On(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Appends tables (or sub-queries) to `FROM`.
    #[must_use]
    pub fn from<I, T>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Aliased>,
    {
        self.parts.from.extend(tables.into_iter().map(Into::into));
        self
    }

    /// Appends `GROUP BY` fields.
    #[must_use]
    pub fn group_by<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.parts.group.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Adds `HAVING` conditions, joined to existing ones with `AND`.
    pub fn having(mut self, conditions: impl Into<Conditions>) -> Result<Self> {
        let tree = condition_tree(&mut self.parts.having, &self.type_map, &self.caster);
        tree.append(conditions)?;
        Ok(self)
    }

    /// Adds `HAVING` conditions built by a closure from a fresh tree.
    pub fn having_with<F>(self, build: F) -> Result<Self>
    where
        F: FnOnce(QueryExpression) -> Result<QueryExpression>,
    {
        let expr = build(self.new_expr())?;
        self.having(Expression::Conditions(expr))
    }

    /// Adds a named window: `WINDOW name AS (...)`.
    #[must_use]
    pub fn window(mut self, name: impl Into<String>, window: WindowExpression) -> Self {
        self.parts.window.push(NamedWindow {
            name: Expression::identifier(name),
            window,
        });
        self
    }

    /// Appends `ORDER BY` entries.
    ///
    /// # Errors
    ///
    /// Keyed entries whose direction is not `ASC`/`DESC` are rejected with
    /// [`QueryError::PossibleSqlInjection`].
    pub fn order_by<I, O>(mut self, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = O>,
        O: Into<OrderItem>,
    {
        self.parts
            .order
            .get_or_insert_with(OrderByExpression::new)
            .append(fields)?;
        Ok(self)
    }

    /// Appends `field ASC`.
    #[must_use]
    pub fn order_asc(mut self, field: impl Into<Field>) -> Self {
        self.parts
            .order
            .get_or_insert_with(OrderByExpression::new)
            .items_mut()
            .push(OrderClauseExpression::asc(field).into());
        self
    }

    /// Appends `field DESC`.
    #[must_use]
    pub fn order_desc(mut self, field: impl Into<Field>) -> Self {
        self.parts
            .order
            .get_or_insert_with(OrderByExpression::new)
            .items_mut()
            .push(OrderClauseExpression::desc(field).into());
        self
    }

    /// Sets `LIMIT`. Integers are inlined, other values are bound.
    #[must_use]
    pub fn limit(mut self, limit: impl Into<Operand>) -> Self {
        self.parts.limit = Some(limit.into());
        self
    }

    /// Sets `OFFSET`. Integers are inlined, other values are bound.
    #[must_use]
    pub fn offset(mut self, offset: impl Into<Operand>) -> Self {
        self.parts.offset = Some(offset.into());
        self
    }

    /// Sets `LIMIT`/`OFFSET` for a 1-based page number.
    ///
    /// Without an explicit `limit` the current limit is used, or
    /// [`DEFAULT_PAGE_SIZE`] when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidPage`] when `num` is below 1, and
    /// [`QueryError::InvalidUsage`] when the current limit is not an integer
    /// since no offset can be derived from it.
    pub fn page(mut self, num: i64, limit: Option<i64>) -> Result<Self> {
        if num < 1 {
            return Err(QueryError::InvalidPage(num));
        }
        if let Some(limit) = limit {
            self = self.limit(limit);
        }
        let limit = match &self.parts.limit {
            Some(Operand::Value(SqlValue::Int(n))) => *n,
            None | Some(Operand::Value(SqlValue::Null)) => {
                self = self.limit(DEFAULT_PAGE_SIZE);
                DEFAULT_PAGE_SIZE
            }
            Some(other) => {
                return Err(QueryError::usage(format!(
                    "cannot paginate with a non-integer limit `{other:?}`"
                )));
            }
        };
        let offset = (num - 1).saturating_mul(limit);
        Ok(self.offset(offset))
    }

    fn set_operation(mut self, operator: SetOperator, all: bool, query: Expression) -> Self {
        self.parts.union.push(SetOperation {
            operator,
            all,
            query,
        });
        self
    }

    /// Adds a `UNION` branch.
    #[must_use]
    pub fn union(self, query: impl Into<Expression>) -> Self {
        self.set_operation(SetOperator::Union, false, query.into())
    }

    /// Adds a `UNION ALL` branch.
    #[must_use]
    pub fn union_all(self, query: impl Into<Expression>) -> Self {
        self.set_operation(SetOperator::Union, true, query.into())
    }

    /// Adds an `INTERSECT` branch.
    #[must_use]
    pub fn intersect(self, query: impl Into<Expression>) -> Self {
        self.set_operation(SetOperator::Intersect, false, query.into())
    }

    /// Adds an `INTERSECT ALL` branch.
    #[must_use]
    pub fn intersect_all(self, query: impl Into<Expression>) -> Self {
        self.set_operation(SetOperator::Intersect, true, query.into())
    }

    /// Adds an `EXCEPT` branch.
    #[must_use]
    pub fn except(self, query: impl Into<Expression>) -> Self {
        self.set_operation(SetOperator::Except, false, query.into())
    }

    /// Adds an `EXCEPT ALL` branch.
    #[must_use]
    pub fn except_all(self, query: impl Into<Expression>) -> Self {
        self.set_operation(SetOperator::Except, true, query.into())
    }
}
