//! The query aggregate.
//!
//! A [`Query`] is an ordered set of named clauses holding expression trees.
//! It owns a [`ValueBinder`] for user-bound placeholders, a [`TypeMap`] used
//! to type the conditions it parses and a [`CasterHandle`] applied to every
//! value it casts. Builder methods consume and return the query; the ones
//! that parse input return `Result`.
//!
//! ```ignore
//! let query = Query::select(["*"])
//!     .from(["articles"])
//!     .where_clause([("author_id", 1)])?;
//! let (sql, binder) = query.sql(&Compiler::default())?;
//! assert_eq!(sql, "SELECT * FROM articles WHERE author_id = :c_0");
//! ```

mod clause;
mod insert;
mod select;
mod update;

pub use clause::{
    Aliased, Clause, ClauseName, Distinct, InsertTarget, Join, JoinType, NamedWindow,
    SetOperation, SetOperator,
};
pub(crate) use clause::Parts;

use std::fmt;

use crate::binder::ValueBinder;
use crate::compiler::Compiler;
use crate::error::Result;
use crate::expression::{CommonTableExpression, Conditions, Expression, QueryExpression};
use crate::types::{CasterHandle, TypeMap};
use crate::value::{Field, Operand, ToSqlValue};

/// The statement type of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl QueryKind {
    /// Every statement type.
    pub const ALL: [Self; 4] = [Self::Select, Self::Insert, Self::Update, Self::Delete];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A SELECT, INSERT, UPDATE or DELETE statement under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    kind: QueryKind,
    parts: Parts,
    binder: ValueBinder,
    type_map: TypeMap,
    caster: CasterHandle,
}

impl Query {
    /// An empty query of the given kind using the default caster.
    #[must_use]
    pub fn new(kind: QueryKind) -> Self {
        Self::with_caster(kind, CasterHandle::default())
    }

    /// An empty query of the given kind casting values through `caster`.
    #[must_use]
    pub fn with_caster(kind: QueryKind, caster: CasterHandle) -> Self {
        Self {
            kind,
            parts: Parts::default(),
            binder: ValueBinder::new(),
            type_map: TypeMap::default(),
            caster,
        }
    }

    /// The statement type.
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Looks up a clause by name.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UndefinedClause`](crate::QueryError::UndefinedClause)
    /// for names no query defines.
    pub fn clause(&self, name: &str) -> Result<Clause<'_>> {
        let name: ClauseName = name.parse()?;
        Ok(self.parts.view(name))
    }

    /// The content of a clause.
    #[must_use]
    pub fn part(&self, name: ClauseName) -> Clause<'_> {
        self.parts.view(name)
    }

    /// Empties a clause.
    #[must_use]
    pub fn reset(mut self, name: ClauseName) -> Self {
        self.parts.reset(name);
        self
    }

    /// The query type map.
    #[must_use]
    pub const fn type_map(&self) -> &TypeMap {
        &self.type_map
    }

    /// Mutable access to the query type map.
    pub fn type_map_mut(&mut self) -> &mut TypeMap {
        &mut self.type_map
    }

    /// Merges default column types.
    #[must_use]
    pub fn default_types<I, K, V>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.type_map.add_defaults(types);
        self
    }

    /// The caster applied to values added from now on.
    #[must_use]
    pub const fn caster(&self) -> &CasterHandle {
        &self.caster
    }

    /// Replaces the caster; values already cast are not recast.
    pub fn set_type_caster(&mut self, caster: CasterHandle) {
        self.caster = caster;
    }

    /// The binder holding user-bound placeholders.
    #[must_use]
    pub const fn value_binder(&self) -> &ValueBinder {
        &self.binder
    }

    /// Replaces the binder, returning the previous one.
    pub fn set_value_binder(&mut self, binder: ValueBinder) -> ValueBinder {
        std::mem::replace(&mut self.binder, binder)
    }

    /// Binds a value to a named placeholder used in raw SQL.
    #[must_use]
    pub fn bind(mut self, param: &str, value: impl ToSqlValue, type_name: Option<&str>) -> Self {
        self.binder.bind(param, value, type_name);
        self
    }

    /// A condition tree sharing this query's typing.
    #[must_use]
    pub fn new_expr(&self) -> QueryExpression {
        QueryExpression::with_context(self.type_map.clone(), self.caster.clone())
    }

    /// Sets the leading `/* comment */`.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.parts.comment = Some(comment.into());
        self
    }

    /// Sets trailing SQL, e.g. `FOR UPDATE` or `RETURNING id`.
    #[must_use]
    pub fn epilog(mut self, epilog: impl Into<Field>) -> Self {
        self.parts.epilog = Some(epilog.into());
        self
    }

    /// Adds a common table expression.
    #[must_use]
    pub fn with(mut self, cte: CommonTableExpression) -> Self {
        self.parts.with.push(cte);
        self
    }

    /// Adds keywords placed right after the statement keyword.
    #[must_use]
    pub fn modifier<I, S>(mut self, modifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parts
            .modifier
            .extend(modifiers.into_iter().map(Into::into));
        self
    }

    /// Adds `WHERE` conditions, joined to existing ones with `AND`.
    pub fn where_clause(mut self, conditions: impl Into<Conditions>) -> Result<Self> {
        let tree = condition_tree(&mut self.parts.conditions, &self.type_map, &self.caster);
        tree.append(conditions)?;
        Ok(self)
    }

    /// Adds `WHERE` conditions built by a closure from a fresh tree.
    pub fn where_with<F>(self, build: F) -> Result<Self>
    where
        F: FnOnce(QueryExpression) -> Result<QueryExpression>,
    {
        let expr = build(self.new_expr())?;
        self.where_clause(Expression::Conditions(expr))
    }

    /// Adds `field IS NULL` to `WHERE`.
    #[must_use]
    pub fn where_null(mut self, field: impl Into<Field>) -> Self {
        let tree = condition_tree(&mut self.parts.conditions, &self.type_map, &self.caster);
        *tree = std::mem::take(tree).is_null(field);
        self
    }

    /// Adds `field IS NOT NULL` to `WHERE`.
    #[must_use]
    pub fn where_not_null(mut self, field: impl Into<Field>) -> Self {
        let tree = condition_tree(&mut self.parts.conditions, &self.type_map, &self.caster);
        *tree = std::mem::take(tree).is_not_null(field);
        self
    }

    /// Adds `field IN (values)` to `WHERE`.
    pub fn where_in_list(
        mut self,
        field: impl Into<Field>,
        values: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        let tree = condition_tree(&mut self.parts.conditions, &self.type_map, &self.caster);
        *tree = std::mem::take(tree).in_list(field, values, type_name)?;
        Ok(self)
    }

    /// Adds `field NOT IN (values)` to `WHERE`.
    pub fn where_not_in_list(
        mut self,
        field: impl Into<Field>,
        values: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        let tree = condition_tree(&mut self.parts.conditions, &self.type_map, &self.caster);
        *tree = std::mem::take(tree).not_in_list(field, values, type_name)?;
        Ok(self)
    }

    /// Adds a join. Empty conditions render as `ON 1 = 1`.
    pub fn join(
        mut self,
        join_type: JoinType,
        table: impl Into<Aliased>,
        conditions: impl Into<Conditions>,
    ) -> Result<Self> {
        let conditions = self.new_expr().add(conditions)?;
        self.parts.join.push(Join {
            table: table.into(),
            join_type,
            conditions,
        });
        Ok(self)
    }

    /// Adds an `INNER JOIN`.
    pub fn inner_join(
        self,
        table: impl Into<Aliased>,
        conditions: impl Into<Conditions>,
    ) -> Result<Self> {
        self.join(JoinType::Inner, table, conditions)
    }

    /// Adds a `LEFT JOIN`.
    pub fn left_join(
        self,
        table: impl Into<Aliased>,
        conditions: impl Into<Conditions>,
    ) -> Result<Self> {
        self.join(JoinType::Left, table, conditions)
    }

    /// Adds a `RIGHT JOIN`.
    pub fn right_join(
        self,
        table: impl Into<Aliased>,
        conditions: impl Into<Conditions>,
    ) -> Result<Self> {
        self.join(JoinType::Right, table, conditions)
    }

    /// Compiles the query.
    ///
    /// Returns the SQL and a binder holding every placeholder it mentions.
    /// Generated placeholders are numbered from zero on every call, so
    /// compiling twice yields the same output.
    pub fn sql(&self, compiler: &Compiler) -> Result<(String, ValueBinder)> {
        let mut binder = self.binder.clone();
        binder.reset_count();
        let sql = compiler.compile(self, &mut binder)?;
        Ok((sql, binder))
    }

    /// Visits every expression held by the clauses and their descendants.
    ///
    /// Clause containers (condition lists, order lists, rows) are not
    /// visited themselves; their contents are. Embedded queries are visited
    /// but not entered.
    pub fn traverse_expressions<F>(&self, visitor: &mut F)
    where
        F: FnMut(&Expression),
    {
        for expr in self.parts.expressions() {
            visitor(expr);
            expr.traverse(visitor);
        }
    }

    /// Mutable variant of [`Self::traverse_expressions`].
    pub fn traverse_expressions_mut<F>(&mut self, visitor: &mut F)
    where
        F: FnMut(&mut Expression),
    {
        for expr in self.parts.expressions_mut() {
            visitor(expr);
            expr.traverse_mut(visitor);
        }
    }

    pub(crate) fn parts_mut(&mut self) -> &mut Parts {
        &mut self.parts
    }
}

/// Returns the tree in `slot`, creating it with the query typing first.
///
/// The tree always sees the query's current type map.
fn condition_tree<'a>(
    slot: &'a mut Option<QueryExpression>,
    type_map: &TypeMap,
    caster: &CasterHandle,
) -> &'a mut QueryExpression {
    let tree =
        slot.get_or_insert_with(|| QueryExpression::with_context(TypeMap::default(), caster.clone()));
    tree.set_type_map(type_map.clone());
    tree.set_caster(caster.clone());
    tree
}
