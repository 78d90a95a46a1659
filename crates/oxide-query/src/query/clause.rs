//! Clause names and the typed content of each clause.

use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;
use crate::expression::{
    CommonTableExpression, Expression, OrderByExpression, QueryExpression, ValuesExpression,
    WindowExpression,
};
use crate::value::{Field, Operand};

/// The named slots of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseName {
    Comment,
    With,
    Select,
    Distinct,
    Modifier,
    From,
    Join,
    Where,
    Group,
    Having,
    Window,
    Order,
    Limit,
    Offset,
    Union,
    Epilog,
    Insert,
    Values,
    Update,
    Set,
    Delete,
}

impl ClauseName {
    /// Every clause name.
    pub const ALL: [Self; 21] = [
        Self::Comment,
        Self::With,
        Self::Select,
        Self::Distinct,
        Self::Modifier,
        Self::From,
        Self::Join,
        Self::Where,
        Self::Group,
        Self::Having,
        Self::Window,
        Self::Order,
        Self::Limit,
        Self::Offset,
        Self::Union,
        Self::Epilog,
        Self::Insert,
        Self::Values,
        Self::Update,
        Self::Set,
        Self::Delete,
    ];

    /// The clause name as used in clause lookups.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::With => "with",
            Self::Select => "select",
            Self::Distinct => "distinct",
            Self::Modifier => "modifier",
            Self::From => "from",
            Self::Join => "join",
            Self::Where => "where",
            Self::Group => "group",
            Self::Having => "having",
            Self::Window => "window",
            Self::Order => "order",
            Self::Limit => "limit",
            Self::Offset => "offset",
            Self::Union => "union",
            Self::Epilog => "epilog",
            Self::Insert => "insert",
            Self::Values => "values",
            Self::Update => "update",
            Self::Set => "set",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ClauseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClauseName {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| QueryError::UndefinedClause(s.to_string()))
    }
}

/// A value with an optional alias: a select field or a table reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Aliased {
    /// The alias (`AS alias` for fields, `table alias` for tables).
    pub alias: Option<String>,
    /// The aliased column, table or expression.
    pub value: Field,
}

impl Aliased {
    /// An entry without alias.
    #[must_use]
    pub fn new(value: impl Into<Field>) -> Self {
        Self {
            alias: None,
            value: value.into(),
        }
    }

    /// An aliased entry.
    #[must_use]
    pub fn aliased(alias: impl Into<String>, value: impl Into<Field>) -> Self {
        Self {
            alias: Some(alias.into()),
            value: value.into(),
        }
    }
}

impl From<&str> for Aliased {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Aliased {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<Expression> for Aliased {
    fn from(expr: Expression) -> Self {
        Self::new(expr)
    }
}

impl From<Field> for Aliased {
    fn from(value: Field) -> Self {
        Self { alias: None, value }
    }
}

/// `(alias, value)`.
impl<F: Into<Field>> From<(&str, F)> for Aliased {
    fn from((alias, value): (&str, F)) -> Self {
        Self::aliased(alias, value)
    }
}

/// `SELECT DISTINCT` state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Distinct {
    #[default]
    None,
    /// `DISTINCT`.
    All,
    /// `DISTINCT ON (fields)`.
    On(Vec<Field>),
}

impl Distinct {
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl JoinType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }
}

/// One `JOIN` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// The joined table or sub-query, with its alias.
    pub table: Aliased,
    /// Join flavor.
    pub join_type: JoinType,
    /// `ON` conditions; empty renders `ON 1 = 1`.
    pub conditions: QueryExpression,
}

/// Set operation keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

impl SetOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

/// One `UNION`/`INTERSECT`/`EXCEPT` branch.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    pub operator: SetOperator,
    /// `ALL` modifier.
    pub all: bool,
    /// The combined query.
    pub query: Expression,
}

/// A `WINDOW name AS (...)` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedWindow {
    pub name: Expression,
    pub window: WindowExpression,
}

/// Target of an INSERT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertTarget {
    pub table: Option<String>,
    pub columns: Vec<String>,
}

impl InsertTarget {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_none() && self.columns.is_empty()
    }
}

/// The clause storage of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Parts {
    pub(crate) comment: Option<String>,
    pub(crate) with: Vec<CommonTableExpression>,
    pub(crate) select: Vec<Aliased>,
    pub(crate) distinct: Distinct,
    pub(crate) modifier: Vec<String>,
    pub(crate) from: Vec<Aliased>,
    pub(crate) join: Vec<Join>,
    pub(crate) conditions: Option<QueryExpression>,
    pub(crate) group: Vec<Field>,
    pub(crate) having: Option<QueryExpression>,
    pub(crate) window: Vec<NamedWindow>,
    pub(crate) order: Option<OrderByExpression>,
    pub(crate) limit: Option<Operand>,
    pub(crate) offset: Option<Operand>,
    pub(crate) union: Vec<SetOperation>,
    pub(crate) epilog: Option<Field>,
    pub(crate) insert: InsertTarget,
    pub(crate) values: Option<ValuesExpression>,
    pub(crate) update: Vec<Field>,
    pub(crate) set: Option<QueryExpression>,
}

impl Parts {
    pub(crate) fn reset(&mut self, name: ClauseName) {
        match name {
            ClauseName::Comment => self.comment = None,
            ClauseName::With => self.with.clear(),
            ClauseName::Select => self.select.clear(),
            ClauseName::Distinct => self.distinct = Distinct::None,
            ClauseName::Modifier => self.modifier.clear(),
            ClauseName::From => self.from.clear(),
            ClauseName::Join => self.join.clear(),
            ClauseName::Where => self.conditions = None,
            ClauseName::Group => self.group.clear(),
            ClauseName::Having => self.having = None,
            ClauseName::Window => self.window.clear(),
            ClauseName::Order => self.order = None,
            ClauseName::Limit => self.limit = None,
            ClauseName::Offset => self.offset = None,
            ClauseName::Union => self.union.clear(),
            ClauseName::Epilog => self.epilog = None,
            ClauseName::Insert => self.insert = InsertTarget::default(),
            ClauseName::Values => self.values = None,
            ClauseName::Update => self.update.clear(),
            ClauseName::Set => self.set = None,
            ClauseName::Delete => {}
        }
    }

    pub(crate) fn view(&self, name: ClauseName) -> Clause<'_> {
        match name {
            ClauseName::Comment => Clause::Comment(self.comment.as_deref()),
            ClauseName::With => Clause::With(&self.with),
            ClauseName::Select => Clause::Select(&self.select),
            ClauseName::Distinct => Clause::Distinct(&self.distinct),
            ClauseName::Modifier => Clause::Modifier(&self.modifier),
            ClauseName::From => Clause::From(&self.from),
            ClauseName::Join => Clause::Join(&self.join),
            ClauseName::Where => Clause::Where(self.conditions.as_ref()),
            ClauseName::Group => Clause::Group(&self.group),
            ClauseName::Having => Clause::Having(self.having.as_ref()),
            ClauseName::Window => Clause::Window(&self.window),
            ClauseName::Order => Clause::Order(self.order.as_ref()),
            ClauseName::Limit => Clause::Limit(self.limit.as_ref()),
            ClauseName::Offset => Clause::Offset(self.offset.as_ref()),
            ClauseName::Union => Clause::Union(&self.union),
            ClauseName::Epilog => Clause::Epilog(self.epilog.as_ref()),
            ClauseName::Insert => Clause::Insert(&self.insert),
            ClauseName::Values => Clause::Values(self.values.as_ref()),
            ClauseName::Update => Clause::Update(&self.update),
            ClauseName::Set => Clause::Set(self.set.as_ref()),
            ClauseName::Delete => Clause::Delete,
        }
    }

    /// Top-level expressions held by the clauses, in clause order.
    pub(crate) fn expressions(&self) -> Vec<&Expression> {
        let mut out: Vec<&Expression> = Vec::new();
        for cte in &self.with {
            out.extend(cte.children());
        }
        out.extend(self.select.iter().filter_map(|a| a.value.as_expression()));
        if let Distinct::On(fields) = &self.distinct {
            out.extend(fields.iter().filter_map(Field::as_expression));
        }
        out.extend(self.from.iter().filter_map(|a| a.value.as_expression()));
        for join in &self.join {
            out.extend(join.table.value.as_expression());
            out.extend(join.conditions.conditions());
        }
        if let Some(conditions) = &self.conditions {
            out.extend(conditions.conditions());
        }
        out.extend(self.group.iter().filter_map(Field::as_expression));
        if let Some(having) = &self.having {
            out.extend(having.conditions());
        }
        for named in &self.window {
            out.push(&named.name);
            out.extend(named.window.children());
        }
        if let Some(order) = &self.order {
            out.extend(order.children());
        }
        for operand in [&self.limit, &self.offset].into_iter().flatten() {
            out.extend(operand.expressions());
        }
        out.extend(self.union.iter().map(|u| &u.query));
        out.extend(self.epilog.as_ref().and_then(Field::as_expression));
        if let Some(values) = &self.values {
            out.extend(values.children());
        }
        out.extend(self.update.iter().filter_map(Field::as_expression));
        if let Some(set) = &self.set {
            out.extend(set.conditions());
        }
        out
    }

    pub(crate) fn expressions_mut(&mut self) -> Vec<&mut Expression> {
        let mut out: Vec<&mut Expression> = Vec::new();
        for cte in &mut self.with {
            out.extend(cte.children_mut());
        }
        out.extend(self.select.iter_mut().filter_map(|a| a.value.expression_mut()));
        if let Distinct::On(fields) = &mut self.distinct {
            out.extend(fields.iter_mut().filter_map(Field::expression_mut));
        }
        out.extend(self.from.iter_mut().filter_map(|a| a.value.expression_mut()));
        for join in &mut self.join {
            out.extend(join.table.value.expression_mut());
            out.extend(join.conditions.conditions_mut().iter_mut());
        }
        if let Some(conditions) = &mut self.conditions {
            out.extend(conditions.conditions_mut().iter_mut());
        }
        out.extend(self.group.iter_mut().filter_map(Field::expression_mut));
        if let Some(having) = &mut self.having {
            out.extend(having.conditions_mut().iter_mut());
        }
        for named in &mut self.window {
            out.push(&mut named.name);
            out.extend(named.window.children_mut());
        }
        if let Some(order) = &mut self.order {
            out.extend(order.children_mut());
        }
        for operand in [&mut self.limit, &mut self.offset].into_iter().flatten() {
            out.extend(operand.expressions_mut());
        }
        out.extend(self.union.iter_mut().map(|u| &mut u.query));
        out.extend(self.epilog.as_mut().and_then(Field::expression_mut));
        if let Some(values) = &mut self.values {
            out.extend(values.children_mut());
        }
        out.extend(self.update.iter_mut().filter_map(Field::expression_mut));
        if let Some(set) = &mut self.set {
            out.extend(set.conditions_mut().iter_mut());
        }
        out
    }
}

/// A read-only view of one clause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clause<'a> {
    Comment(Option<&'a str>),
    With(&'a [CommonTableExpression]),
    Select(&'a [Aliased]),
    Distinct(&'a Distinct),
    Modifier(&'a [String]),
    From(&'a [Aliased]),
    Join(&'a [Join]),
    Where(Option<&'a QueryExpression>),
    Group(&'a [Field]),
    Having(Option<&'a QueryExpression>),
    Window(&'a [NamedWindow]),
    Order(Option<&'a OrderByExpression>),
    Limit(Option<&'a Operand>),
    Offset(Option<&'a Operand>),
    Union(&'a [SetOperation]),
    Epilog(Option<&'a Field>),
    Insert(&'a InsertTarget),
    Values(Option<&'a ValuesExpression>),
    Update(&'a [Field]),
    Set(Option<&'a QueryExpression>),
    Delete,
}

impl Clause<'_> {
    /// Returns `false` for clauses the compiler skips: missing, empty or
    /// zero-count content.
    #[must_use]
    pub fn is_compilable(&self) -> bool {
        match self {
            Self::Comment(c) => c.is_some_and(|c| !c.is_empty()),
            Self::With(v) => !v.is_empty(),
            Self::Select(v) | Self::From(v) => !v.is_empty(),
            Self::Distinct(d) => !d.is_none(),
            Self::Modifier(v) => !v.is_empty(),
            Self::Join(v) => !v.is_empty(),
            Self::Where(q) | Self::Having(q) | Self::Set(q) => q.is_some_and(|q| !q.is_empty()),
            Self::Group(v) | Self::Update(v) => !v.is_empty(),
            Self::Window(v) => !v.is_empty(),
            Self::Order(o) => o.is_some_and(|o| !o.is_empty()),
            Self::Limit(o) | Self::Offset(o) => o.is_some_and(|o| !o.is_null()),
            Self::Union(v) => !v.is_empty(),
            Self::Epilog(e) => e.is_some(),
            Self::Insert(i) => !i.is_empty(),
            Self::Values(v) => v.is_some_and(|v| !v.is_empty()),
            Self::Delete => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_names_round_trip() {
        for name in ClauseName::ALL {
            assert_eq!(name.as_str().parse::<ClauseName>().unwrap(), name);
        }
    }

    #[test]
    fn test_unknown_clause_name() {
        assert_eq!(
            "nope".parse::<ClauseName>(),
            Err(QueryError::UndefinedClause(String::from("nope")))
        );
    }

    #[test]
    fn test_empty_clauses_are_not_compilable() {
        let parts = Parts::default();
        assert!(!parts.view(ClauseName::Where).is_compilable());
        assert!(!parts.view(ClauseName::Select).is_compilable());
        assert!(!parts.view(ClauseName::Limit).is_compilable());
        assert!(parts.view(ClauseName::Delete).is_compilable());

        let parts = Parts {
            conditions: Some(QueryExpression::new()),
            ..Parts::default()
        };
        assert!(!parts.view(ClauseName::Where).is_compilable());
    }

    #[test]
    fn test_aliased_conversions() {
        let plain = Aliased::from("articles");
        assert_eq!(plain.alias, None);
        let aliased = Aliased::from(("a", "articles"));
        assert_eq!(aliased.alias.as_deref(), Some("a"));
        assert_eq!(aliased.value.as_name(), Some("articles"));
    }
}
