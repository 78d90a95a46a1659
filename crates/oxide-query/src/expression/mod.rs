//! The expression tree.
//!
//! Every node of a query is an [`Expression`]. The enum is closed: the
//! compiler dispatches on [`Expression::kind`] and every node kind has one
//! compiler unit. Nodes own their children, so `clone()` is a deep clone and
//! mutating a clone never affects the original.
//!
//! [`Expression::traverse`] visits every descendant in pre-order (a node
//! before its own children). It stops at embedded queries: the [`Query`]
//! node itself is visited but its clauses are not.

mod case;
mod comparison;
mod conditions;
mod cte;
mod function;
mod identifier;
mod order;
mod tuple;
mod unary;
mod values;
mod window;

pub use case::{CaseExpression, CaseStatementExpression, WhenThenExpression};
pub use comparison::{BetweenExpression, ComparisonExpression};
pub use conditions::{Condition, Conditions, QueryExpression};
pub use cte::{CommonTableExpression, Materialized};
pub use function::{AggregateExpression, FunctionExpression};
pub use identifier::{IdentifierExpression, StringExpression};
pub use order::{OrderByExpression, OrderClauseExpression, OrderDirection, OrderItem};
pub use tuple::TupleComparison;
pub use unary::{UnaryExpression, UnaryPosition};
pub use values::ValuesExpression;
pub use window::{FrameBound, FrameDirection, FrameOffset, FrameSpec, FrameType, WindowExpression};

use std::fmt;

use crate::query::Query;
use crate::value::{Field, Operand};

/// The kind of an expression node, used as the compiler dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    Identifier,
    String,
    Comparison,
    Between,
    Conditions,
    Case,
    WhenThen,
    Function,
    Aggregate,
    Unary,
    Tuple,
    OrderBy,
    OrderClause,
    Window,
    CommonTable,
    Values,
    Query,
    Raw,
}

impl ExpressionKind {
    /// Every node kind.
    pub const ALL: [Self; 18] = [
        Self::Identifier,
        Self::String,
        Self::Comparison,
        Self::Between,
        Self::Conditions,
        Self::Case,
        Self::WhenThen,
        Self::Function,
        Self::Aggregate,
        Self::Unary,
        Self::Tuple,
        Self::OrderBy,
        Self::OrderClause,
        Self::Window,
        Self::CommonTable,
        Self::Values,
        Self::Query,
        Self::Raw,
    ];

    /// The kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::String => "string",
            Self::Comparison => "comparison",
            Self::Between => "between",
            Self::Conditions => "conditions",
            Self::Case => "case",
            Self::WhenThen => "when_then",
            Self::Function => "function",
            Self::Aggregate => "aggregate",
            Self::Unary => "unary",
            Self::Tuple => "tuple",
            Self::OrderBy => "order_by",
            Self::OrderClause => "order_clause",
            Self::Window => "window",
            Self::CommonTable => "common_table",
            Self::Values => "values",
            Self::Query => "query",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for ExpressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the SQL expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// An unescaped column or table reference.
    Identifier(IdentifierExpression),
    /// A string literal with a forced collation.
    String(StringExpression),
    /// `field OP value`.
    Comparison(ComparisonExpression),
    /// `field BETWEEN from AND to`.
    Between(BetweenExpression),
    /// A list of conditions joined by a conjunction.
    Conditions(QueryExpression),
    /// `CASE ... END`.
    Case(CaseExpression),
    /// One `WHEN ... THEN ...` branch.
    WhenThen(WhenThenExpression),
    /// A function call.
    Function(FunctionExpression),
    /// An aggregate or window function call.
    Aggregate(AggregateExpression),
    /// A prefix or postfix operator.
    Unary(UnaryExpression),
    /// `(a, b) OP (...)`.
    Tuple(TupleComparison),
    /// `ORDER BY ...`.
    OrderBy(OrderByExpression),
    /// One `field ASC|DESC` entry.
    OrderClause(OrderClauseExpression),
    /// A window definition.
    Window(WindowExpression),
    /// A common table expression.
    CommonTable(CommonTableExpression),
    /// Rows of an INSERT.
    Values(ValuesExpression),
    /// An embedded query.
    Query(Box<Query>),
    /// A raw SQL fragment, emitted verbatim.
    Raw(String),
}

impl Expression {
    /// A raw SQL fragment.
    ///
    /// **Warning**: the text is emitted as is; never pass user input.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// An identifier reference.
    #[must_use]
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(IdentifierExpression::new(name))
    }

    /// The node kind.
    #[must_use]
    pub const fn kind(&self) -> ExpressionKind {
        match self {
            Self::Identifier(_) => ExpressionKind::Identifier,
            Self::String(_) => ExpressionKind::String,
            Self::Comparison(_) => ExpressionKind::Comparison,
            Self::Between(_) => ExpressionKind::Between,
            Self::Conditions(_) => ExpressionKind::Conditions,
            Self::Case(_) => ExpressionKind::Case,
            Self::WhenThen(_) => ExpressionKind::WhenThen,
            Self::Function(_) => ExpressionKind::Function,
            Self::Aggregate(_) => ExpressionKind::Aggregate,
            Self::Unary(_) => ExpressionKind::Unary,
            Self::Tuple(_) => ExpressionKind::Tuple,
            Self::OrderBy(_) => ExpressionKind::OrderBy,
            Self::OrderClause(_) => ExpressionKind::OrderClause,
            Self::Window(_) => ExpressionKind::Window,
            Self::CommonTable(_) => ExpressionKind::CommonTable,
            Self::Values(_) => ExpressionKind::Values,
            Self::Query(_) => ExpressionKind::Query,
            Self::Raw(_) => ExpressionKind::Raw,
        }
    }

    /// The logical type the expression evaluates to, when it is known.
    #[must_use]
    pub fn return_type(&self) -> Option<String> {
        match self {
            Self::Function(f) => Some(f.return_type().to_string()),
            Self::Aggregate(a) => Some(a.function().return_type().to_string()),
            Self::Case(c) => Some(c.return_type()),
            Self::WhenThen(w) => w.result_type().map(String::from),
            _ => None,
        }
    }

    /// Returns the embedded query, if this is a query node.
    #[must_use]
    pub fn as_query(&self) -> Option<&Query> {
        match self {
            Self::Query(q) => Some(q),
            _ => None,
        }
    }

    /// Returns `true` for embedded queries.
    #[must_use]
    pub const fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// Direct children of this node, in visiting order.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Identifier(_) | Self::String(_) | Self::Query(_) | Self::Raw(_) => Vec::new(),
            Self::Comparison(c) => c.children(),
            Self::Between(b) => b.children(),
            Self::Conditions(q) => q.conditions().iter().collect(),
            Self::Case(c) => c.children(),
            Self::WhenThen(w) => w.children(),
            Self::Function(f) => f.children(),
            Self::Aggregate(a) => a.children(),
            Self::Unary(u) => vec![u.value()],
            Self::Tuple(t) => t.children(),
            Self::OrderBy(o) => o.children(),
            Self::OrderClause(o) => o.field().as_expression().into_iter().collect(),
            Self::Window(w) => w.children(),
            Self::CommonTable(c) => c.children(),
            Self::Values(v) => v.children(),
        }
    }

    /// Mutable direct children of this node, in visiting order.
    pub fn children_mut(&mut self) -> Vec<&mut Self> {
        match self {
            Self::Identifier(_) | Self::String(_) | Self::Query(_) | Self::Raw(_) => Vec::new(),
            Self::Comparison(c) => c.children_mut(),
            Self::Between(b) => b.children_mut(),
            Self::Conditions(q) => q.conditions_mut().iter_mut().collect(),
            Self::Case(c) => c.children_mut(),
            Self::WhenThen(w) => w.children_mut(),
            Self::Function(f) => f.children_mut(),
            Self::Aggregate(a) => a.children_mut(),
            Self::Unary(u) => vec![u.value_mut()],
            Self::Tuple(t) => t.children_mut(),
            Self::OrderBy(o) => o.children_mut(),
            Self::OrderClause(o) => o.field_mut().expression_mut().into_iter().collect(),
            Self::Window(w) => w.children_mut(),
            Self::CommonTable(c) => c.children_mut(),
            Self::Values(v) => v.children_mut(),
        }
    }

    /// Calls `visitor` on every descendant, parent first.
    pub fn traverse<F>(&self, visitor: &mut F)
    where
        F: FnMut(&Self),
    {
        for child in self.children() {
            visitor(child);
            child.traverse(visitor);
        }
    }

    /// Calls `visitor` on every descendant, parent first, allowing rewrites.
    ///
    /// A node replaced by the visitor is descended into after replacement.
    pub fn traverse_mut<F>(&mut self, visitor: &mut F)
    where
        F: FnMut(&mut Self),
    {
        for child in self.children_mut() {
            visitor(child);
            child.traverse_mut(visitor);
        }
    }
}

macro_rules! node_conversions {
    ($($variant:ident => $node:ty),* $(,)?) => {
        $(
            impl From<$node> for Expression {
                fn from(node: $node) -> Self {
                    Self::$variant(node)
                }
            }

            impl From<$node> for Operand {
                fn from(node: $node) -> Self {
                    Self::Expr(Box::new(Expression::$variant(node)))
                }
            }

            impl From<$node> for Field {
                fn from(node: $node) -> Self {
                    Self::Expr(Box::new(Expression::$variant(node)))
                }
            }

            impl From<$node> for Condition {
                fn from(node: $node) -> Self {
                    Self::Expr(Expression::$variant(node))
                }
            }

            impl From<$node> for Conditions {
                fn from(node: $node) -> Self {
                    Self::from(Condition::Expr(Expression::$variant(node)))
                }
            }
        )*
    };
}

node_conversions!(
    Identifier => IdentifierExpression,
    String => StringExpression,
    Comparison => ComparisonExpression,
    Between => BetweenExpression,
    Conditions => QueryExpression,
    Case => CaseExpression,
    WhenThen => WhenThenExpression,
    Function => FunctionExpression,
    Aggregate => AggregateExpression,
    Unary => UnaryExpression,
    Tuple => TupleComparison,
    OrderBy => OrderByExpression,
    OrderClause => OrderClauseExpression,
    Window => WindowExpression,
    CommonTable => CommonTableExpression,
    Values => ValuesExpression,
);

impl From<Query> for Expression {
    fn from(query: Query) -> Self {
        Self::Query(Box::new(query))
    }
}

impl From<Query> for Operand {
    fn from(query: Query) -> Self {
        Self::Expr(Box::new(Expression::from(query)))
    }
}

impl From<Query> for Field {
    fn from(query: Query) -> Self {
        Self::Expr(Box::new(Expression::from(query)))
    }
}

impl From<Query> for Condition {
    fn from(query: Query) -> Self {
        Self::Expr(Expression::from(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_nodes(expr: &Expression) -> usize {
        let mut count = 0;
        expr.traverse(&mut |_| count += 1);
        count
    }

    #[test]
    fn test_between_traversal_counts_expression_bounds() {
        let scalar = Expression::from(BetweenExpression::new("price", 1, 10, None));
        assert_eq!(count_nodes(&scalar), 0);

        let exprs = Expression::from(BetweenExpression::new(
            "price",
            Expression::identifier("low"),
            Expression::identifier("high"),
            None,
        ));
        assert_eq!(count_nodes(&exprs), 2);
    }

    #[test]
    fn test_traverse_is_pre_order() {
        let inner = UnaryExpression::not(Expression::identifier("b"));
        let tree = Expression::from(
            QueryExpression::new()
                .add(Expression::identifier("a"))
                .unwrap()
                .add(inner)
                .unwrap(),
        );
        let mut seen = Vec::new();
        tree.traverse(&mut |e| seen.push(e.kind()));
        assert_eq!(
            seen,
            vec![
                ExpressionKind::Identifier,
                ExpressionKind::Unary,
                ExpressionKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_traverse_stops_at_queries() {
        let sub = Query::select(["id"]).from(["articles"]);
        let tree = Expression::from(UnaryExpression::exists(sub));
        let mut kinds = Vec::new();
        tree.traverse(&mut |e| kinds.push(e.kind()));
        assert_eq!(kinds, vec![ExpressionKind::Query]);
    }

    #[test]
    fn test_traverse_mut_rewrites() {
        let mut tree = Expression::from(
            QueryExpression::new()
                .add(Expression::identifier("a.b"))
                .unwrap(),
        );
        tree.traverse_mut(&mut |e| {
            if let Expression::Identifier(id) = e {
                id.set_name("b");
            }
        });
        let mut names = Vec::new();
        tree.traverse(&mut |e| {
            if let Expression::Identifier(id) = e {
                names.push(id.name().to_string());
            }
        });
        assert_eq!(names, vec!["b".to_string()]);
    }

    #[test]
    fn test_clone_is_deep() {
        let original = Expression::from(
            QueryExpression::new()
                .add(Expression::identifier("a"))
                .unwrap(),
        );
        let mut copy = original.clone();
        copy.traverse_mut(&mut |e| {
            if let Expression::Identifier(id) = e {
                id.set_name("changed");
            }
        });
        assert_ne!(original, copy);
        let mut names = Vec::new();
        original.traverse(&mut |e| {
            if let Expression::Identifier(id) = e {
                names.push(id.name().to_string());
            }
        });
        assert_eq!(names, vec!["a".to_string()]);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ExpressionKind::WhenThen.to_string(), "when_then");
        assert_eq!(Expression::raw("1").kind(), ExpressionKind::Raw);
        assert_eq!(ExpressionKind::ALL.len(), 18);
    }
}
