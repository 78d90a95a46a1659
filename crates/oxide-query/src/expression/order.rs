//! `ORDER BY` lists.

use std::fmt;

use super::Expression;
use crate::error::{QueryError, Result};
use crate::value::Field;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    /// Parses `ASC`/`DESC`, case-insensitively.
    #[must_use]
    pub fn parse(direction: &str) -> Option<Self> {
        match direction.to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        })
    }
}

/// One entry of an `ORDER BY` list.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderItem {
    /// A raw fragment such as `title` or `created DESC`.
    Raw(String),
    /// A field keyed to a direction: `("title", "ASC")`.
    Keyed {
        /// The field.
        field: String,
        /// The direction token, as given.
        direction: String,
    },
    /// An expression, typically an [`OrderClauseExpression`].
    Expr(Expression),
}

impl From<&str> for OrderItem {
    fn from(sql: &str) -> Self {
        Self::Raw(sql.to_string())
    }
}

impl From<String> for OrderItem {
    fn from(sql: String) -> Self {
        Self::Raw(sql)
    }
}

impl From<(&str, &str)> for OrderItem {
    fn from((field, direction): (&str, &str)) -> Self {
        Self::Keyed {
            field: field.to_string(),
            direction: direction.to_string(),
        }
    }
}

impl From<Expression> for OrderItem {
    fn from(expr: Expression) -> Self {
        Self::Expr(expr)
    }
}

impl From<OrderClauseExpression> for OrderItem {
    fn from(clause: OrderClauseExpression) -> Self {
        Self::Expr(Expression::OrderClause(clause))
    }
}

/// An `ORDER BY` list.
///
/// Keyed entries must carry a direction token; anything else is rejected
/// so that raw SQL cannot be smuggled through keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderByExpression {
    items: Vec<OrderItem>,
}

impl OrderByExpression {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds entries.
    pub fn add<I, O>(mut self, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = O>,
        O: Into<OrderItem>,
    {
        self.append(fields)?;
        Ok(self)
    }

    /// Adds entries in place. Nothing is added if any entry is rejected.
    pub fn append<I, O>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = O>,
        O: Into<OrderItem>,
    {
        let items: Vec<OrderItem> = fields.into_iter().map(Into::into).collect();
        for item in &items {
            if let OrderItem::Keyed { field, direction } = item {
                if OrderDirection::parse(direction).is_none() {
                    return Err(QueryError::PossibleSqlInjection {
                        key: field.clone(),
                        value: direction.clone(),
                    });
                }
            }
        }
        self.items.extend(items);
        Ok(())
    }

    /// The entries.
    #[must_use]
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Mutable access to the entries.
    pub fn items_mut(&mut self) -> &mut Vec<OrderItem> {
        &mut self.items
    }

    /// Number of entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        self.items
            .iter()
            .filter_map(|item| match item {
                OrderItem::Expr(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Expression> {
        self.items
            .iter_mut()
            .filter_map(|item| match item {
                OrderItem::Expr(e) => Some(e),
                _ => None,
            })
            .collect()
    }
}

/// `field ASC|DESC`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderClauseExpression {
    field: Field,
    direction: OrderDirection,
}

impl OrderClauseExpression {
    /// Creates an ordering entry.
    #[must_use]
    pub fn new(field: impl Into<Field>, direction: OrderDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// `field ASC`.
    #[must_use]
    pub fn asc(field: impl Into<Field>) -> Self {
        Self::new(field, OrderDirection::Asc)
    }

    /// `field DESC`.
    #[must_use]
    pub fn desc(field: impl Into<Field>) -> Self {
        Self::new(field, OrderDirection::Desc)
    }

    /// The ordered field.
    #[must_use]
    pub const fn field(&self) -> &Field {
        &self.field
    }

    pub(crate) fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    /// Replaces the ordered field.
    pub fn set_field(&mut self, field: impl Into<Field>) {
        self.field = field.into();
    }

    /// The direction.
    #[must_use]
    pub const fn direction(&self) -> OrderDirection {
        self.direction
    }
}
