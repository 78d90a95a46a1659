//! SQL values, operands and field references.
//!
//! [`SqlValue`] is what ends up bound to a placeholder. [`Operand`] is the
//! "anything" slot of the builder API: a scalar, a nested expression or a
//! list of either. [`Field`] is the left-hand side of comparisons, which may
//! be a plain column name or an expression.

use chrono::{NaiveDate, NaiveDateTime};

use crate::expression::Expression;

/// A SQL value that can be bound as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time without zone.
    DateTime(NaiveDateTime),
    /// JSON document.
    Json(serde_json::Value),
}

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// **Warning**: only meant for logging; compiled queries always bind.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => quote_text(s),
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Self::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::Json(v) => quote_text(&v.to_string()),
        }
    }

    /// Returns `true` for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Infers the logical type name of this value.
    ///
    /// Numbers map to `integer`/`float`, booleans to `boolean`, text to
    /// `string` and temporal values to `date`/`datetime`. `NULL` has no type.
    #[must_use]
    pub const fn inferred_type(&self) -> Option<&'static str> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some("boolean"),
            Self::Int(_) => Some("integer"),
            Self::Float(_) => Some("float"),
            Self::Text(_) => Some("string"),
            Self::Blob(_) => Some("binary"),
            Self::Date(_) => Some("date"),
            Self::DateTime(_) => Some("datetime"),
            Self::Json(_) => Some("json"),
        }
    }

    /// Renders the value as plain text, without quoting.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            Self::Json(v) => Some(v.to_string()),
        }
    }
}

fn quote_text(s: &str) -> String {
    // Escape single quotes by doubling them
    let escaped = s.replace('\'', "''");
    format!("'{escaped}'")
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u8 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Date(self)
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::DateTime(self)
    }
}

impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Json(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

/// A value slot in the expression tree.
///
/// Lists keep their positional order; expression elements inside a list are
/// compiled in place while scalar elements are bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A scalar to bind.
    Value(SqlValue),
    /// A nested expression (including sub-queries).
    Expr(Box<Expression>),
    /// A collection, used by multi-value comparisons and tuples.
    List(Vec<Operand>),
}

impl Operand {
    /// The SQL `NULL` operand.
    #[must_use]
    pub const fn null() -> Self {
        Self::Value(SqlValue::Null)
    }

    /// Returns `true` when this is a `NULL` scalar.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Value(SqlValue::Null))
    }

    /// Returns the wrapped expression, if any.
    #[must_use]
    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Self::Expr(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the wrapped scalar, if any.
    #[must_use]
    pub const fn as_value(&self) -> Option<&SqlValue> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Infers a logical type for the operand.
    ///
    /// Scalars use [`SqlValue::inferred_type`]; typed expressions report their
    /// return type. Lists and untyped expressions have no inferred type.
    #[must_use]
    pub fn inferred_type(&self) -> Option<String> {
        match self {
            Self::Value(v) => v.inferred_type().map(String::from),
            Self::Expr(e) => e.return_type(),
            Self::List(_) => None,
        }
    }

    /// Expressions held by this operand, including those nested in lists.
    #[must_use]
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            Self::Value(_) => Vec::new(),
            Self::Expr(e) => vec![e.as_ref()],
            Self::List(items) => items.iter().flat_map(Self::expressions).collect(),
        }
    }

    pub(crate) fn expressions_mut(&mut self) -> Vec<&mut Expression> {
        match self {
            Self::Value(_) => Vec::new(),
            Self::Expr(e) => vec![e.as_mut()],
            Self::List(items) => items.iter_mut().flat_map(Self::expressions_mut).collect(),
        }
    }

    /// Applies `f` to every scalar of this operand, recursing into lists.
    pub(crate) fn try_map_values<F>(self, f: &mut F) -> crate::Result<Self>
    where
        F: FnMut(SqlValue) -> crate::Result<Self>,
    {
        match self {
            Self::Value(v) => f(v),
            Self::Expr(e) => Ok(Self::Expr(e)),
            Self::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Self::Value(v) => f(v),
                    other => Ok(other),
                })
                .collect::<crate::Result<Vec<_>>>()
                .map(Self::List),
        }
    }
}

macro_rules! operand_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Self::Value(value.to_sql_value())
                }
            }
        )*
    };
}

operand_from_scalar!(
    SqlValue,
    bool,
    i64,
    i32,
    i16,
    u32,
    u16,
    u8,
    f64,
    f32,
    String,
    &str,
    NaiveDate,
    NaiveDateTime,
    serde_json::Value,
);

impl<T: Into<Self>> From<Option<T>> for Operand {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Value(SqlValue::Null), Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Operand {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>, const N: usize> From<[T; N]> for Operand {
    fn from(values: [T; N]) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Expression> for Operand {
    fn from(expr: Expression) -> Self {
        Self::Expr(Box::new(expr))
    }
}

/// The left-hand side of a comparison: a column name or an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A column reference written as text (`articles.id`).
    Name(String),
    /// Any other expression.
    Expr(Box<Expression>),
}

impl Field {
    /// Returns the column name for textual fields.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(n) => Some(n),
            Self::Expr(_) => None,
        }
    }

    /// Returns the expression for expression fields.
    #[must_use]
    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Self::Name(_) => None,
            Self::Expr(e) => Some(e),
        }
    }

    pub(crate) fn expression_mut(&mut self) -> Option<&mut Expression> {
        match self {
            Self::Name(_) => None,
            Self::Expr(e) => Some(e),
        }
    }

    /// A readable label for error messages.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Name(n) => n.clone(),
            Self::Expr(e) => format!("{} expression", e.kind()),
        }
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Expression> for Field {
    fn from(expr: Expression) -> Self {
        Self::Expr(Box::new(expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_inline_text_escaping() {
        assert_eq!(
            SqlValue::Text(String::from("O'Brien")).to_sql_inline(),
            "'O''Brien'"
        );
        assert_eq!(
            SqlValue::Blob(vec![0x48, 0x49]).to_sql_inline(),
            "X'4849'"
        );
    }

    #[test]
    fn test_inferred_types() {
        assert_eq!(SqlValue::Int(1).inferred_type(), Some("integer"));
        assert_eq!(SqlValue::Float(1.5).inferred_type(), Some("float"));
        assert_eq!(SqlValue::Bool(true).inferred_type(), Some("boolean"));
        assert_eq!(SqlValue::Text("x".into()).inferred_type(), Some("string"));
        assert_eq!(SqlValue::Null.inferred_type(), None);
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(SqlValue::Date(date).inferred_type(), Some("date"));
    }

    #[test]
    fn test_operand_conversions() {
        assert_eq!(Operand::from(42), Operand::Value(SqlValue::Int(42)));
        assert_eq!(Operand::from(None::<i32>), Operand::null());
        assert_eq!(
            Operand::from(vec![1, 2]),
            Operand::List(vec![
                Operand::Value(SqlValue::Int(1)),
                Operand::Value(SqlValue::Int(2)),
            ])
        );
        assert_eq!(
            Operand::from(["a", "b"]),
            Operand::List(vec![Operand::from("a"), Operand::from("b")])
        );
    }

    #[test]
    fn test_to_text() {
        assert_eq!(SqlValue::Bool(true).to_text().as_deref(), Some("1"));
        assert_eq!(SqlValue::Int(-3).to_text().as_deref(), Some("-3"));
        assert_eq!(SqlValue::Null.to_text(), None);
    }
}
