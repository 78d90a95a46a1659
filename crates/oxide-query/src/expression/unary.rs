//! Prefix and postfix operators.

use super::Expression;

/// Where the operator sits relative to its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryPosition {
    /// `OP (operand)`
    Prefix,
    /// `(operand) OP`
    Postfix,
}

/// A unary operator applied to one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    operator: String,
    value: Box<Expression>,
    position: UnaryPosition,
}

impl UnaryExpression {
    /// Creates a unary expression.
    #[must_use]
    pub fn new(operator: &str, value: impl Into<Expression>, position: UnaryPosition) -> Self {
        Self {
            operator: operator.to_string(),
            value: Box::new(value.into()),
            position,
        }
    }

    /// `NOT (value)`.
    #[must_use]
    pub fn not(value: impl Into<Expression>) -> Self {
        Self::new("NOT", value, UnaryPosition::Prefix)
    }

    /// `(value) IS NULL`.
    #[must_use]
    pub fn is_null(value: impl Into<Expression>) -> Self {
        Self::new("IS NULL", value, UnaryPosition::Postfix)
    }

    /// `(value) IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(value: impl Into<Expression>) -> Self {
        Self::new("IS NOT NULL", value, UnaryPosition::Postfix)
    }

    /// `EXISTS (query)`.
    #[must_use]
    pub fn exists(query: impl Into<Expression>) -> Self {
        Self::new("EXISTS", query, UnaryPosition::Prefix)
    }

    /// `NOT EXISTS (query)`.
    #[must_use]
    pub fn not_exists(query: impl Into<Expression>) -> Self {
        Self::new("NOT EXISTS", query, UnaryPosition::Prefix)
    }

    /// The operator.
    #[must_use]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// The operand.
    #[must_use]
    pub fn value(&self) -> &Expression {
        &self.value
    }

    /// Mutable access to the operand.
    pub fn value_mut(&mut self) -> &mut Expression {
        &mut self.value
    }

    /// The operator position.
    #[must_use]
    pub const fn position(&self) -> UnaryPosition {
        self.position
    }
}
