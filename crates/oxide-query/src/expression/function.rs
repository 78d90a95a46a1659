//! Function and aggregate calls.

use super::{Conditions, Expression, QueryExpression, WindowExpression};
use crate::error::Result;
use crate::value::Operand;

/// `NAME(arg, ...)`.
///
/// Scalar arguments are bound as `:param_N` placeholders; expression
/// arguments are compiled in place.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    name: String,
    args: Vec<Operand>,
    arg_types: Vec<Option<String>>,
    return_type: String,
}

impl FunctionExpression {
    /// Creates a call without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            arg_types: Vec::new(),
            return_type: return_type.into(),
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Operand>, type_name: Option<&str>) -> Self {
        self.args.push(value.into());
        self.arg_types.push(type_name.map(String::from));
        self
    }

    /// Appends a raw SQL argument.
    #[must_use]
    pub fn literal(self, sql: impl Into<String>) -> Self {
        self.arg(Expression::raw(sql), None)
    }

    /// Appends an identifier argument.
    #[must_use]
    pub fn identifier(self, name: impl Into<String>) -> Self {
        self.arg(Expression::identifier(name), None)
    }

    /// The function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the function name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The arguments.
    #[must_use]
    pub fn args(&self) -> &[Operand] {
        &self.args
    }

    /// The declared type of argument `index`.
    #[must_use]
    pub fn arg_type(&self, index: usize) -> Option<&str> {
        self.arg_types.get(index).and_then(Option::as_deref)
    }

    /// The return type.
    #[must_use]
    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    /// Replaces the return type.
    #[must_use]
    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = type_name.into();
        self
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        self.args.iter().filter_map(Operand::as_expression).collect()
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Expression> {
        self.args
            .iter_mut()
            .filter_map(|arg| match arg {
                Operand::Expr(e) => Some(e.as_mut()),
                _ => None,
            })
            .collect()
    }
}

/// An aggregate call with optional `FILTER (WHERE ...)` and `OVER (...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpression {
    function: FunctionExpression,
    filter: Option<Box<Expression>>,
    window: Option<Box<Expression>>,
}

impl AggregateExpression {
    /// Creates an aggregate call.
    #[must_use]
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            function: FunctionExpression::new(name, return_type),
            filter: None,
            window: None,
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Operand>, type_name: Option<&str>) -> Self {
        self.function = self.function.arg(value, type_name);
        self
    }

    /// Appends an identifier argument.
    #[must_use]
    pub fn identifier(mut self, name: impl Into<String>) -> Self {
        self.function = self.function.identifier(name);
        self
    }

    /// Appends a raw SQL argument.
    #[must_use]
    pub fn literal(mut self, sql: impl Into<String>) -> Self {
        self.function = self.function.literal(sql);
        self
    }

    /// Adds `FILTER (WHERE conditions)`; repeated calls extend the filter.
    pub fn filter(mut self, conditions: impl Into<Conditions>) -> Result<Self> {
        let mut tree = match self.filter.take().map(|b| *b) {
            Some(Expression::Conditions(tree)) => tree,
            _ => QueryExpression::new(),
        };
        tree.append(conditions)?;
        self.filter = Some(Box::new(Expression::Conditions(tree)));
        Ok(self)
    }

    /// Adds `OVER (window)`.
    #[must_use]
    pub fn over(mut self, window: WindowExpression) -> Self {
        self.window = Some(Box::new(Expression::Window(window)));
        self
    }

    /// Adds `OVER name`, referring to a named window.
    #[must_use]
    pub fn over_named(self, name: impl Into<String>) -> Self {
        self.over(WindowExpression::named(name))
    }

    /// The underlying call.
    #[must_use]
    pub const fn function(&self) -> &FunctionExpression {
        &self.function
    }

    /// The filter conditions.
    #[must_use]
    pub fn filter_conditions(&self) -> Option<&Expression> {
        self.filter.as_deref()
    }

    /// The window.
    #[must_use]
    pub fn window(&self) -> Option<&WindowExpression> {
        match self.window.as_deref() {
            Some(Expression::Window(w)) => Some(w),
            _ => None,
        }
    }

    pub(crate) fn window_node(&self) -> Option<&Expression> {
        self.window.as_deref()
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut out = self.function.children();
        out.extend(self.filter.as_deref());
        out.extend(self.window.as_deref());
        out
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Expression> {
        let mut out = self.function.children_mut();
        out.extend(self.filter.as_deref_mut());
        out.extend(self.window.as_deref_mut());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_arguments() {
        let func = FunctionExpression::new("CONCAT", "string")
            .identifier("first_name")
            .literal("' '")
            .arg("x", Some("string"));
        assert_eq!(func.args().len(), 3);
        assert_eq!(func.arg_type(2), Some("string"));
        assert_eq!(func.arg_type(0), None);
        assert_eq!(func.children().len(), 2);
    }

    #[test]
    fn test_aggregate_children() {
        let agg = AggregateExpression::new("COUNT", "integer")
            .literal("*")
            .filter([("status", "active")])
            .unwrap()
            .over(WindowExpression::new().partition(["category_id"]));
        // literal, filter tree, window
        assert_eq!(agg.children().len(), 3);
        assert!(agg.window().is_some());
    }

    #[test]
    fn test_return_type_reported() {
        let expr = Expression::from(FunctionExpression::new("SUM", "float"));
        assert_eq!(expr.return_type().as_deref(), Some("float"));
    }
}
