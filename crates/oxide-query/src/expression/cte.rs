//! Common table expressions.

use std::fmt;

use super::Expression;

/// Materialization hint of a CTE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    Materialized,
    NotMaterialized,
}

impl fmt::Display for Materialized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Materialized => "MATERIALIZED",
            Self::NotMaterialized => "NOT MATERIALIZED",
        })
    }
}

/// `name(fields) AS [MATERIALIZED] (query)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonTableExpression {
    name: Box<Expression>,
    fields: Vec<Expression>,
    query: Option<Box<Expression>>,
    materialized: Option<Materialized>,
    recursive: bool,
}

impl CommonTableExpression {
    /// Creates a CTE without a body.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Box::new(Expression::identifier(name)),
            fields: Vec::new(),
            query: None,
            materialized: None,
            recursive: false,
        }
    }

    /// Replaces the name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Box::new(Expression::identifier(name));
        self
    }

    /// Sets the body, usually a query.
    #[must_use]
    pub fn query(mut self, query: impl Into<Expression>) -> Self {
        self.query = Some(Box::new(query.into()));
        self
    }

    /// Appends column names.
    #[must_use]
    pub fn field<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .extend(fields.into_iter().map(Expression::identifier));
        self
    }

    /// Adds `MATERIALIZED`.
    #[must_use]
    pub const fn materialized(mut self) -> Self {
        self.materialized = Some(Materialized::Materialized);
        self
    }

    /// Adds `NOT MATERIALIZED`.
    #[must_use]
    pub const fn not_materialized(mut self) -> Self {
        self.materialized = Some(Materialized::NotMaterialized);
        self
    }

    /// Marks the CTE as recursive, which turns `WITH` into
    /// `WITH RECURSIVE`.
    #[must_use]
    pub const fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// The name node.
    #[must_use]
    pub fn cte_name(&self) -> &Expression {
        &self.name
    }

    /// The column list.
    #[must_use]
    pub fn fields(&self) -> &[Expression] {
        &self.fields
    }

    /// The body.
    #[must_use]
    pub fn body(&self) -> Option<&Expression> {
        self.query.as_deref()
    }

    /// The materialization hint.
    #[must_use]
    pub const fn materialization(&self) -> Option<Materialized> {
        self.materialized
    }

    #[must_use]
    pub const fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut out = vec![self.name.as_ref()];
        out.extend(self.fields.iter());
        out.extend(self.query.as_deref());
        out
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Expression> {
        let mut out = vec![self.name.as_mut()];
        out.extend(self.fields.iter_mut());
        out.extend(self.query.as_deref_mut());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let cte = CommonTableExpression::new("recent")
            .field(["id", "title"])
            .query(Expression::raw("SELECT id, title FROM articles"))
            .not_materialized()
            .recursive();
        assert!(cte.is_recursive());
        assert_eq!(cte.materialization(), Some(Materialized::NotMaterialized));
        assert_eq!(cte.fields().len(), 2);
        // name, two fields, body
        assert_eq!(cte.children().len(), 4);
    }

    #[test]
    fn test_materialized_display() {
        assert_eq!(Materialized::NotMaterialized.to_string(), "NOT MATERIALIZED");
    }
}
