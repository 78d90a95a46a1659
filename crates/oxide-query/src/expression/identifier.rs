//! Identifier and collated string literals.

/// An unescaped column or table reference, optionally collated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierExpression {
    name: String,
    collation: Option<String>,
}

impl IdentifierExpression {
    /// Creates an identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collation: None,
        }
    }

    /// Sets the collation.
    #[must_use]
    pub fn collate(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    /// The identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the identifier.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The collation, if any.
    #[must_use]
    pub fn collation(&self) -> Option<&str> {
        self.collation.as_deref()
    }
}

/// A string literal compiled as a bound parameter with a forced collation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringExpression {
    value: String,
    collation: String,
}

impl StringExpression {
    /// Creates a collated string literal.
    #[must_use]
    pub fn new(value: impl Into<String>, collation: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            collation: collation.into(),
        }
    }

    /// The literal value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The collation.
    #[must_use]
    pub fn collation(&self) -> &str {
        &self.collation
    }

    /// Replaces the collation.
    pub fn set_collation(&mut self, collation: impl Into<String>) {
        self.collation = collation.into();
    }
}
