//! Tuple comparisons: `(a, b) = (:c0, :c1)` and `(a, b) IN ((..), (..))`.

use super::Expression;
use crate::error::{QueryError, Result};
use crate::value::{Field, Operand};

/// `(field, ...) OP (value, ...)`.
///
/// With `IN`/`NOT IN` the value is a list of rows; with any other operator
/// it is a single row. An expression value (usually a sub-query) is
/// compiled in place.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleComparison {
    fields: Vec<Field>,
    value: Operand,
    types: Vec<Option<String>>,
    operator: String,
}

impl TupleComparison {
    /// Creates a tuple comparison.
    ///
    /// Fails when a multi-row operator is given a single row, or when a
    /// single-row operator is given rows of rows.
    pub fn new<I, F>(
        fields: I,
        value: impl Into<Operand>,
        types: &[Option<&str>],
        operator: &str,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        let tuple = Self {
            fields: fields.into_iter().map(Into::into).collect(),
            value: value.into(),
            types: types.iter().map(|t| t.map(String::from)).collect(),
            operator: operator.to_string(),
        };
        tuple.check_shape()?;
        Ok(tuple)
    }

    fn check_shape(&self) -> Result<()> {
        let Operand::List(rows) = &self.value else {
            return Ok(());
        };
        let nested = rows.iter().any(|r| matches!(r, Operand::List(_)));
        if self.is_multi() && !nested && !rows.is_empty() {
            return Err(QueryError::argument(format!(
                "operator `{}` requires a list of tuples",
                self.operator
            )));
        }
        if !self.is_multi() && nested {
            return Err(QueryError::argument(format!(
                "operator `{}` requires a single tuple",
                self.operator
            )));
        }
        Ok(())
    }

    /// Returns `true` for `IN`/`NOT IN`.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        matches!(
            self.operator.to_ascii_lowercase().as_str(),
            "in" | "not in"
        )
    }

    /// The compared fields.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    /// The compared value.
    #[must_use]
    pub const fn value(&self) -> &Operand {
        &self.value
    }

    /// The type of column `index`.
    #[must_use]
    pub fn type_at(&self, index: usize) -> Option<&str> {
        self.types.get(index).and_then(Option::as_deref)
    }

    /// The operator.
    #[must_use]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut out: Vec<&Expression> = self
            .fields
            .iter()
            .filter_map(Field::as_expression)
            .collect();
        out.extend(self.value.expressions());
        out
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Expression> {
        let mut out: Vec<&mut Expression> = self
            .fields
            .iter_mut()
            .filter_map(Field::expression_mut)
            .collect();
        out.extend(self.value.expressions_mut());
        out
    }
}
