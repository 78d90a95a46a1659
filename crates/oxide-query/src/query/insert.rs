//! INSERT builder methods.

use super::{Query, QueryKind};
use crate::error::{QueryError, Result};
use crate::expression::{Expression, ValuesExpression};
use crate::value::Operand;

impl Query {
    /// An INSERT into the given columns.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InsertWithoutColumns`] for an empty column list.
    pub fn insert<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(QueryKind::Insert).columns(columns)
    }

    /// Sets the INSERT columns, keeping rows added so far.
    pub fn columns<I, S>(mut self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(QueryError::InsertWithoutColumns);
        }
        match &mut self.parts.values {
            Some(values) => values.set_columns(columns.clone()),
            None => {
                self.parts.values = Some(ValuesExpression::new(
                    columns.clone(),
                    self.type_map.clone(),
                    self.caster.clone(),
                ));
            }
        }
        self.parts.insert.columns = columns;
        Ok(self)
    }

    /// Sets the INSERT target table.
    #[must_use]
    pub fn into_table(mut self, table: impl Into<String>) -> Self {
        self.parts.insert.table = Some(table.into());
        self
    }

    fn values_mut(&mut self) -> Result<&mut ValuesExpression> {
        if self.parts.insert.columns.is_empty() {
            return Err(QueryError::ValuesBeforeColumns);
        }
        let values = self.parts.values.get_or_insert_with(|| {
            ValuesExpression::new(
                self.parts.insert.columns.clone(),
                self.type_map.clone(),
                self.caster.clone(),
            )
        });
        values.set_type_map(self.type_map.clone());
        Ok(values)
    }

    /// Adds a row of `(column, value)` pairs, cast by column type.
    ///
    /// # Errors
    ///
    /// Fails with [`QueryError::ValuesBeforeColumns`] before `insert()`, and
    /// with [`QueryError::MixedInsertValues`] after [`Self::values_from`].
    pub fn values<I, K, V>(mut self, row: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        self.values_mut()?.add_row(row)?;
        Ok(self)
    }

    /// Inserts the rows of a sub-select.
    pub fn values_from(mut self, query: impl Into<Expression>) -> Result<Self> {
        self.values_mut()?.set_query(query)?;
        Ok(self)
    }

    /// Replaces the row list.
    #[must_use]
    pub fn set_values(mut self, values: ValuesExpression) -> Self {
        self.parts.values = Some(values);
        self
    }
}
