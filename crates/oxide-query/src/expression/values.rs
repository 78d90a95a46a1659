//! The row list of an INSERT.

use indexmap::IndexMap;

use super::Expression;
use crate::error::{QueryError, Result};
use crate::types::{CasterHandle, TypeMap};
use crate::value::Operand;

/// `VALUES (...), (...)` or a sub-select feeding an INSERT.
///
/// Rows are keyed by column name and cast eagerly through the column types
/// of the type map. Columns missing from a row compile as `NULL`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValuesExpression {
    columns: Vec<String>,
    rows: Vec<IndexMap<String, Operand>>,
    query: Option<Box<Expression>>,
    type_map: TypeMap,
    caster: CasterHandle,
}

impl ValuesExpression {
    /// Creates an empty row list for `columns`.
    #[must_use]
    pub fn new<I, S>(columns: I, type_map: TypeMap, caster: CasterHandle) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            query: None,
            type_map,
            caster,
        }
    }

    /// Appends a row.
    pub fn add_row<I, K, V>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        if self.query.is_some() {
            return Err(QueryError::MixedInsertValues);
        }
        let mut cast = IndexMap::new();
        for (column, value) in row {
            let column = column.into();
            let type_name = self.type_map.type_of(&column).map(String::from);
            let value = self.caster.cast_to(value.into(), type_name.as_deref())?;
            cast.insert(column, value);
        }
        self.rows.push(cast);
        Ok(())
    }

    /// Uses a sub-select instead of literal rows.
    pub fn set_query(&mut self, query: impl Into<Expression>) -> Result<()> {
        if !self.rows.is_empty() {
            return Err(QueryError::MixedInsertValues);
        }
        self.query = Some(Box::new(query.into()));
        Ok(())
    }

    /// The declared columns, as given.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Replaces the declared columns.
    pub fn set_columns<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
    }

    /// Column names with identifier quotes removed, used to key rows.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.replace(['`', '[', ']', '"'], ""))
            .collect()
    }

    /// The literal rows.
    #[must_use]
    pub fn rows(&self) -> &[IndexMap<String, Operand>] {
        &self.rows
    }

    /// The sub-select, if any.
    #[must_use]
    pub fn query(&self) -> Option<&Expression> {
        self.query.as_deref()
    }

    /// The type map used for casting and binding.
    #[must_use]
    pub const fn type_map(&self) -> &TypeMap {
        &self.type_map
    }

    /// Replaces the type map used for rows added from now on.
    pub fn set_type_map(&mut self, type_map: TypeMap) {
        self.type_map = type_map;
    }

    /// Returns `true` when neither rows nor a sub-select are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.query.is_none()
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut out: Vec<&Expression> = self
            .rows
            .iter()
            .flat_map(|row| row.values().flat_map(Operand::expressions))
            .collect();
        out.extend(self.query.as_deref());
        out
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Expression> {
        let mut out: Vec<&mut Expression> = self
            .rows
            .iter_mut()
            .flat_map(|row| row.values_mut().flat_map(Operand::expressions_mut))
            .collect();
        out.extend(self.query.as_deref_mut());
        out
    }
}
