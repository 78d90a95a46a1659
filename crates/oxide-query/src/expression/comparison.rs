//! Binary comparisons and BETWEEN ranges.

use super::Expression;
use crate::error::Result;
use crate::types::{self, CasterHandle};
use crate::value::{Field, Operand, SqlValue};

/// `field OP value`.
///
/// When the logical type carries the `[]` suffix the comparison is
/// *multiple*: the value is a list compiled as `(:c_0,:c_1,...)`. Expression
/// elements of that list stay in place and are visited by traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpression {
    field: Field,
    value: Operand,
    type_name: Option<String>,
    operator: String,
    is_multiple: bool,
}

impl ComparisonExpression {
    /// Creates a comparison without casting the value.
    #[must_use]
    pub fn new(
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
        operator: &str,
    ) -> Self {
        let is_multiple = types::is_multiple(type_name);
        Self {
            field: field.into(),
            value: normalize(value.into(), is_multiple),
            type_name: type_name.map(String::from),
            operator: operator.to_string(),
            is_multiple,
        }
    }

    /// Creates a comparison whose value is cast through `caster`.
    pub fn typed(
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
        operator: &str,
        caster: &CasterHandle,
    ) -> Result<Self> {
        let mut comparison = Self::new(field, Operand::null(), type_name, operator);
        comparison.set_value(value, caster)?;
        Ok(comparison)
    }

    /// The compared field.
    #[must_use]
    pub const fn field(&self) -> &Field {
        &self.field
    }

    pub(crate) fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    /// Replaces the compared field.
    pub fn set_field(&mut self, field: impl Into<Field>) {
        self.field = field.into();
    }

    /// The value, after casting.
    #[must_use]
    pub const fn value(&self) -> &Operand {
        &self.value
    }

    /// Casts and stores a new value.
    ///
    /// The value is re-run through `caster` with the comparison type. A
    /// single expression given to a multiple comparison is kept whole.
    pub fn set_value(&mut self, value: impl Into<Operand>, caster: &CasterHandle) -> Result<()> {
        let value = caster.cast_to(value.into(), self.type_name.as_deref())?;
        self.is_multiple = types::is_multiple(self.type_name.as_deref());
        self.value = normalize(value, self.is_multiple);
        Ok(())
    }

    /// The logical type.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// The operator.
    #[must_use]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Replaces the operator.
    pub fn set_operator(&mut self, operator: impl Into<String>) {
        self.operator = operator.into();
    }

    /// Returns `true` when the value is a list.
    #[must_use]
    pub const fn is_multiple(&self) -> bool {
        self.is_multiple
    }

    /// Expressions found among the values of a multiple comparison.
    #[must_use]
    pub fn value_expressions(&self) -> Vec<&Expression> {
        match &self.value {
            Operand::List(items) => items.iter().filter_map(Operand::as_expression).collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut out: Vec<&Expression> = self.field.as_expression().into_iter().collect();
        out.extend(self.value.expressions());
        out
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Expression> {
        let mut out: Vec<&mut Expression> = self.field.expression_mut().into_iter().collect();
        out.extend(self.value.expressions_mut());
        out
    }
}

fn normalize(value: Operand, is_multiple: bool) -> Operand {
    match value {
        Operand::Value(v) if is_multiple => match v {
            SqlValue::Null => Operand::List(Vec::new()),
            other => Operand::List(vec![Operand::Value(other)]),
        },
        other => other,
    }
}

/// `field BETWEEN from AND to`.
#[derive(Debug, Clone, PartialEq)]
pub struct BetweenExpression {
    field: Field,
    from: Operand,
    to: Operand,
    type_name: Option<String>,
}

impl BetweenExpression {
    /// Creates a range check without casting the bounds.
    #[must_use]
    pub fn new(
        field: impl Into<Field>,
        from: impl Into<Operand>,
        to: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Self {
        Self {
            field: field.into(),
            from: from.into(),
            to: to.into(),
            type_name: type_name.map(String::from),
        }
    }

    /// Creates a range check whose bounds are cast independently.
    pub fn typed(
        field: impl Into<Field>,
        from: impl Into<Operand>,
        to: impl Into<Operand>,
        type_name: Option<&str>,
        caster: &CasterHandle,
    ) -> Result<Self> {
        let from = caster.cast_to(from.into(), type_name)?;
        let to = caster.cast_to(to.into(), type_name)?;
        Ok(Self::new(field, from, to, type_name))
    }

    /// The compared field.
    #[must_use]
    pub const fn field(&self) -> &Field {
        &self.field
    }

    pub(crate) fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    /// Replaces the compared field.
    pub fn set_field(&mut self, field: impl Into<Field>) {
        self.field = field.into();
    }

    /// The lower bound.
    #[must_use]
    pub const fn from_value(&self) -> &Operand {
        &self.from
    }

    /// The upper bound.
    #[must_use]
    pub const fn to_value(&self) -> &Operand {
        &self.to
    }

    /// The logical type of the bounds.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut out: Vec<&Expression> = self.field.as_expression().into_iter().collect();
        out.extend(self.from.as_expression());
        out.extend(self.to.as_expression());
        out
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Expression> {
        let mut out: Vec<&mut Expression> = self.field.expression_mut().into_iter().collect();
        if let Operand::Expr(e) = &mut self.from {
            out.push(e.as_mut());
        }
        if let Operand::Expr(e) = &mut self.to {
            out.push(e.as_mut());
        }
        out
    }
}
