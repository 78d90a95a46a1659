//! Value casters converting operands to their logical type before binding.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::{base_type, is_multiple, TypeRegistry};
use crate::error::Result;
use crate::value::{Operand, SqlValue};

/// Converts raw operands into their bound representation.
///
/// A caster sees every scalar headed for a placeholder together with the
/// logical type attached to it. It may return a converted scalar or replace
/// the value with an expression. Lists are only mapped element-wise when the
/// type carries the `[]` suffix.
pub trait TypeCaster: Send + Sync + fmt::Debug {
    /// A short name, used in logs and comparisons.
    fn name(&self) -> &'static str;

    /// Casts `value` to `type_name`.
    fn cast_to(&self, value: Operand, type_name: Option<&str>) -> Result<Operand>;
}

/// Casts every scalar to its textual form.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringTypeCaster;

impl TypeCaster for StringTypeCaster {
    fn name(&self) -> &'static str {
        "string"
    }

    fn cast_to(&self, value: Operand, type_name: Option<&str>) -> Result<Operand> {
        let mut to_text = |v: SqlValue| -> Result<Operand> {
            Ok(Operand::Value(
                v.to_text().map_or(SqlValue::Null, SqlValue::Text),
            ))
        };
        match value {
            Operand::Value(v) => to_text(v),
            Operand::List(_) if is_multiple(type_name) => value.try_map_values(&mut to_text),
            other => Ok(other),
        }
    }
}

/// Casts values through the [`TypeRegistry`].
///
/// Unknown type names leave the value untouched.
#[derive(Debug, Clone, Default)]
pub struct DatabaseTypeCaster {
    registry: TypeRegistry,
}

impl DatabaseTypeCaster {
    /// Creates a caster over a custom registry.
    #[must_use]
    pub const fn new(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    /// The registry used for lookups.
    #[must_use]
    pub const fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
}

impl TypeCaster for DatabaseTypeCaster {
    fn name(&self) -> &'static str {
        "database"
    }

    fn cast_to(&self, value: Operand, type_name: Option<&str>) -> Result<Operand> {
        let Some(type_name) = type_name else {
            return Ok(value);
        };
        let Some(ty) = self.registry.get(base_type(type_name)) else {
            trace!(type_name, "no registered type, value left as is");
            return Ok(value);
        };
        let mut cast = |v: SqlValue| -> Result<Operand> {
            if v.is_null() {
                return Ok(Operand::Value(v));
            }
            if let Some(expr) = ty.to_expression(&v) {
                return Ok(Operand::from(expr));
            }
            ty.to_database(v).map(Operand::Value)
        };
        match value {
            Operand::Value(v) => cast(v),
            Operand::List(_) if is_multiple(Some(type_name)) => value.try_map_values(&mut cast),
            other => Ok(other),
        }
    }
}

/// A shared handle to the caster used by a query.
#[derive(Clone)]
pub struct CasterHandle(Arc<dyn TypeCaster>);

impl CasterHandle {
    /// Wraps a caster.
    #[must_use]
    pub fn new(caster: impl TypeCaster + 'static) -> Self {
        Self(Arc::new(caster))
    }

    /// Wraps an already shared caster.
    #[must_use]
    pub fn from_arc(caster: Arc<dyn TypeCaster>) -> Self {
        Self(caster)
    }

    /// The caster name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Casts `value` to `type_name`.
    pub fn cast_to(&self, value: Operand, type_name: Option<&str>) -> Result<Operand> {
        self.0.cast_to(value, type_name)
    }
}

impl Default for CasterHandle {
    fn default() -> Self {
        Self::new(DatabaseTypeCaster::default())
    }
}

impl fmt::Debug for CasterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CasterHandle").field(&self.0.name()).finish()
    }
}

impl PartialEq for CasterHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.name() == other.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_caster_scalar() {
        let cast = StringTypeCaster.cast_to(Operand::from(12), None).unwrap();
        assert_eq!(cast, Operand::from("12"));
    }

    #[test]
    fn test_string_caster_maps_lists_only_for_multiple_types() {
        let cast = StringTypeCaster
            .cast_to(Operand::from(vec![1, 2]), Some("integer[]"))
            .unwrap();
        assert_eq!(cast, Operand::from(vec!["1", "2"]));

        let untouched = StringTypeCaster
            .cast_to(Operand::from(vec![1, 2]), Some("integer"))
            .unwrap();
        assert_eq!(untouched, Operand::from(vec![1, 2]));
    }

    #[test]
    fn test_database_caster_converts_known_types() {
        let caster = DatabaseTypeCaster::default();
        let cast = caster.cast_to(Operand::from("7"), Some("integer")).unwrap();
        assert_eq!(cast, Operand::from(7));

        let list = caster
            .cast_to(Operand::from(vec!["1", "2"]), Some("integer[]"))
            .unwrap();
        assert_eq!(list, Operand::from(vec![1, 2]));
    }

    #[test]
    fn test_database_caster_unknown_type_passes_through() {
        let caster = DatabaseTypeCaster::default();
        let cast = caster.cast_to(Operand::from("x"), Some("point")).unwrap();
        assert_eq!(cast, Operand::from("x"));
        assert_eq!(caster.cast_to(Operand::null(), Some("integer")).unwrap(), Operand::null());
    }

    #[test]
    fn test_handle_equality() {
        let a = CasterHandle::default();
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, CasterHandle::new(StringTypeCaster));
    }
}
