//! Built-in logical types and the registry resolving type names.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{QueryError, Result};
use crate::expression::Expression;
use crate::value::SqlValue;

/// A logical column type.
///
/// `to_database` converts a raw value to the form the database expects.
/// Types that need SQL around the value (encryption functions, geometry
/// constructors, ...) override `to_expression`; the returned expression is
/// spliced into the tree instead of binding a scalar.
pub trait SqlType: Send + Sync + fmt::Debug {
    /// The type name.
    fn name(&self) -> &str;

    /// Converts a value to its database representation.
    fn to_database(&self, value: SqlValue) -> Result<SqlValue>;

    /// Converts a value into an expression, for types that produce SQL.
    fn to_expression(&self, _value: &SqlValue) -> Option<Expression> {
        None
    }
}

fn cast_error(type_name: &str, value: &SqlValue) -> QueryError {
    QueryError::TypeCast {
        type_name: type_name.to_string(),
        message: format!("unsupported value {}", value.to_sql_inline()),
    }
}

/// Text types (`string`, `text`, `char`, `uuid`).
#[derive(Debug, Clone)]
pub struct StringType {
    name: String,
}

impl StringType {
    /// Creates a text type under the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SqlType for StringType {
    fn name(&self) -> &str {
        &self.name
    }

    fn to_database(&self, value: SqlValue) -> Result<SqlValue> {
        Ok(match value {
            SqlValue::Null | SqlValue::Text(_) => value,
            other => other.to_text().map_or(SqlValue::Null, SqlValue::Text),
        })
    }
}

/// Integer types (`integer`, `biginteger`, `smallinteger`, `tinyinteger`).
#[derive(Debug, Clone)]
pub struct IntegerType {
    name: String,
}

impl IntegerType {
    /// Creates an integer type under the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SqlType for IntegerType {
    fn name(&self) -> &str {
        &self.name
    }

    #[allow(clippy::cast_possible_truncation)]
    fn to_database(&self, value: SqlValue) -> Result<SqlValue> {
        match value {
            SqlValue::Null | SqlValue::Int(_) => Ok(value),
            SqlValue::Bool(b) => Ok(SqlValue::Int(i64::from(b))),
            SqlValue::Float(f) => Ok(SqlValue::Int(f.trunc() as i64)),
            SqlValue::Text(ref s) if s.trim().is_empty() => Ok(SqlValue::Null),
            SqlValue::Text(ref s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .or_else(|_| trimmed.parse::<f64>().map(|f| f.trunc() as i64))
                    .map(SqlValue::Int)
                    .map_err(|_| cast_error(&self.name, &value))
            }
            other => Err(cast_error(&self.name, &other)),
        }
    }
}

/// Floating point types (`float`, `decimal`).
#[derive(Debug, Clone)]
pub struct FloatType {
    name: String,
}

impl FloatType {
    /// Creates a float type under the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SqlType for FloatType {
    fn name(&self) -> &str {
        &self.name
    }

    #[allow(clippy::cast_precision_loss)]
    fn to_database(&self, value: SqlValue) -> Result<SqlValue> {
        match value {
            SqlValue::Null | SqlValue::Float(_) => Ok(value),
            SqlValue::Int(n) => Ok(SqlValue::Float(n as f64)),
            SqlValue::Bool(b) => Ok(SqlValue::Float(if b { 1.0 } else { 0.0 })),
            SqlValue::Text(ref s) if s.trim().is_empty() => Ok(SqlValue::Null),
            SqlValue::Text(ref s) => s
                .trim()
                .parse::<f64>()
                .map(SqlValue::Float)
                .map_err(|_| cast_error(&self.name, &value)),
            other => Err(cast_error(&self.name, &other)),
        }
    }
}

/// The `boolean` type.
#[derive(Debug, Clone, Default)]
pub struct BooleanType;

impl SqlType for BooleanType {
    fn name(&self) -> &str {
        "boolean"
    }

    fn to_database(&self, value: SqlValue) -> Result<SqlValue> {
        match value {
            SqlValue::Null | SqlValue::Bool(_) => Ok(value),
            SqlValue::Int(n) => Ok(SqlValue::Bool(n != 0)),
            SqlValue::Text(ref s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Ok(SqlValue::Bool(true)),
                "0" | "false" | "off" | "no" | "" => Ok(SqlValue::Bool(false)),
                _ => Err(cast_error("boolean", &value)),
            },
            other => Err(cast_error("boolean", &other)),
        }
    }
}

/// The `date` type.
#[derive(Debug, Clone, Default)]
pub struct DateType;

impl SqlType for DateType {
    fn name(&self) -> &str {
        "date"
    }

    fn to_database(&self, value: SqlValue) -> Result<SqlValue> {
        match value {
            SqlValue::Null | SqlValue::Date(_) => Ok(value),
            SqlValue::DateTime(dt) => Ok(SqlValue::Date(dt.date())),
            SqlValue::Text(ref s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(SqlValue::Date)
                .map_err(|e| QueryError::TypeCast {
                    type_name: "date".to_string(),
                    message: e.to_string(),
                }),
            other => Err(cast_error("date", &other)),
        }
    }
}

/// Date-time types (`datetime`, `timestamp`).
#[derive(Debug, Clone)]
pub struct DateTimeType {
    name: String,
}

impl DateTimeType {
    /// Creates a date-time type under the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SqlType for DateTimeType {
    fn name(&self) -> &str {
        &self.name
    }

    fn to_database(&self, value: SqlValue) -> Result<SqlValue> {
        match value {
            SqlValue::Null | SqlValue::DateTime(_) => Ok(value),
            SqlValue::Date(d) => Ok(SqlValue::DateTime(d.and_time(NaiveTime::MIN))),
            SqlValue::Text(ref s) => {
                let s = s.trim();
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                    .map(SqlValue::DateTime)
                    .map_err(|e| QueryError::TypeCast {
                        type_name: self.name.clone(),
                        message: e.to_string(),
                    })
            }
            other => Err(cast_error(&self.name, &other)),
        }
    }
}

/// The `json` type; values are encoded to JSON text.
#[derive(Debug, Clone, Default)]
pub struct JsonType;

impl SqlType for JsonType {
    fn name(&self) -> &str {
        "json"
    }

    fn to_database(&self, value: SqlValue) -> Result<SqlValue> {
        Ok(match value {
            SqlValue::Null => SqlValue::Null,
            SqlValue::Json(v) => SqlValue::Text(v.to_string()),
            SqlValue::Text(s) => SqlValue::Text(serde_json::Value::String(s).to_string()),
            SqlValue::Bool(b) => SqlValue::Text(serde_json::Value::Bool(b).to_string()),
            SqlValue::Int(n) => SqlValue::Text(n.to_string()),
            SqlValue::Float(f) => SqlValue::Text(serde_json::json!(f).to_string()),
            other => {
                let text = other.to_text().unwrap_or_default();
                SqlValue::Text(serde_json::Value::String(text).to_string())
            }
        })
    }
}

/// The `binary` type.
#[derive(Debug, Clone, Default)]
pub struct BinaryType;

impl SqlType for BinaryType {
    fn name(&self) -> &str {
        "binary"
    }

    fn to_database(&self, value: SqlValue) -> Result<SqlValue> {
        match value {
            SqlValue::Null | SqlValue::Blob(_) => Ok(value),
            SqlValue::Text(s) => Ok(SqlValue::Blob(s.into_bytes())),
            other => Err(cast_error("binary", &other)),
        }
    }
}

/// Resolves logical type names to [`SqlType`] implementations.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<dyn SqlType>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in types.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for name in ["string", "text", "char", "uuid"] {
            registry.register(StringType::new(name));
        }
        for name in ["integer", "biginteger", "smallinteger", "tinyinteger"] {
            registry.register(IntegerType::new(name));
        }
        for name in ["float", "decimal"] {
            registry.register(FloatType::new(name));
        }
        for name in ["datetime", "timestamp"] {
            registry.register(DateTimeType::new(name));
        }
        registry.register(BooleanType);
        registry.register(DateType);
        registry.register(JsonType);
        registry.register(BinaryType);
        registry
    }

    /// Registers a type under its own name, replacing any previous entry.
    pub fn register(&mut self, ty: impl SqlType + 'static) -> &mut Self {
        self.types.insert(ty.name().to_string(), Arc::new(ty));
        self
    }

    /// Registers a type under an explicit name.
    pub fn register_as(&mut self, name: impl Into<String>, ty: Arc<dyn SqlType>) -> &mut Self {
        self.types.insert(name.into(), ty);
        self
    }

    /// Looks up a type by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn SqlType>> {
        self.types.get(name)
    }

    /// Returns `true` if the type name is known.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_conversion() {
        let ty = IntegerType::new("integer");
        assert_eq!(
            ty.to_database(SqlValue::Text(" 12 ".into())).unwrap(),
            SqlValue::Int(12)
        );
        assert_eq!(ty.to_database(SqlValue::Float(3.9)).unwrap(), SqlValue::Int(3));
        assert_eq!(ty.to_database(SqlValue::Text(String::new())).unwrap(), SqlValue::Null);
        assert!(matches!(
            ty.to_database(SqlValue::Text("abc".into())),
            Err(QueryError::TypeCast { .. })
        ));
    }

    #[test]
    fn test_boolean_conversion() {
        assert_eq!(
            BooleanType.to_database(SqlValue::Text("true".into())).unwrap(),
            SqlValue::Bool(true)
        );
        assert_eq!(BooleanType.to_database(SqlValue::Int(0)).unwrap(), SqlValue::Bool(false));
        assert!(BooleanType.to_database(SqlValue::Text("maybe".into())).is_err());
    }

    #[test]
    fn test_datetime_conversion() {
        let ty = DateTimeType::new("datetime");
        let parsed = ty
            .to_database(SqlValue::Text("2024-03-01 10:20:30".into()))
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 20, 30)
            .unwrap();
        assert_eq!(parsed, SqlValue::DateTime(expected));
    }

    #[test]
    fn test_json_conversion() {
        let value = JsonType
            .to_database(SqlValue::Json(serde_json::json!({"a": 1})))
            .unwrap();
        assert_eq!(value, SqlValue::Text(r#"{"a":1}"#.to_string()));
    }

    #[test]
    fn test_registry_defaults() {
        let registry = TypeRegistry::with_defaults();
        assert!(registry.has("integer"));
        assert!(registry.has("datetime"));
        assert!(registry.has("json"));
        assert!(!registry.has("point"));
        assert_eq!(registry.get("uuid").unwrap().name(), "uuid");
    }
}
