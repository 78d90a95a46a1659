//! Compiler configuration.
//!
//! ```ignore
//! let config = CompilerConfig::from_json(r#"{"dialect": "postgres", "quote_identifiers": true}"#)?;
//! let compiler = Compiler::from_config(&config);
//! ```

use serde::{Deserialize, Serialize};

use crate::dialect::DialectKind;
use crate::error::{QueryError, Result};

/// Settings used to assemble a [`Compiler`](crate::Compiler).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Target dialect.
    pub dialect: DialectKind,
    /// Quote every identifier before compiling.
    pub quote_identifiers: bool,
}

impl CompilerConfig {
    #[must_use]
    pub const fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            quote_identifiers: false,
        }
    }

    #[must_use]
    pub const fn quote_identifiers(mut self, enabled: bool) -> Self {
        self.quote_identifiers = enabled;
        self
    }

    /// Parses a JSON configuration object. Missing keys take their default.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for malformed JSON or an
    /// unknown dialect.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| QueryError::InvalidArgument(format!("invalid compiler config: {e}")))
    }

    /// Serializes the configuration as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| QueryError::InvalidArgument(format!("invalid compiler config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::from_json("{}").unwrap();
        assert_eq!(config.dialect, DialectKind::Generic);
        assert!(!config.quote_identifiers);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = CompilerConfig::new(DialectKind::Mysql).quote_identifiers(true);
        let json = config.to_json().unwrap();
        assert_eq!(json, r#"{"dialect":"mysql","quote_identifiers":true}"#);
        assert_eq!(CompilerConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        let err = CompilerConfig::from_json(r#"{"dialect": "oracle"}"#).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }
}
