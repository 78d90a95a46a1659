//! SQL dialect support.
//!
//! A dialect supplies identifier quote characters, the SELECT clause order
//! and the listeners that rewrite queries for one database engine. The
//! built-in dialects are selected through [`DialectKind`].

mod generic;
mod listeners;
mod mysql;
mod postgres;
mod quoting;
mod sqlite;

pub use generic::GenericDialect;
pub use listeners::{
    DeleteAliasStripper, DistinctOnToGroupBy, HavingAliasRewriter, InsertReturning,
    UnionWrapper, UpdateAliasStripper,
};
pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;
pub use quoting::{quote_identifier, IdentifierQuoter};
pub use sqlite::SqliteDialect;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::compiler::{Events, SELECT_ORDER};
use crate::error::QueryError;
use crate::query::{ClauseName, SetOperator};

/// Dialect-specific behavior of the compiler.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Opening identifier quote.
    fn start_quote(&self) -> &'static str {
        "\""
    }

    /// Closing identifier quote.
    fn end_quote(&self) -> &'static str {
        "\""
    }

    /// Quotes an identifier, leaving function names, `*` and already
    /// quoted text alone.
    fn quote_identifier(&self, identifier: &str) -> String {
        quote_identifier(identifier, self.start_quote(), self.end_quote())
    }

    /// Clause order of SELECT statements.
    fn select_order(&self) -> &'static [ClauseName] {
        &SELECT_ORDER
    }

    /// Returns whether set operation branches are wrapped in parentheses.
    fn ordered_union(&self) -> bool {
        true
    }

    /// Returns whether SELECT aliases are always quoted.
    fn quotes_select_aliases(&self) -> bool {
        false
    }

    /// Returns whether the engine understands `operator`.
    fn supports_set_operator(&self, _operator: SetOperator) -> bool {
        true
    }

    /// Registers the dialect's query rewrites.
    fn register_listeners(&self, events: &mut Events) {
        listeners::register_common(events, self.ordered_union());
    }
}

/// The built-in dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Generic,
    Mysql,
    Postgres,
    Sqlite,
}

impl DialectKind {
    /// Every built-in dialect.
    pub const ALL: [Self; 4] = [Self::Generic, Self::Mysql, Self::Postgres, Self::Sqlite];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// An instance of the dialect.
    #[must_use]
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            Self::Generic => Arc::new(GenericDialect::new()),
            Self::Mysql => Arc::new(MysqlDialect::new()),
            Self::Postgres => Arc::new(PostgresDialect::new()),
            Self::Sqlite => Arc::new(SqliteDialect::new()),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "postgresql" | "pgsql" => return Ok(Self::Postgres),
            "sqlite3" => return Ok(Self::Sqlite),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| QueryError::InvalidArgument(format!("unknown dialect `{s}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_kind_parsing() {
        assert_eq!("mysql".parse::<DialectKind>().unwrap(), DialectKind::Mysql);
        assert_eq!("PostgreSQL".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("sqlite3".parse::<DialectKind>().unwrap(), DialectKind::Sqlite);
        assert!("oracle".parse::<DialectKind>().is_err());
    }

    #[test]
    fn test_dialect_kind_builds_matching_dialect() {
        for kind in DialectKind::ALL {
            assert_eq!(kind.dialect().name(), kind.as_str());
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }
}
