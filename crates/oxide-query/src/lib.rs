//! # oxide-query
//!
//! A composable SQL query builder backed by an expression tree and a
//! dialect-aware compiler.
//!
//! This crate provides:
//! - A [`Query`] aggregate for SELECT, INSERT, UPDATE and DELETE statements
//! - An [`Expression`] tree: comparisons, condition groups, CASE, functions,
//!   window definitions, CTEs and embedded queries
//! - A [`Compiler`] made of small per-node units, with listeners that adapt
//!   queries to MySQL, PostgreSQL and SQLite
//! - Logical column types that cast values before they are bound
//!
//! ## Building and compiling
//!
//! ```rust
//! use oxide_query::{Compiler, Query};
//!
//! let query = Query::select(["*"])
//!     .from(["articles"])
//!     .where_clause([("author_id", 1)])
//!     .unwrap();
//! let (sql, binder) = query.sql(&Compiler::default()).unwrap();
//!
//! assert_eq!(sql, "SELECT * FROM articles WHERE author_id = :c_0");
//! assert_eq!(binder.len(), 1);
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values never reach the SQL text: every scalar is bound under a generated
//! placeholder and returned in the [`ValueBinder`].
//!
//! ```rust
//! use oxide_query::{Compiler, Query, SqlValue};
//!
//! let user_input = "'; DROP TABLE users; --";
//! let query = Query::select(["id"])
//!     .from(["users"])
//!     .where_clause([("name", user_input)])
//!     .unwrap();
//! let (sql, binder) = query.sql(&Compiler::default()).unwrap();
//!
//! assert_eq!(sql, "SELECT id FROM users WHERE name = :c_0");
//! assert_eq!(
//!     binder.get(":c_0").map(|b| &b.value),
//!     Some(&SqlValue::Text(user_input.to_string()))
//! );
//! ```

pub mod binder;
pub mod compiler;
pub mod config;
pub mod dialect;
pub mod error;
pub mod expression;
pub mod query;
pub mod types;
pub mod value;

pub use binder::{BoundValue, ValueBinder};
pub use compiler::{Compiler, Events, Unit, UnitKey};
pub use config::CompilerConfig;
pub use dialect::{Dialect, DialectKind};
pub use error::{QueryError, Result};
pub use expression::{
    CaseExpression, CaseStatementExpression, ComparisonExpression, Conditions, Expression,
    ExpressionKind, QueryExpression,
};
pub use query::{ClauseName, Query, QueryKind};
pub use types::{CasterHandle, TypeMap, TypeRegistry};
pub use value::{Field, Operand, SqlValue, ToSqlValue};
