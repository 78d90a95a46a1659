//! Query compilation.
//!
//! The [`Compiler`] turns a [`Query`] into SQL text plus bindings. It is a
//! registry of small compiler units keyed by [`UnitKey`]: one per statement
//! kind, one per clause and one per expression node kind. Compiling a query
//! works on a private copy:
//!
//! 1. query listeners rewrite the copy (identifier quoting, dialect fixes);
//! 2. the statement unit walks its clause order, skipping empty clauses;
//! 3. each clause may be replaced or post-processed by clause listeners;
//! 4. query listeners rewrite the final SQL.
//!
//! Embedded queries go through the same path and share the caller's
//! [`ValueBinder`], so placeholders stay unique across the statement.
//!
//! ```ignore
//! let compiler = Compiler::for_dialect(DialectKind::Postgres);
//! let (sql, binder) = Query::select(["id"]).from(["articles"]).sql(&compiler)?;
//! ```

mod clauses;
mod events;
mod expressions;
mod statements;

pub use events::{ClauseContext, ClauseListener, Events, QueryListener};
pub use statements::{
    StatementCompiler, DELETE_ORDER, INSERT_ORDER, SELECT_ORDER, UPDATE_ORDER,
};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::binder::ValueBinder;
use crate::config::CompilerConfig;
use crate::dialect::{Dialect, DialectKind};
use crate::error::{QueryError, Result};
use crate::expression::{Expression, ExpressionKind};
use crate::query::{Clause, ClauseName, Query, QueryKind};
use crate::value::{Operand, SqlValue};

/// Compiles one kind of expression node.
pub trait ExpressionCompiler: Send + Sync {
    /// Unit name, used in errors.
    fn name(&self) -> &'static str;

    /// Compiles `expr`, binding its values into `binder`.
    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String>;
}

/// Compiles one clause of a query, template included.
pub trait ClauseCompiler: Send + Sync {
    /// Unit name, used in errors.
    fn name(&self) -> &'static str;

    /// Compiles the clause this unit is registered for.
    fn compile(&self, query: &Query, compiler: &Compiler, binder: &mut ValueBinder)
        -> Result<String>;
}

/// Compiles a whole statement.
pub trait QueryCompiler: Send + Sync {
    /// Unit name, used in errors.
    fn name(&self) -> &'static str;

    /// Returns `true` when the unit can compile queries of `kind`.
    fn supports(&self, kind: QueryKind) -> bool;

    /// Compiles `query`.
    fn compile(&self, query: &Query, compiler: &Compiler, binder: &mut ValueBinder)
        -> Result<String>;
}

/// Registry key of a compiler unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKey {
    Expression(ExpressionKind),
    Clause(ClauseName),
    Query(QueryKind),
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(kind) => write!(f, "expression:{kind}"),
            Self::Clause(name) => write!(f, "clause:{name}"),
            Self::Query(kind) => write!(f, "query:{kind}"),
        }
    }
}

impl From<ExpressionKind> for UnitKey {
    fn from(kind: ExpressionKind) -> Self {
        Self::Expression(kind)
    }
}

impl From<ClauseName> for UnitKey {
    fn from(name: ClauseName) -> Self {
        Self::Clause(name)
    }
}

impl From<QueryKind> for UnitKey {
    fn from(kind: QueryKind) -> Self {
        Self::Query(kind)
    }
}

/// A registered compiler unit.
#[derive(Clone)]
pub enum Unit {
    Expression(Arc<dyn ExpressionCompiler>),
    Clause(Arc<dyn ClauseCompiler>),
    Query(Arc<dyn QueryCompiler>),
}

impl Unit {
    /// The unit name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Expression(u) => u.name(),
            Self::Clause(u) => u.name(),
            Self::Query(u) => u.name(),
        }
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(u) => write!(f, "Expression({})", u.name()),
            Self::Clause(u) => write!(f, "Clause({})", u.name()),
            Self::Query(u) => write!(f, "Query({})", u.name()),
        }
    }
}

/// Builds SQL for one dialect.
#[derive(Clone)]
pub struct Compiler {
    dialect: Arc<dyn Dialect>,
    quote_identifiers: bool,
    units: HashMap<UnitKey, Unit>,
    events: Events,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("dialect", &self.dialect.name())
            .field("quote_identifiers", &self.quote_identifiers)
            .field("units", &self.units.len())
            .field("events", &self.events)
            .finish()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::for_dialect(DialectKind::Generic)
    }
}

impl Compiler {
    /// A compiler for `dialect` with every default unit and the dialect's
    /// listeners registered. Identifier quoting starts disabled.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        let mut compiler = Self {
            dialect: Arc::clone(&dialect),
            quote_identifiers: false,
            units: HashMap::new(),
            events: Events::default(),
        };
        expressions::register(&mut compiler);
        clauses::register(&mut compiler);
        statements::register(&mut compiler);
        dialect.register_listeners(&mut compiler.events);
        compiler
    }

    /// A compiler for one of the built-in dialects.
    #[must_use]
    pub fn for_dialect(kind: DialectKind) -> Self {
        Self::new(kind.dialect())
    }

    /// A compiler built from configuration.
    #[must_use]
    pub fn from_config(config: &CompilerConfig) -> Self {
        Self::for_dialect(config.dialect).with_identifier_quoting(config.quote_identifiers)
    }

    /// Enables or disables automatic identifier quoting.
    #[must_use]
    pub fn with_identifier_quoting(mut self, enabled: bool) -> Self {
        self.quote_identifiers = enabled;
        self
    }

    /// The active dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Returns `true` when identifiers are quoted automatically.
    #[must_use]
    pub const fn quotes_identifiers(&self) -> bool {
        self.quote_identifiers
    }

    /// Quotes `identifier` with the dialect's quote characters.
    #[must_use]
    pub fn quote_identifier(&self, identifier: &str) -> String {
        self.dialect.quote_identifier(identifier)
    }

    /// The registered listeners.
    #[must_use]
    pub const fn events(&self) -> &Events {
        &self.events
    }

    /// Mutable access to the listeners.
    pub fn events_mut(&mut self) -> &mut Events {
        &mut self.events
    }

    /// Returns `true` when a unit is registered under `key`.
    #[must_use]
    pub fn has(&self, key: impl Into<UnitKey>) -> bool {
        self.units.contains_key(&key.into())
    }

    /// The unit registered under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoCompilerForExpression`] for unknown keys.
    pub fn get(&self, key: impl Into<UnitKey>) -> Result<&Unit> {
        let key = key.into();
        self.units
            .get(&key)
            .ok_or_else(|| QueryError::NoCompilerForExpression(key.to_string()))
    }

    /// Registers (or replaces) the unit for `key`.
    pub fn add(&mut self, key: impl Into<UnitKey>, unit: Unit) -> &mut Self {
        self.units.insert(key.into(), unit);
        self
    }

    /// Compiles a statement into `binder`.
    ///
    /// Bindings the query carries itself are merged into `binder` when
    /// their placeholder appears in the produced SQL.
    pub fn compile(&self, query: &Query, binder: &mut ValueBinder) -> Result<String> {
        let kind = query.kind();
        let mut working = query.clone();
        for listener in self.events.query_listeners(kind) {
            trace!(listener = listener.name(), query = %kind, "running before-compile listener");
            listener.before_compile(&mut working, self)?;
        }

        let unit = match self.get(kind)? {
            Unit::Query(unit) if unit.supports(kind) => unit,
            other => {
                return Err(QueryError::UnsupportedExpressionType {
                    compiler: other.name().to_string(),
                    kind: kind.to_string(),
                })
            }
        };
        let mut sql = unit.compile(&working, self, binder)?;

        for listener in self.events.query_listeners(kind) {
            sql = listener.after_compile(&working, sql)?;
        }
        binder.merge_from(working.value_binder(), &sql);
        debug!(dialect = self.dialect.name(), query = %kind, sql = %sql, "compiled query");
        Ok(sql)
    }

    /// Compiles one expression node.
    ///
    /// Embedded queries compile as full statements, without parentheses.
    pub fn compile_expression(&self, expr: &Expression, binder: &mut ValueBinder) -> Result<String> {
        if let Expression::Query(query) = expr {
            return self.compile(query, binder);
        }
        match self.get(expr.kind())? {
            Unit::Expression(unit) => unit.compile(expr, self, binder),
            other => Err(QueryError::UnsupportedExpressionType {
                compiler: other.name().to_string(),
                kind: expr.kind().to_string(),
            }),
        }
    }

    /// Compiles an expression, wrapping embedded queries in parentheses.
    pub fn compile_nested(&self, expr: &Expression, binder: &mut ValueBinder) -> Result<String> {
        let sql = self.compile_expression(expr, binder)?;
        Ok(if expr.is_query() { format!("({sql})") } else { sql })
    }

    /// Compiles one clause of `query`, running clause listeners around it.
    ///
    /// A unit registered for the clause name wins; clauses holding a single
    /// expression fall back to that expression's unit.
    pub(crate) fn compile_clause(
        &self,
        name: ClauseName,
        query: &Query,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let listeners = self.events.clause_listeners(query.kind(), name);
        let mut ctx = ClauseContext {
            clause: name,
            query,
            compiler: self,
            binder,
        };
        let mut replaced = None;
        for listener in listeners {
            if let Some(sql) = listener.before_clause(&mut ctx)? {
                trace!(listener = listener.name(), clause = %name, "clause replaced by listener");
                replaced = Some(sql);
                break;
            }
        }
        let mut sql = match replaced {
            Some(sql) => sql,
            None => self.compile_clause_content(name, query, ctx.binder)?,
        };
        for listener in listeners {
            sql = listener.after_clause(&mut ctx, sql)?;
        }
        Ok(sql)
    }

    fn compile_clause_content(
        &self,
        name: ClauseName,
        query: &Query,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        if let Some(Unit::Clause(unit)) = self.units.get(&UnitKey::Clause(name)) {
            return unit.compile(query, self, binder);
        }
        let content = match query.part(name) {
            Clause::Where(Some(q)) | Clause::Having(Some(q)) | Clause::Set(Some(q)) => {
                Expression::Conditions(q.clone())
            }
            Clause::Order(Some(order)) => Expression::OrderBy(order.clone()),
            Clause::Values(Some(values)) => Expression::Values(values.clone()),
            _ => return Err(QueryError::NoCompilerForExpression(UnitKey::Clause(name).to_string())),
        };
        self.compile_expression(&content, binder)
    }

    /// Compiles an operand: values are bound under a fresh `:c_N`
    /// placeholder, expressions are compiled in place.
    pub(crate) fn compile_operand(
        &self,
        operand: &Operand,
        type_name: Option<&str>,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        match operand {
            Operand::Value(value) => Ok(bind_value(binder, "c", value, type_name)),
            Operand::Expr(expr) => self.compile_nested(expr, binder),
            Operand::List(_) => Err(QueryError::ArrayValueForScalarType {
                type_name: type_name.unwrap_or("none").to_string(),
            }),
        }
    }
}

/// Binds `value` under a fresh placeholder generated from `token`.
pub(crate) fn bind_value(
    binder: &mut ValueBinder,
    token: &str,
    value: &SqlValue,
    type_name: Option<&str>,
) -> String {
    let placeholder = binder.placeholder(token);
    binder.bind(&placeholder, value.clone(), type_name);
    placeholder
}

/// The error a unit returns when handed a node it does not compile.
pub(crate) fn unsupported(unit: &str, expr: &Expression) -> QueryError {
    QueryError::UnsupportedExpressionType {
        compiler: unit.to_string(),
        kind: expr.kind().to_string(),
    }
}
