#![allow(dead_code)]

use oxide_query::{Compiler, DialectKind, Query, QueryError, SqlValue, ValueBinder};

pub fn compile(query: &Query) -> (String, ValueBinder) {
    compile_with(query, &Compiler::default())
}

pub fn compile_with(query: &Query, compiler: &Compiler) -> (String, ValueBinder) {
    query
        .sql(compiler)
        .unwrap_or_else(|e| panic!("Failed to compile: {query:?}\nError: {e:?}"))
}

pub fn compile_err(query: &Query, compiler: &Compiler) -> QueryError {
    query
        .sql(compiler)
        .expect_err(&format!("Expected compile error for: {query:?}"))
}

pub fn sql(query: &Query) -> String {
    compile(query).0
}

pub fn dialect(kind: DialectKind) -> Compiler {
    Compiler::for_dialect(kind)
}

pub fn quoting(kind: DialectKind) -> Compiler {
    Compiler::for_dialect(kind).with_identifier_quoting(true)
}

/// Bound values in placeholder order.
pub fn values(binder: &ValueBinder) -> Vec<SqlValue> {
    binder.bindings().values().map(|b| b.value.clone()).collect()
}

/// Bound `(placeholder, type)` pairs in placeholder order.
pub fn types(binder: &ValueBinder) -> Vec<(String, Option<String>)> {
    binder
        .bindings()
        .iter()
        .map(|(k, b)| (k.clone(), b.type_name.clone()))
        .collect()
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}
