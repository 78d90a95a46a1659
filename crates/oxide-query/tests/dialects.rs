//! Tests for dialect rewrites and identifier quoting.

mod common;
use common::*;

use oxide_query::expression::FunctionExpression;
use oxide_query::{Compiler, CompilerConfig, DialectKind, Expression, Query, QueryError};

// ===================================================================
// Identifier quoting
// ===================================================================

#[test]
fn quoting_is_off_by_default() {
    let query = Query::select(["a.id"]).from([("a", "articles")]);
    let (sql, _) = compile_with(&query, &dialect(DialectKind::Postgres));
    assert_eq!(sql, "SELECT a.id FROM articles a");
}

#[test]
fn quoting_select_from_join_where_order() {
    let query = Query::select(["a.id", "u.name", "COUNT(*)"])
        .from([("a", "articles")])
        .inner_join(("u", "users"), ["u.id = a.user_id"])
        .unwrap()
        .where_clause([("a.published", true)])
        .unwrap()
        .group_by(["u.name"])
        .order_by(["a.created"])
        .unwrap();
    let (sql, _) = compile_with(&query, &quoting(DialectKind::Generic));
    assert_eq!(
        sql,
        "SELECT \"a\".\"id\", \"u\".\"name\", COUNT(*) FROM \"articles\" \"a\" \
         INNER JOIN \"users\" \"u\" ON u.id = a.user_id \
         WHERE \"a\".\"published\" = :c_0 GROUP BY \"u\".\"name\" ORDER BY \"a\".\"created\""
    );
}

#[test]
fn quoting_leaves_order_with_direction_alone() {
    let query = Query::select(["*"])
        .from(["articles"])
        .order_by(["title DESC"])
        .unwrap();
    let (sql, _) = compile_with(&query, &quoting(DialectKind::Generic));
    assert_eq!(sql, "SELECT * FROM \"articles\" ORDER BY title DESC");
}

#[test]
fn quoting_reaches_subqueries_and_identifiers() {
    let authors = Query::select(["id"]).from(["authors"]);
    let query = Query::select(["title"])
        .from(["articles"])
        .where_clause([("author_id IN", authors)])
        .unwrap()
        .where_with(|exp| exp.equal_fields("created", "modified"))
        .unwrap();
    let (sql, _) = compile_with(&query, &quoting(DialectKind::Mysql));
    assert_eq!(
        sql,
        "SELECT `title` FROM `articles` WHERE (`author_id` in (SELECT `id` FROM `authors`) \
         AND `created` = `modified`)"
    );
}

#[test]
fn quoting_select_aliases() {
    let query = Query::select([("heading", "title")]).from(["articles"]);
    let (sql, _) = compile_with(&query, &quoting(DialectKind::Sqlite));
    assert_eq!(sql, "SELECT \"title\" AS \"heading\" FROM \"articles\"");
}

// ===================================================================
// Dialect rewrites
// ===================================================================

#[test]
fn sqlite_emulates_distinct_on() {
    let query = Query::select(["author_id", "title"])
        .distinct_on(["author_id"])
        .from(["articles"]);
    assert_eq!(
        compile_with(&query, &dialect(DialectKind::Sqlite)).0,
        "SELECT author_id, title FROM articles GROUP BY author_id"
    );
    assert_eq!(
        compile_with(&query, &dialect(DialectKind::Postgres)).0,
        "SELECT DISTINCT ON (author_id) author_id, title FROM articles"
    );
}

#[test]
fn postgres_inlines_function_alias_in_having() {
    let total = FunctionExpression::new("SUM", "integer").identifier("amount");
    let query = Query::select([("total", Expression::from(total))])
        .from(["orders"])
        .group_by(["customer_id"])
        .having([("total >", 100)])
        .unwrap();
    let (sql, binder) = compile_with(&query, &dialect(DialectKind::Postgres));
    assert_eq!(
        sql,
        "SELECT (SUM(amount)) AS \"total\" FROM orders GROUP BY customer_id \
         HAVING SUM(amount) > :c_0"
    );
    assert_eq!(binder.len(), 1);
}

#[test]
fn mysql_rejects_except() {
    let query = Query::select(["id"])
        .from(["a"])
        .except(Query::select(["id"]).from(["b"]));
    assert!(matches!(
        compile_err(&query, &dialect(DialectKind::Mysql)),
        QueryError::UnsupportedFeature { .. }
    ));
}

#[test]
fn sqlite_union_with_order() {
    let query = Query::select(["id"])
        .from(["a"])
        .union(Query::select(["id"]).from(["b"]))
        .order_by(["id"])
        .unwrap();
    assert_eq!(
        compile_with(&query, &dialect(DialectKind::Sqlite)).0,
        "SELECT id FROM a ORDER BY id\nUNION SELECT id FROM b"
    );
}

// ===================================================================
// Configuration
// ===================================================================

#[test]
fn compiler_from_json_config() {
    let config =
        CompilerConfig::from_json(r#"{"dialect": "mysql", "quote_identifiers": true}"#).unwrap();
    let compiler = Compiler::from_config(&config);
    assert_eq!(compiler.dialect().name(), "mysql");
    assert!(compiler.quotes_identifiers());

    let query = Query::select(["id"]).from(["articles"]);
    assert_eq!(
        compile_with(&query, &compiler).0,
        "SELECT `id` FROM `articles`"
    );
}
