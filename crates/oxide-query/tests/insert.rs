//! Tests for INSERT compilation.

mod common;
use common::*;

use oxide_query::{DialectKind, Operand, Query, QueryError, SqlValue};

#[test]
fn insert_single_row() {
    let query = Query::insert(["title"])
        .unwrap()
        .into_table("articles")
        .values([("title", "A new article")])
        .unwrap();
    let (sql, binder) = compile(&query);
    assert_eq!(sql, "INSERT INTO articles (title) VALUES (:c_0)");
    assert_eq!(values(&binder), vec![text("A new article")]);
}

#[test]
fn insert_several_rows() {
    let query = Query::insert(["title", "views"])
        .unwrap()
        .into_table("articles")
        .values([("title", Operand::from("a")), ("views", Operand::from(1))])
        .unwrap()
        .values([("title", Operand::from("b")), ("views", Operand::from(2))])
        .unwrap();
    assert_eq!(
        sql(&query),
        "INSERT INTO articles (title, views) VALUES (:c_0, :c_1), (:c_2, :c_3)"
    );
}

#[test]
fn insert_missing_column_binds_null() {
    let query = Query::insert(["title", "body"])
        .unwrap()
        .into_table("articles")
        .values([("title", "only title")])
        .unwrap();
    let (sql, binder) = compile(&query);
    assert_eq!(sql, "INSERT INTO articles (title, body) VALUES (:c_0, :c_1)");
    assert_eq!(values(&binder), vec![text("only title"), SqlValue::Null]);
}

#[test]
fn insert_values_are_typed() {
    let query = Query::insert(["views"])
        .unwrap()
        .into_table("articles")
        .default_types([("views", "integer")])
        .values([("views", "12")])
        .unwrap();
    let (_, binder) = compile(&query);
    assert_eq!(values(&binder), vec![SqlValue::Int(12)]);
    assert_eq!(
        types(&binder),
        vec![(String::from(":c_0"), Some(String::from("integer")))]
    );
}

#[test]
fn insert_from_select() {
    let query = Query::insert(["title"])
        .unwrap()
        .into_table("archive")
        .values_from(Query::select(["title"]).from(["articles"]))
        .unwrap();
    assert_eq!(
        sql(&query),
        "INSERT INTO archive (title) SELECT title FROM articles"
    );
}

#[test]
fn insert_without_table_fails() {
    let query = Query::insert(["title"])
        .unwrap()
        .values([("title", "x")])
        .unwrap();
    assert_eq!(
        compile_err(&query, &dialect(DialectKind::Generic)),
        QueryError::InsertWithoutTable
    );
}

#[test]
fn insert_quoted_columns_still_find_values() {
    let query = Query::insert(["title"])
        .unwrap()
        .into_table("articles")
        .values([("title", "x")])
        .unwrap();
    let (sql, binder) = compile_with(&query, &quoting(DialectKind::Mysql));
    assert_eq!(sql, "INSERT INTO `articles` (`title`) VALUES (:c_0)");
    assert_eq!(values(&binder), vec![text("x")]);
}

#[test]
fn insert_with_modifier_and_epilog() {
    let query = Query::insert(["title"])
        .unwrap()
        .into_table("articles")
        .modifier(["IGNORE"])
        .values([("title", "x")])
        .unwrap()
        .epilog("ON DUPLICATE KEY UPDATE title = VALUES(title)");
    assert_eq!(
        sql(&query),
        "INSERT IGNORE INTO articles (title) VALUES (:c_0) \
         ON DUPLICATE KEY UPDATE title = VALUES(title)"
    );
}
