//! Tests for CASE expressions, traversal and cloning of expression trees.

mod common;
use common::*;

use oxide_query::expression::{BetweenExpression, CaseExpression, CaseStatementExpression};
use oxide_query::{Compiler, Expression, Query, QueryError, ValueBinder};

fn category_case() -> CaseExpression {
    CaseStatementExpression::with_value(Expression::identifier("products.category"), None)
        .unwrap()
        .when(1, None)
        .unwrap()
        .then("Touring", None)
        .unwrap()
        .when(2, None)
        .unwrap()
        .then("Urban", None)
        .unwrap()
        .else_("Other", None)
        .unwrap()
        .build()
        .unwrap()
}

// ===================================================================
// CASE
// ===================================================================

#[test]
fn case_simple_compiles_with_placeholders() {
    let mut binder = ValueBinder::new();
    let sql = Compiler::default()
        .compile_expression(&category_case().into(), &mut binder)
        .unwrap();
    assert_eq!(
        sql,
        "CASE products.category WHEN :c_0 THEN :c_1 WHEN :c_2 THEN :c_3 ELSE :c_4 END"
    );
    assert_eq!(binder.len(), 5);
}

#[test]
fn case_as_select_field() {
    let query = Query::select([("kind", Expression::from(category_case()))]).from(["products"]);
    assert_eq!(
        sql(&query),
        "SELECT (CASE products.category WHEN :c_0 THEN :c_1 WHEN :c_2 THEN :c_3 \
         ELSE :c_4 END) AS kind FROM products"
    );
}

#[test]
fn case_without_else_renders_null() {
    let case = CaseStatementExpression::new()
        .when_conditions([("views >", 100)])
        .unwrap()
        .then("popular", None)
        .unwrap()
        .build()
        .unwrap();
    let mut binder = ValueBinder::new();
    let sql = Compiler::default()
        .compile_expression(&case.into(), &mut binder)
        .unwrap();
    assert_eq!(sql, "CASE WHEN views > :c_0 THEN :c_1 ELSE NULL END");
}

#[test]
fn case_when_twice_fails() {
    let err = CaseStatementExpression::new()
        .when_conditions([("a", 1)])
        .unwrap()
        .when_conditions([("b", 2)])
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidUsage(_)));
}

#[test]
fn case_then_without_when_fails() {
    let err = CaseStatementExpression::new().then(1, None).unwrap_err();
    assert!(matches!(err, QueryError::InvalidUsage(_)));
}

#[test]
fn case_else_while_pending_fails() {
    let err = CaseStatementExpression::new()
        .when_conditions([("a", 1)])
        .unwrap()
        .else_(0, None)
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidUsage(_)));
}

#[test]
fn case_pending_never_reaches_a_query() {
    let pending = || {
        CaseStatementExpression::new()
            .when_conditions([("a", 1)])
            .unwrap()
    };
    assert!(matches!(pending().try_clone(), Err(QueryError::InvalidUsage(_))));
    assert!(matches!(pending().build(), Err(QueryError::InvalidUsage(_))));
    assert!(matches!(
        Expression::try_from(pending()),
        Err(QueryError::InvalidUsage(_))
    ));
    assert!(matches!(
        Query::select(["id"]).where_with(|exp| exp.add_case(pending())),
        Err(QueryError::InvalidUsage(_))
    ));
}

#[test]
fn case_in_query_clones_complete() {
    let query = Query::select([("kind", Expression::from(category_case()))]).from(["products"]);
    let copy = query.clone();
    assert_eq!(copy, query);
    assert_eq!(sql(&copy), sql(&query));

    let Expression::Case(case) = Expression::from(category_case()).clone() else {
        panic!("expected a CASE node");
    };
    assert!(case.validate().is_ok());
    assert_eq!(case.when_thens().count(), 2);
}

#[test]
fn case_return_type() {
    let same = CaseStatementExpression::new()
        .when_conditions([("a", 1)])
        .unwrap()
        .then(1, Some("integer"))
        .unwrap()
        .else_(0, Some("integer"))
        .unwrap();
    assert_eq!(same.return_type(), "integer");

    let mixed = CaseStatementExpression::new()
        .when_conditions([("a", 1)])
        .unwrap()
        .then(1, Some("integer"))
        .unwrap()
        .when_conditions([("b", 2)])
        .unwrap()
        .then(2.5, Some("float"))
        .unwrap()
        .else_("none", Some("string"))
        .unwrap();
    assert_eq!(mixed.return_type(), "string");
}

// ===================================================================
// Traversal and cloning
// ===================================================================

#[test]
fn between_traversal_counts_expression_bounds() {
    let with_expressions = Expression::from(BetweenExpression::new(
        "created",
        Expression::identifier("starts"),
        Expression::identifier("ends"),
        None,
    ));
    let mut count = 0;
    with_expressions.traverse(&mut |_| count += 1);
    assert_eq!(count, 2);

    let with_scalars = Expression::from(BetweenExpression::new("views", 1, 10, None));
    let mut count = 0;
    with_scalars.traverse(&mut |_| count += 1);
    assert_eq!(count, 0);
}

#[test]
fn case_traversal_visits_value_and_branches() {
    let mut identifiers = 0;
    let mut branches = 0;
    Expression::from(category_case()).traverse(&mut |e| match e {
        Expression::Identifier(_) => identifiers += 1,
        Expression::WhenThen(_) => branches += 1,
        _ => {}
    });
    assert_eq!(identifiers, 1);
    assert_eq!(branches, 2);
}

#[test]
fn cloned_tree_is_independent() {
    let original = Expression::from(category_case());
    let mut copy = original.clone();
    assert_eq!(copy, original);

    copy.traverse_mut(&mut |e| {
        if let Expression::Identifier(id) = e {
            id.set_name("changed");
        }
    });
    assert_ne!(copy, original);

    let mut names = Vec::new();
    original.traverse(&mut |e| {
        if let Expression::Identifier(id) = e {
            names.push(id.name().to_string());
        }
    });
    assert_eq!(names, vec![String::from("products.category")]);
}
