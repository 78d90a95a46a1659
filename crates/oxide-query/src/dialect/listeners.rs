//! Query rewrites shared by the built-in dialects.

use std::sync::Arc;

use regex::{NoExpand, RegexBuilder};
use tracing::debug;

use super::IdentifierQuoter;
use crate::compiler::{ClauseContext, ClauseListener, Compiler, Events, QueryListener};
use crate::error::{QueryError, Result};
use crate::expression::Expression;
use crate::query::{Aliased, Clause, ClauseName, Distinct, Query, QueryKind};
use crate::value::Field;

/// Registers the rewrites every dialect runs, identifier quoting last.
pub(super) fn register_common(events: &mut Events, ordered_union: bool) {
    let quoter: Arc<dyn QueryListener> = Arc::new(IdentifierQuoter::new());
    events
        .on_query(QueryKind::Update, Arc::new(UpdateAliasStripper))
        .on_query(QueryKind::Delete, Arc::new(DeleteAliasStripper));
    for kind in QueryKind::ALL {
        events.on_query(kind, Arc::clone(&quoter));
    }
    if ordered_union {
        events.on_query(QueryKind::Select, Arc::new(UnionWrapper));
    }
}

/// Drops the `table.` prefix of columns compared in WHERE.
///
/// Joined tables could be referenced through those prefixes, so a query
/// with joins is rejected.
fn strip_condition_aliases(query: &mut Query) -> Result<()> {
    let parts = query.parts_mut();
    if !parts.join.is_empty() {
        return Err(QueryError::UnsafeAliasRemoval);
    }
    let Some(conditions) = parts.conditions.as_mut() else {
        return Ok(());
    };
    let mut strip = |expr: &mut Expression| match expr {
        Expression::Comparison(c) => {
            if let Field::Name(name) = c.field_mut() {
                if let Some((_, column)) = name.split_once('.') {
                    *name = column.to_string();
                }
            }
        }
        Expression::Identifier(i) => {
            if let Some((_, column)) = i.name().split_once('.') {
                let column = column.to_string();
                i.set_name(column);
            }
        }
        _ => {}
    };
    for expr in conditions.conditions_mut() {
        strip(expr);
        expr.traverse_mut(&mut strip);
    }
    Ok(())
}

/// Removes table aliases from UPDATE conditions.
#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateAliasStripper;

impl QueryListener for UpdateAliasStripper {
    fn name(&self) -> &'static str {
        "update-alias-stripper"
    }

    fn before_compile(&self, query: &mut Query, _compiler: &Compiler) -> Result<()> {
        strip_condition_aliases(query)
    }
}

/// Removes table aliases from `DELETE FROM` and its conditions.
///
/// Queries whose FROM has no alias are left as they are.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeleteAliasStripper;

impl QueryListener for DeleteAliasStripper {
    fn name(&self) -> &'static str {
        "delete-alias-stripper"
    }

    fn before_compile(&self, query: &mut Query, _compiler: &Compiler) -> Result<()> {
        let from = &mut query.parts_mut().from;
        if from.iter().all(|table| table.alias.is_none()) {
            return Ok(());
        }
        for table in from.iter_mut() {
            table.alias = None;
        }
        debug!("removed aliases from DELETE");
        strip_condition_aliases(query)
    }
}

/// Opens the parenthesis closed by the first set operation branch.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnionWrapper;

impl QueryListener for UnionWrapper {
    fn name(&self) -> &'static str {
        "union-wrapper"
    }

    fn after_compile(&self, query: &Query, sql: String) -> Result<String> {
        match query.part(ClauseName::Union) {
            Clause::Union(operations) if !operations.is_empty() => Ok(format!("({sql}")),
            _ => Ok(sql),
        }
    }
}

/// Emulates `DISTINCT ON (fields)` with `GROUP BY fields`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DistinctOnToGroupBy;

impl QueryListener for DistinctOnToGroupBy {
    fn name(&self) -> &'static str {
        "distinct-on-to-group-by"
    }

    fn before_compile(&self, query: &mut Query, _compiler: &Compiler) -> Result<()> {
        let parts = query.parts_mut();
        if let Distinct::On(fields) = &mut parts.distinct {
            parts.group = std::mem::take(fields);
            parts.distinct = Distinct::None;
        }
        Ok(())
    }
}

/// Appends `RETURNING *` to INSERTs that have no epilog.
#[derive(Debug, Default, Clone, Copy)]
pub struct InsertReturning;

impl QueryListener for InsertReturning {
    fn name(&self) -> &'static str {
        "insert-returning"
    }

    fn before_compile(&self, query: &mut Query, _compiler: &Compiler) -> Result<()> {
        let epilog = &mut query.parts_mut().epilog;
        if epilog.is_none() {
            *epilog = Some(Field::Name(String::from("RETURNING *")));
        }
        Ok(())
    }
}

/// Replaces SELECT aliases of function calls used in HAVING with the
/// function SQL, for engines that cannot reference select aliases there.
///
/// The match is a case-insensitive whole-word search; quote characters
/// are removed from a rewritten clause.
#[derive(Debug, Default, Clone, Copy)]
pub struct HavingAliasRewriter;

impl ClauseListener for HavingAliasRewriter {
    fn name(&self) -> &'static str {
        "having-alias-rewriter"
    }

    fn after_clause(&self, ctx: &mut ClauseContext<'_>, mut sql: String) -> Result<String> {
        let query = ctx.query;
        let Clause::Select(fields) = query.part(ClauseName::Select) else {
            return Ok(sql);
        };
        for Aliased { alias, value } in fields {
            let (Some(alias), Some(expr)) = (alias, value.as_expression()) else {
                continue;
            };
            if !matches!(expr, Expression::Function(_) | Expression::Aggregate(_)) {
                continue;
            }
            let word = alias.trim_matches('"');
            let Ok(pattern) = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(word)))
                .case_insensitive(true)
                .build()
            else {
                continue;
            };
            if !pattern.is_match(&sql) {
                continue;
            }
            let function = ctx.compiler.compile_expression(expr, ctx.binder)?;
            sql = pattern
                .replace_all(&sql.replace('"', ""), NoExpand(&function))
                .into_owned();
            debug!(alias = word, "substituted select alias in HAVING");
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(query: &Query) -> Result<String> {
        query.sql(&Compiler::default()).map(|(sql, _)| sql)
    }

    #[test]
    fn test_update_conditions_lose_table_prefix() {
        let query = Query::update("articles")
            .set("title", "x", None)
            .unwrap()
            .where_clause([("articles.id", 1)])
            .unwrap();
        assert_eq!(
            compile(&query).unwrap(),
            "UPDATE articles SET title = :c_0 WHERE id = :c_1"
        );
    }

    #[test]
    fn test_update_with_join_is_rejected() {
        let query = Query::update("articles")
            .set("title", "x", None)
            .unwrap()
            .inner_join(("a", "authors"), ["a.id = articles.author_id"])
            .unwrap();
        assert!(matches!(compile(&query), Err(QueryError::UnsafeAliasRemoval)));
    }

    #[test]
    fn test_delete_aliases_are_removed() {
        let query = Query::delete(None)
            .from([("a", "articles")])
            .where_clause([("a.id", 1)])
            .unwrap();
        assert_eq!(compile(&query).unwrap(), "DELETE FROM articles WHERE id = :c_0");
    }

    #[test]
    fn test_delete_without_alias_keeps_prefix() {
        let query = Query::delete(Some("articles"))
            .where_clause([("articles.id", 1)])
            .unwrap();
        assert_eq!(
            compile(&query).unwrap(),
            "DELETE FROM articles WHERE articles.id = :c_0"
        );
    }

    #[test]
    fn test_insert_returning_keeps_existing_epilog() {
        let mut query = Query::insert(["title"])
            .unwrap()
            .into_table("articles")
            .epilog("RETURNING id");
        InsertReturning
            .before_compile(&mut query, &Compiler::default())
            .unwrap();
        assert!(matches!(
            query.part(ClauseName::Epilog),
            Clause::Epilog(Some(Field::Name(text))) if text == "RETURNING id"
        ));
    }
}
