//! Clause units: the SQL template of every query clause.

use std::sync::Arc;

use super::{bind_value, ClauseCompiler, Compiler, Unit};
use crate::binder::ValueBinder;
use crate::error::{QueryError, Result};
use crate::expression::Expression;
use crate::query::{Aliased, Clause, ClauseName, Distinct, Query};
use crate::value::{Field, Operand, SqlValue};

/// Column names stay as written; expressions are compiled and wrapped.
fn stringify(field: &Field, compiler: &Compiler, binder: &mut ValueBinder) -> Result<String> {
    match field {
        Field::Name(name) => Ok(name.clone()),
        Field::Expr(expr) => Ok(format!("({})", compiler.compile_expression(expr, binder)?)),
    }
}

fn stringify_all(fields: &[Field], compiler: &Compiler, binder: &mut ValueBinder) -> Result<Vec<String>> {
    fields
        .iter()
        .map(|field| stringify(field, compiler, binder))
        .collect()
}

fn modifiers(query: &Query) -> String {
    match query.part(ClauseName::Modifier) {
        Clause::Modifier(modifiers) if !modifiers.is_empty() => format!(" {}", modifiers.join(" ")),
        _ => String::new(),
    }
}

/// Defines a unit struct implementing [`ClauseCompiler`] for one clause.
macro_rules! clause_unit {
    ($unit:ident, $name:literal, |$query:ident, $compiler:ident, $binder:ident| $body:block) => {
        struct $unit;

        impl ClauseCompiler for $unit {
            fn name(&self) -> &'static str {
                $name
            }

            fn compile(
                &self,
                $query: &Query,
                $compiler: &Compiler,
                $binder: &mut ValueBinder,
            ) -> Result<String> {
                $body
            }
        }
    };
}

clause_unit!(CommentClause, "comment", |query, _compiler, _binder| {
    match query.part(ClauseName::Comment) {
        Clause::Comment(Some(comment)) => Ok(format!("/* {comment} */ ")),
        _ => Ok(String::new()),
    }
});

clause_unit!(WithClause, "with", |query, compiler, binder| {
    let Clause::With(ctes) = query.part(ClauseName::With) else {
        return Ok(String::new());
    };
    let recursive = ctes.iter().any(|cte| cte.is_recursive());
    let mut expressions = Vec::with_capacity(ctes.len());
    for cte in ctes {
        expressions.push(compiler.compile_expression(&Expression::CommonTable(cte.clone()), binder)?);
    }
    Ok(format!(
        "WITH {}{} ",
        if recursive { "RECURSIVE " } else { "" },
        expressions.join(", ")
    ))
});

clause_unit!(SelectClause, "select", |query, compiler, binder| {
    let Clause::Select(fields) = query.part(ClauseName::Select) else {
        return Ok(String::new());
    };
    let mut sql = String::from("SELECT");
    sql.push_str(&modifiers(query));
    sql.push(' ');
    match query.part(ClauseName::Distinct) {
        Clause::Distinct(Distinct::All) => sql.push_str("DISTINCT "),
        Clause::Distinct(Distinct::On(on)) => {
            sql.push_str("DISTINCT ON (");
            sql.push_str(&stringify_all(on, compiler, binder)?.join(", "));
            sql.push_str(") ");
        }
        _ => {}
    }
    let quote_aliases = compiler.quotes_identifiers() || compiler.dialect().quotes_select_aliases();
    let mut parts = Vec::with_capacity(fields.len());
    for Aliased { alias, value } in fields {
        let mut part = stringify(value, compiler, binder)?;
        if let Some(alias) = alias {
            part.push_str(" AS ");
            if quote_aliases {
                part.push_str(&compiler.quote_identifier(alias));
            } else {
                part.push_str(alias);
            }
        }
        parts.push(part);
    }
    sql.push_str(&parts.join(", "));
    Ok(sql)
});

clause_unit!(FromClause, "from", |query, compiler, binder| {
    let Clause::From(tables) = query.part(ClauseName::From) else {
        return Ok(String::new());
    };
    let mut parts = Vec::with_capacity(tables.len());
    for Aliased { alias, value } in tables {
        let mut part = stringify(value, compiler, binder)?;
        if let Some(alias) = alias {
            part.push(' ');
            part.push_str(alias);
        }
        parts.push(part);
    }
    Ok(format!(" FROM {}", parts.join(", ")))
});

clause_unit!(JoinClause, "join", |query, compiler, binder| {
    let Clause::Join(joins) = query.part(ClauseName::Join) else {
        return Ok(String::new());
    };
    let mut sql = String::new();
    for join in joins {
        sql.push(' ');
        sql.push_str(join.join_type.as_str());
        sql.push_str(" JOIN ");
        sql.push_str(&stringify(&join.table.value, compiler, binder)?);
        if let Some(alias) = &join.table.alias {
            sql.push(' ');
            sql.push_str(alias);
        }
        let condition = compiler
            .compile_expression(&Expression::Conditions(join.conditions.clone()), binder)?;
        if condition.is_empty() {
            sql.push_str(" ON 1 = 1");
        } else {
            sql.push_str(" ON ");
            sql.push_str(&condition);
        }
    }
    Ok(sql)
});

clause_unit!(WhereClause, "where", |query, compiler, binder| {
    match query.part(ClauseName::Where) {
        Clause::Where(Some(tree)) => Ok(format!(
            " WHERE {}",
            compiler.compile_expression(&Expression::Conditions(tree.clone()), binder)?
        )),
        _ => Ok(String::new()),
    }
});

clause_unit!(GroupClause, "group", |query, compiler, binder| {
    let Clause::Group(fields) = query.part(ClauseName::Group) else {
        return Ok(String::new());
    };
    Ok(format!(
        " GROUP BY {}",
        stringify_all(fields, compiler, binder)?.join(", ")
    ))
});

clause_unit!(HavingClause, "having", |query, compiler, binder| {
    match query.part(ClauseName::Having) {
        Clause::Having(Some(tree)) => Ok(format!(
            " HAVING {}",
            compiler.compile_expression(&Expression::Conditions(tree.clone()), binder)?
        )),
        _ => Ok(String::new()),
    }
});

clause_unit!(WindowClause, "window", |query, compiler, binder| {
    let Clause::Window(windows) = query.part(ClauseName::Window) else {
        return Ok(String::new());
    };
    let mut parts = Vec::with_capacity(windows.len());
    for named in windows {
        let name = compiler.compile_expression(&named.name, binder)?;
        let window =
            compiler.compile_expression(&Expression::Window(named.window.clone()), binder)?;
        parts.push(format!("{name} AS ({window})"));
    }
    Ok(format!(" WINDOW {}", parts.join(", ")))
});

clause_unit!(OrderClause, "order", |query, compiler, binder| {
    match query.part(ClauseName::Order) {
        Clause::Order(Some(order)) => Ok(format!(
            " {}",
            compiler.compile_expression(&Expression::OrderBy(order.clone()), binder)?
        )),
        _ => Ok(String::new()),
    }
});

/// Integers are inlined, expressions compiled, other values bound.
fn compile_count(operand: &Operand, compiler: &Compiler, binder: &mut ValueBinder) -> Result<String> {
    match operand {
        Operand::Value(SqlValue::Int(n)) => Ok(n.to_string()),
        Operand::Value(value) => Ok(bind_value(binder, "c", value, value.inferred_type())),
        Operand::Expr(expr) => compiler.compile_expression(expr, binder),
        Operand::List(_) => Err(QueryError::ArrayValueForScalarType {
            type_name: String::from("integer"),
        }),
    }
}

clause_unit!(LimitClause, "limit", |query, compiler, binder| {
    match query.part(ClauseName::Limit) {
        Clause::Limit(Some(limit)) => Ok(format!(" LIMIT {}", compile_count(limit, compiler, binder)?)),
        _ => Ok(String::new()),
    }
});

clause_unit!(OffsetClause, "offset", |query, compiler, binder| {
    match query.part(ClauseName::Offset) {
        Clause::Offset(Some(offset)) => Ok(format!(
            " OFFSET {}",
            compile_count(offset, compiler, binder)?
        )),
        _ => Ok(String::new()),
    }
});

clause_unit!(UnionClause, "union", |query, compiler, binder| {
    let Clause::Union(operations) = query.part(ClauseName::Union) else {
        return Ok(String::new());
    };
    let dialect = compiler.dialect();
    let ordered = dialect.ordered_union();
    let mut sql = String::new();
    if ordered {
        sql.push(')');
    }
    for operation in operations {
        if !dialect.supports_set_operator(operation.operator) {
            return Err(QueryError::UnsupportedFeature {
                dialect: dialect.name().to_string(),
                feature: operation.operator.as_str().to_string(),
            });
        }
        let compiled = compiler.compile_expression(&operation.query, binder)?;
        let branch = if compiled.starts_with('(') {
            compiled.trim_matches(['(', ')'])
        } else {
            compiled.as_str()
        };
        sql.push('\n');
        sql.push_str(operation.operator.as_str());
        sql.push(' ');
        if operation.all {
            sql.push_str("ALL ");
        }
        if ordered {
            sql.push('(');
            sql.push_str(branch);
            sql.push(')');
        } else {
            sql.push_str(branch);
        }
    }
    Ok(sql)
});

clause_unit!(EpilogClause, "epilog", |query, compiler, binder| {
    match query.part(ClauseName::Epilog) {
        Clause::Epilog(Some(Field::Name(text))) => Ok(format!(" {text}")),
        Clause::Epilog(Some(Field::Expr(expr))) => {
            Ok(format!(" {}", compiler.compile_expression(expr, binder)?))
        }
        _ => Ok(String::new()),
    }
});

clause_unit!(InsertClause, "insert", |query, _compiler, _binder| {
    let Clause::Insert(target) = query.part(ClauseName::Insert) else {
        return Ok(String::new());
    };
    let table = target.table.as_deref().ok_or(QueryError::InsertWithoutTable)?;
    Ok(format!(
        "INSERT{} INTO {table} ({})",
        modifiers(query),
        target.columns.join(", ")
    ))
});

clause_unit!(ValuesClause, "values", |query, compiler, binder| {
    match query.part(ClauseName::Values) {
        Clause::Values(Some(values)) => {
            compiler.compile_expression(&Expression::Values(values.clone()), binder)
        }
        _ => Ok(String::new()),
    }
});

clause_unit!(UpdateClause, "update", |query, compiler, binder| {
    let Clause::Update(tables) = query.part(ClauseName::Update) else {
        return Ok(String::new());
    };
    Ok(format!(
        "UPDATE{} {}",
        modifiers(query),
        stringify_all(tables, compiler, binder)?.join(",")
    ))
});

clause_unit!(SetClause, "set", |query, compiler, binder| {
    let Clause::Set(Some(tree)) = query.part(ClauseName::Set) else {
        return Ok(String::new());
    };
    let sql = compiler.compile_expression(&Expression::Conditions(tree.clone()), binder)?;
    let sql = match sql.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => inner.to_string(),
        None => sql,
    };
    Ok(format!(" SET {sql}"))
});

clause_unit!(DeleteClause, "delete", |_query, _compiler, _binder| {
    Ok(String::from("DELETE"))
});

clause_unit!(ModifierClause, "modifier", |query, _compiler, _binder| {
    Ok(modifiers(query))
});

pub(super) fn register(compiler: &mut Compiler) {
    let units: [(ClauseName, Arc<dyn ClauseCompiler>); 20] = [
        (ClauseName::Comment, Arc::new(CommentClause)),
        (ClauseName::With, Arc::new(WithClause)),
        (ClauseName::Select, Arc::new(SelectClause)),
        (ClauseName::From, Arc::new(FromClause)),
        (ClauseName::Join, Arc::new(JoinClause)),
        (ClauseName::Where, Arc::new(WhereClause)),
        (ClauseName::Group, Arc::new(GroupClause)),
        (ClauseName::Having, Arc::new(HavingClause)),
        (ClauseName::Window, Arc::new(WindowClause)),
        (ClauseName::Order, Arc::new(OrderClause)),
        (ClauseName::Limit, Arc::new(LimitClause)),
        (ClauseName::Offset, Arc::new(OffsetClause)),
        (ClauseName::Union, Arc::new(UnionClause)),
        (ClauseName::Epilog, Arc::new(EpilogClause)),
        (ClauseName::Insert, Arc::new(InsertClause)),
        (ClauseName::Values, Arc::new(ValuesClause)),
        (ClauseName::Update, Arc::new(UpdateClause)),
        (ClauseName::Set, Arc::new(SetClause)),
        (ClauseName::Delete, Arc::new(DeleteClause)),
        (ClauseName::Modifier, Arc::new(ModifierClause)),
    ];
    for (name, unit) in units {
        compiler.add(name, Unit::Clause(unit));
    }
}
