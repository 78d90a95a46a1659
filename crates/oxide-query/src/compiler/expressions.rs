//! Expression units, one per node kind.

use std::sync::Arc;

use super::{bind_value, unsupported, Compiler, ExpressionCompiler, Unit};
use crate::binder::ValueBinder;
use crate::error::{QueryError, Result};
use crate::expression::{
    Expression, ExpressionKind, FrameBound, FrameOffset, FunctionExpression, OrderItem,
    UnaryPosition,
};
use crate::types::base_type;
use crate::value::{Field, Operand, SqlValue};

fn compile_field(field: &Field, compiler: &Compiler, binder: &mut ValueBinder) -> Result<String> {
    match field {
        Field::Name(name) => Ok(name.clone()),
        Field::Expr(expr) => compiler.compile_expression(expr, binder),
    }
}

fn list_error(type_name: Option<&str>) -> QueryError {
    QueryError::ArrayValueForScalarType {
        type_name: type_name.unwrap_or("none").to_string(),
    }
}

/// `NULL` for missing or null values, otherwise a bound placeholder or the
/// compiled expression.
fn compile_nullable(
    value: Option<&Operand>,
    type_name: Option<&str>,
    compiler: &Compiler,
    binder: &mut ValueBinder,
) -> Result<String> {
    match value {
        None | Some(Operand::Value(SqlValue::Null)) => Ok(String::from("NULL")),
        Some(operand) => compiler.compile_operand(operand, type_name, binder),
    }
}

struct IdentifierUnit;

impl ExpressionCompiler for IdentifierUnit {
    fn name(&self) -> &'static str {
        "identifier"
    }

    fn compile(&self, expr: &Expression, _: &Compiler, _: &mut ValueBinder) -> Result<String> {
        let Expression::Identifier(id) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        let mut sql = id.name().to_string();
        if let Some(collation) = id.collation() {
            sql.push_str(" COLLATE ");
            sql.push_str(collation);
        }
        Ok(sql)
    }
}

struct StringUnit;

impl ExpressionCompiler for StringUnit {
    fn name(&self) -> &'static str {
        "string"
    }

    fn compile(&self, expr: &Expression, _: &Compiler, binder: &mut ValueBinder) -> Result<String> {
        let Expression::String(string) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        let value = SqlValue::Text(string.value().to_string());
        let placeholder = bind_value(binder, "c", &value, Some("string"));
        Ok(format!("{placeholder} COLLATE {}", string.collation()))
    }
}

struct ComparisonUnit;

impl ComparisonUnit {
    /// Placeholders (or compiled expressions) of a multi-value comparison,
    /// in value order.
    fn flatten(
        value: &Operand,
        type_name: Option<&str>,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<Vec<String>> {
        let items = match value {
            Operand::List(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            let part = match item {
                Operand::Value(v) => bind_value(binder, "c", v, type_name),
                Operand::Expr(e) => compiler.compile_expression(e, binder)?,
                Operand::List(_) => return Err(list_error(type_name)),
            };
            parts.push(part);
        }
        Ok(parts)
    }
}

impl ExpressionCompiler for ComparisonUnit {
    fn name(&self) -> &'static str {
        "comparison"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::Comparison(cmp) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        let field = compile_field(cmp.field(), compiler, binder)?;
        let operator = cmp.operator();

        if let Operand::Expr(value) = cmp.value() {
            let value_sql = compiler.compile_expression(value, binder)?;
            return Ok(match value.as_ref() {
                Expression::Identifier(_) => format!("{field} {operator} {value_sql}"),
                _ => format!("{field} {operator} ({value_sql})"),
            });
        }

        let field = match cmp.field().as_expression() {
            Some(Expression::Identifier(_)) | None => field,
            Some(_) => format!("({field})"),
        };
        if cmp.is_multiple() {
            let type_name = cmp.type_name().map(base_type);
            let parts = Self::flatten(cmp.value(), type_name, compiler, binder)?;
            if parts.is_empty() {
                return Err(QueryError::EmptyValueList {
                    field: cmp.field().label(),
                });
            }
            return Ok(format!("{field} {operator} ({})", parts.join(",")));
        }
        let Operand::Value(value) = cmp.value() else {
            return Err(list_error(cmp.type_name()));
        };
        let placeholder = bind_value(binder, "c", value, cmp.type_name());
        Ok(format!("{field} {operator} {placeholder}"))
    }
}

struct BetweenUnit;

impl ExpressionCompiler for BetweenUnit {
    fn name(&self) -> &'static str {
        "between"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::Between(between) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        let field = compile_field(between.field(), compiler, binder)?;
        let from = compiler.compile_operand(between.from_value(), between.type_name(), binder)?;
        let to = compiler.compile_operand(between.to_value(), between.type_name(), binder)?;
        Ok(format!("{field} BETWEEN {from} AND {to}"))
    }
}

struct ConditionsUnit;

impl ExpressionCompiler for ConditionsUnit {
    fn name(&self) -> &'static str {
        "conditions"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::Conditions(tree) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        if tree.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(tree.count());
        for condition in tree.conditions() {
            let sql = compiler.compile_nested(condition, binder)?;
            if !sql.is_empty() {
                parts.push(sql);
            }
        }
        let joined = parts.join(&format!(" {} ", tree.conjunction()));
        if tree.count() == 1 {
            Ok(joined)
        } else {
            Ok(format!("({joined})"))
        }
    }
}

struct CaseUnit;

impl ExpressionCompiler for CaseUnit {
    fn name(&self) -> &'static str {
        "case"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::Case(case) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        case.validate()?;

        let mut sql = String::from("CASE ");
        if case.is_simple() {
            sql.push_str(&compile_nullable(
                case.value(),
                case.value_type(),
                compiler,
                binder,
            )?);
            sql.push(' ');
        }
        let mut whens = Vec::new();
        for when in case.when_nodes() {
            whens.push(compiler.compile_expression(when, binder)?);
        }
        sql.push_str(&whens.join(" "));
        sql.push_str(" ELSE ");
        sql.push_str(&compile_nullable(
            case.else_value(),
            case.else_type(),
            compiler,
            binder,
        )?);
        sql.push_str(" END");
        Ok(sql)
    }
}

struct WhenThenUnit;

impl ExpressionCompiler for WhenThenUnit {
    fn name(&self) -> &'static str {
        "when_then"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::WhenThen(branch) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        branch.validate()?;
        let when = match branch.when_value() {
            Some(operand) => compiler.compile_operand(operand, branch.when_type(), binder)?,
            None => String::from("NULL"),
        };
        let then = compile_nullable(branch.result(), branch.result_type(), compiler, binder)?;
        Ok(format!("WHEN {when} THEN {then}"))
    }
}

/// `NAME(arg, ...)`; scalars bind as `:param_N`.
fn compile_call(
    function: &FunctionExpression,
    compiler: &Compiler,
    binder: &mut ValueBinder,
) -> Result<String> {
    let mut args = Vec::with_capacity(function.args().len());
    for (i, arg) in function.args().iter().enumerate() {
        let sql = match arg {
            Operand::Value(v) => bind_value(binder, "param", v, function.arg_type(i)),
            Operand::Expr(e) => compiler.compile_nested(e, binder)?,
            Operand::List(_) => return Err(list_error(function.arg_type(i))),
        };
        args.push(sql);
    }
    Ok(format!("{}({})", function.name(), args.join(", ")))
}

struct FunctionUnit;

impl ExpressionCompiler for FunctionUnit {
    fn name(&self) -> &'static str {
        "function"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::Function(function) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        compile_call(function, compiler, binder)
    }
}

struct AggregateUnit;

impl ExpressionCompiler for AggregateUnit {
    fn name(&self) -> &'static str {
        "aggregate"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::Aggregate(aggregate) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        let mut sql = compile_call(aggregate.function(), compiler, binder)?;
        if let Some(filter) = aggregate.filter_conditions() {
            sql.push_str(" FILTER (WHERE ");
            sql.push_str(&compiler.compile_expression(filter, binder)?);
            sql.push(')');
        }
        if let (Some(window), Some(node)) = (aggregate.window(), aggregate.window_node()) {
            let window_sql = compiler.compile_expression(node, binder)?;
            if window.is_named_only() {
                sql.push_str(" OVER ");
                sql.push_str(&window_sql);
            } else {
                sql.push_str(" OVER (");
                sql.push_str(&window_sql);
                sql.push(')');
            }
        }
        Ok(sql)
    }
}

struct UnaryUnit;

impl ExpressionCompiler for UnaryUnit {
    fn name(&self) -> &'static str {
        "unary"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::Unary(unary) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        let operand = compiler.compile_expression(unary.value(), binder)?;
        Ok(match unary.position() {
            UnaryPosition::Postfix => format!("({operand}) {}", unary.operator()),
            UnaryPosition::Prefix => format!("{} ({operand})", unary.operator()),
        })
    }
}

struct TupleUnit;

impl ExpressionCompiler for TupleUnit {
    fn name(&self) -> &'static str {
        "tuple"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::Tuple(tuple) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        let mut fields = Vec::with_capacity(tuple.fields().len());
        for field in tuple.fields() {
            fields.push(compile_field(field, compiler, binder)?);
        }

        let values = match tuple.value() {
            Operand::Expr(e) => compiler.compile_expression(e, binder)?,
            Operand::Value(v) => bind_value(binder, "c", v, tuple.type_at(0)),
            Operand::List(rows) => {
                let mut values = Vec::with_capacity(rows.len());
                for (i, row) in rows.iter().enumerate() {
                    let sql = match row {
                        Operand::Expr(e) => compiler.compile_expression(e, binder)?,
                        Operand::List(items) if tuple.is_multi() => {
                            let mut bound = Vec::with_capacity(items.len());
                            for (k, item) in items.iter().enumerate() {
                                bound.push(compiler.compile_operand(item, tuple.type_at(k), binder)?);
                            }
                            format!("({})", bound.join(","))
                        }
                        Operand::Value(v) => bind_value(binder, "c", v, tuple.type_at(i)),
                        Operand::List(_) => return Err(list_error(tuple.type_at(i))),
                    };
                    values.push(sql);
                }
                values.join(", ")
            }
        };
        Ok(format!(
            "({}) {} ({values})",
            fields.join(", "),
            tuple.operator()
        ))
    }
}

struct OrderByUnit;

impl ExpressionCompiler for OrderByUnit {
    fn name(&self) -> &'static str {
        "order_by"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::OrderBy(order) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        let mut items = Vec::with_capacity(order.count());
        for item in order.items() {
            items.push(match item {
                OrderItem::Raw(sql) => sql.clone(),
                OrderItem::Keyed { field, direction } => format!("{field} {direction}"),
                OrderItem::Expr(e) => compiler.compile_expression(e, binder)?,
            });
        }
        Ok(format!("ORDER BY {}", items.join(", ")))
    }
}

struct OrderClauseUnit;

impl ExpressionCompiler for OrderClauseUnit {
    fn name(&self) -> &'static str {
        "order_clause"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::OrderClause(clause) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        let field = match clause.field() {
            Field::Name(name) => name.clone(),
            Field::Expr(e) => compiler.compile_nested(e, binder)?,
        };
        Ok(format!("{field} {}", clause.direction()))
    }
}

struct WindowUnit;

impl WindowUnit {
    fn bound(bound: &FrameBound, compiler: &Compiler, binder: &mut ValueBinder) -> Result<String> {
        Ok(match &bound.offset {
            FrameOffset::Rows(0) => String::from("CURRENT ROW"),
            FrameOffset::Unbounded => format!("UNBOUNDED {}", bound.direction),
            FrameOffset::Rows(n) => format!("{n} {}", bound.direction),
            FrameOffset::Expr(e) => {
                format!("{} {}", compiler.compile_expression(e, binder)?, bound.direction)
            }
        })
    }
}

impl ExpressionCompiler for WindowUnit {
    fn name(&self) -> &'static str {
        "window"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::Window(window) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        let mut clauses = Vec::new();
        if let Some(name) = window.window_name() {
            clauses.push(compiler.compile_expression(name, binder)?);
        }
        if !window.partitions().is_empty() {
            let mut partitions = Vec::with_capacity(window.partitions().len());
            for partition in window.partitions() {
                partitions.push(compiler.compile_expression(partition, binder)?);
            }
            clauses.push(format!("PARTITION BY {}", partitions.join(", ")));
        }
        if let Some(order) = window.order_by() {
            clauses.push(compiler.compile_expression(order, binder)?);
        }
        if let Some(frame) = window.frame_spec() {
            let start = Self::bound(&frame.start, compiler, binder)?;
            let end = Self::bound(&frame.end, compiler, binder)?;
            let mut sql = format!("{} BETWEEN {start} AND {end}", frame.frame_type);
            if let Some(exclusion) = window.exclusion() {
                sql.push_str(" EXCLUDE ");
                sql.push_str(exclusion);
            }
            clauses.push(sql);
        }
        Ok(clauses.join(" "))
    }
}

struct CommonTableUnit;

impl ExpressionCompiler for CommonTableUnit {
    fn name(&self) -> &'static str {
        "common_table"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::CommonTable(cte) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        let mut sql = compiler.compile_expression(cte.cte_name(), binder)?;
        if !cte.fields().is_empty() {
            let mut fields = Vec::with_capacity(cte.fields().len());
            for field in cte.fields() {
                fields.push(compiler.compile_expression(field, binder)?);
            }
            sql.push('(');
            sql.push_str(&fields.join(", "));
            sql.push(')');
        }
        sql.push_str(" AS ");
        if let Some(materialized) = cte.materialization() {
            sql.push_str(&format!("{materialized} "));
        }
        sql.push('(');
        if let Some(body) = cte.body() {
            sql.push_str(&compiler.compile_expression(body, binder)?);
        }
        sql.push(')');
        Ok(sql)
    }
}

struct ValuesUnit;

impl ExpressionCompiler for ValuesUnit {
    fn name(&self) -> &'static str {
        "values"
    }

    fn compile(
        &self,
        expr: &Expression,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let Expression::Values(values) = expr else {
            return Err(unsupported(self.name(), expr));
        };
        if values.is_empty() {
            return Ok(String::new());
        }
        if let Some(query) = values.query() {
            return Ok(format!(" {}", compiler.compile_expression(query, binder)?));
        }

        let columns = values.column_names();
        let mut rows = Vec::with_capacity(values.rows().len());
        for row in values.rows() {
            let mut placeholders = Vec::with_capacity(columns.len());
            for column in &columns {
                let type_name = values.type_map().type_of(column);
                let sql = match row.get(column) {
                    Some(Operand::Expr(e)) => {
                        format!("({})", compiler.compile_expression(e, binder)?)
                    }
                    Some(Operand::Value(v)) => bind_value(binder, "c", v, type_name),
                    Some(Operand::List(_)) => return Err(list_error(type_name)),
                    None => bind_value(binder, "c", &SqlValue::Null, type_name),
                };
                placeholders.push(sql);
            }
            rows.push(placeholders.join(", "));
        }
        Ok(format!(" VALUES ({})", rows.join("), (")))
    }
}

struct RawUnit;

impl ExpressionCompiler for RawUnit {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn compile(&self, expr: &Expression, _: &Compiler, _: &mut ValueBinder) -> Result<String> {
        match expr {
            Expression::Raw(sql) => Ok(sql.clone()),
            other => Err(unsupported(self.name(), other)),
        }
    }
}

pub(super) fn register(compiler: &mut Compiler) {
    let units: [(ExpressionKind, Arc<dyn ExpressionCompiler>); 17] = [
        (ExpressionKind::Identifier, Arc::new(IdentifierUnit)),
        (ExpressionKind::String, Arc::new(StringUnit)),
        (ExpressionKind::Comparison, Arc::new(ComparisonUnit)),
        (ExpressionKind::Between, Arc::new(BetweenUnit)),
        (ExpressionKind::Conditions, Arc::new(ConditionsUnit)),
        (ExpressionKind::Case, Arc::new(CaseUnit)),
        (ExpressionKind::WhenThen, Arc::new(WhenThenUnit)),
        (ExpressionKind::Function, Arc::new(FunctionUnit)),
        (ExpressionKind::Aggregate, Arc::new(AggregateUnit)),
        (ExpressionKind::Unary, Arc::new(UnaryUnit)),
        (ExpressionKind::Tuple, Arc::new(TupleUnit)),
        (ExpressionKind::OrderBy, Arc::new(OrderByUnit)),
        (ExpressionKind::OrderClause, Arc::new(OrderClauseUnit)),
        (ExpressionKind::Window, Arc::new(WindowUnit)),
        (ExpressionKind::CommonTable, Arc::new(CommonTableUnit)),
        (ExpressionKind::Values, Arc::new(ValuesUnit)),
        (ExpressionKind::Raw, Arc::new(RawUnit)),
    ];
    for (kind, unit) in units {
        compiler.add(kind, Unit::Expression(unit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{
        AggregateExpression, BetweenExpression, CaseStatementExpression, CommonTableExpression,
        ComparisonExpression, IdentifierExpression, OrderByExpression, QueryExpression,
        StringExpression, TupleComparison, UnaryExpression, WindowExpression,
    };
    use crate::query::Query;

    fn compile(expr: impl Into<Expression>) -> (String, ValueBinder) {
        let compiler = Compiler::default();
        let mut binder = ValueBinder::new();
        let sql = compiler
            .compile_expression(&expr.into(), &mut binder)
            .unwrap();
        (sql, binder)
    }

    #[test]
    fn test_identifier_with_collation() {
        let (sql, _) = compile(IdentifierExpression::new("title").collate("utf8_bin"));
        assert_eq!(sql, "title COLLATE utf8_bin");
    }

    #[test]
    fn test_string_is_bound_as_string() {
        let (sql, binder) = compile(StringExpression::new("abc", "utf8_general_ci"));
        assert_eq!(sql, ":c_0 COLLATE utf8_general_ci");
        assert_eq!(binder.get(":c_0").unwrap().type_name.as_deref(), Some("string"));
    }

    #[test]
    fn test_comparison_against_identifier_is_not_wrapped() {
        let cmp = ComparisonExpression::new("a.id", Expression::identifier("b.a_id"), None, "=");
        let (sql, binder) = compile(cmp);
        assert_eq!(sql, "a.id = b.a_id");
        assert!(binder.is_empty());
    }

    #[test]
    fn test_comparison_against_subquery_is_wrapped() {
        let sub = Query::select(["id"]).from(["authors"]);
        let cmp = ComparisonExpression::new("author_id", sub, Some("integer[]"), "IN");
        let (sql, _) = compile(cmp);
        assert_eq!(sql, "author_id IN (SELECT id FROM authors)");
    }

    #[test]
    fn test_multiple_values_bind_in_order() {
        let cmp = ComparisonExpression::new(
            "id",
            Operand::List(vec![Operand::from(1), Operand::from(2)]),
            Some("integer[]"),
            "IN",
        );
        let (sql, binder) = compile(cmp);
        assert_eq!(sql, "id IN (:c_0,:c_1)");
        assert_eq!(binder.get(":c_1").unwrap().type_name.as_deref(), Some("integer"));
    }

    #[test]
    fn test_empty_multiple_values_fail() {
        let cmp = ComparisonExpression::new("id", Operand::List(vec![]), Some("integer[]"), "IN");
        let compiler = Compiler::default();
        let mut binder = ValueBinder::new();
        assert_eq!(
            compiler.compile_expression(&cmp.into(), &mut binder),
            Err(QueryError::EmptyValueList {
                field: String::from("id")
            })
        );
    }

    #[test]
    fn test_between_binds_both_bounds() {
        let (sql, binder) = compile(BetweenExpression::new("price", 1, 10, Some("integer")));
        assert_eq!(sql, "price BETWEEN :c_0 AND :c_1");
        assert_eq!(binder.len(), 2);
    }

    #[test]
    fn test_single_condition_is_not_wrapped() {
        let tree = QueryExpression::new().eq("a", 1, None).unwrap();
        assert_eq!(compile(tree).0, "a = :c_0");

        let tree = QueryExpression::new()
            .eq("a", 1, None)
            .unwrap()
            .eq("b", 2, None)
            .unwrap();
        assert_eq!(compile(tree).0, "(a = :c_0 AND b = :c_1)");
    }

    #[test]
    fn test_unary_positions() {
        assert_eq!(
            compile(UnaryExpression::not(Expression::identifier("published"))).0,
            "NOT (published)"
        );
        assert_eq!(
            compile(UnaryExpression::is_null(Expression::identifier("deleted"))).0,
            "(deleted) IS NULL"
        );
    }

    #[test]
    fn test_function_binds_params() {
        let function = FunctionExpression::new("CONCAT", "string")
            .identifier("title")
            .arg(" by ", Some("string"))
            .literal("name");
        let (sql, binder) = compile(function);
        assert_eq!(sql, "CONCAT(title, :param_0, name)");
        assert_eq!(binder.get(":param_0").unwrap().value, SqlValue::Text(String::from(" by ")));
    }

    #[test]
    fn test_aggregate_filter_and_window() {
        let agg = AggregateExpression::new("SUM", "float")
            .identifier("amount")
            .filter([("status", "paid")])
            .unwrap()
            .over(WindowExpression::new().partition(["account_id"]));
        assert_eq!(
            compile(agg).0,
            "SUM(amount) FILTER (WHERE status = :c_0) OVER (PARTITION BY account_id)"
        );

        let named = AggregateExpression::new("COUNT", "integer")
            .literal("*")
            .over_named("w");
        assert_eq!(compile(named).0, "COUNT(*) OVER w");
    }

    #[test]
    fn test_window_frame() {
        let window = WindowExpression::new()
            .order([("created", "DESC")])
            .unwrap()
            .rows(None::<u64>, 0_u64)
            .exclude_current();
        assert_eq!(
            compile(window).0,
            "ORDER BY created DESC ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW EXCLUDE CURRENT ROW"
        );
    }

    #[test]
    fn test_tuple_multi_rows() {
        let tuple = TupleComparison::new(
            ["a", "b"],
            Operand::List(vec![
                Operand::List(vec![Operand::from(1), Operand::from(2)]),
                Operand::List(vec![Operand::from(3), Operand::from(4)]),
            ]),
            &[Some("integer"), Some("integer")],
            "IN",
        )
        .unwrap();
        assert_eq!(compile(tuple).0, "(a, b) IN ((:c_0,:c_1), (:c_2,:c_3))");
    }

    #[test]
    fn test_tuple_single_row() {
        let tuple = TupleComparison::new(
            ["a", "b"],
            Operand::List(vec![Operand::from(1), Operand::from("x")]),
            &[Some("integer"), Some("string")],
            "=",
        )
        .unwrap();
        let (sql, binder) = compile(tuple);
        assert_eq!(sql, "(a, b) = (:c_0, :c_1)");
        assert_eq!(binder.get(":c_1").unwrap().type_name.as_deref(), Some("string"));
    }

    #[test]
    fn test_order_by_items() {
        let order = OrderByExpression::new()
            .add([OrderItem::from("title"), OrderItem::from(("id", "DESC"))])
            .unwrap();
        assert_eq!(compile(order).0, "ORDER BY title, id DESC");
    }

    #[test]
    fn test_case_with_else() {
        let case = CaseStatementExpression::new()
            .when_conditions([("status", "draft")])
            .unwrap()
            .then(1, None)
            .unwrap()
            .else_(0, None)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            compile(case).0,
            "CASE WHEN status = :c_0 THEN :c_1 ELSE :c_2 END"
        );
    }

    #[test]
    fn test_case_without_branches_fails_to_compile() {
        let case = CaseStatementExpression::new().build().unwrap();
        let compiler = Compiler::default();
        let mut binder = ValueBinder::new();
        assert!(matches!(
            compiler.compile_expression(&case.into(), &mut binder),
            Err(QueryError::InvalidUsage(_))
        ));
    }

    #[test]
    fn test_cte() {
        let cte = CommonTableExpression::new("recent")
            .field(["id"])
            .query(Query::select(["id"]).from(["articles"]))
            .materialized();
        assert_eq!(
            compile(cte).0,
            "recent(id) AS MATERIALIZED (SELECT id FROM articles)"
        );
    }

    #[test]
    fn test_wrong_node_is_rejected() {
        let compiler = Compiler::default();
        let mut binder = ValueBinder::new();
        let err = RawUnit
            .compile(&Expression::identifier("x"), &compiler, &mut binder)
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::UnsupportedExpressionType {
                compiler: String::from("raw"),
                kind: String::from("identifier"),
            }
        );
    }
}
