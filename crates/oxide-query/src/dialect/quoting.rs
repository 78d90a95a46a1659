//! Identifier quoting.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::compiler::{Compiler, QueryListener};
use crate::error::Result;
use crate::expression::{Expression, OrderByExpression, OrderItem};
use crate::query::{Aliased, Distinct, Query, QueryKind};
use crate::value::Field;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+$").expect("valid word regex"));
static DOTTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+\.[^ \*]*$").expect("valid dotted regex"));
static TABLE_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+\.\*$").expect("valid table star regex"));
static FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w-]+)\((.*)\)$").expect("valid function regex"));
static ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([\w-]+(\.[\w\s-]+|\(.*\))*)\s+AS\s*([\w-]+)$").expect("valid alias regex")
});
static DOTTED_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w-]+\.[\w][\w\s-]*[\w])(.*)").expect("valid dotted prefix regex")
});
static LEADING_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\s-]*[\w-]+").expect("valid leading word regex"));

fn wrap(text: &str, start: &str, end: &str) -> String {
    format!("{start}{text}{end}")
}

fn quote_segments(dotted: &str, start: &str, end: &str) -> String {
    let separator = format!("{end}.{start}");
    wrap(&dotted.split('.').collect::<Vec<_>>().join(&separator), start, end)
}

/// Quotes `identifier` with `start`/`end`.
///
/// - `*` and the empty string are returned unchanged;
/// - `name` and `table.column` are quoted segment by segment;
/// - `table.*` quotes the table only;
/// - `FUNC(args)` keeps the function name and quotes the arguments;
/// - `expr AS alias` quotes both sides;
/// - a dotted prefix followed by other text (`a.b DESC`) quotes the prefix.
///
/// Text that already carries quotes is left alone.
#[must_use]
pub fn quote_identifier(identifier: &str, start: &str, end: &str) -> String {
    let identifier = identifier.trim();
    if identifier == "*" || identifier.is_empty() {
        return identifier.to_string();
    }
    if WORD.is_match(identifier) {
        return wrap(identifier, start, end);
    }
    if DOTTED.is_match(identifier) {
        return quote_segments(identifier, start, end);
    }
    if TABLE_STAR.is_match(identifier) {
        return format!("{start}{}", identifier.replacen(".*", &format!("{end}.*"), 1));
    }
    if let Some(caps) = FUNCTION.captures(identifier) {
        return format!("{}({})", &caps[1], quote_identifier(&caps[2], start, end));
    }
    if let Some(caps) = ALIAS.captures(identifier) {
        return format!(
            "{} AS {}",
            quote_identifier(&caps[1], start, end),
            quote_identifier(&caps[3], start, end)
        );
    }
    if let Some(caps) = DOTTED_PREFIX.captures(identifier) {
        return format!("{}{}", quote_segments(&caps[1], start, end), &caps[2]);
    }
    if LEADING_WORD.is_match(identifier) {
        return wrap(identifier, start, end);
    }
    identifier.to_string()
}

/// Quotes every identifier of a query before it is compiled.
///
/// Runs only when the compiler has identifier quoting enabled. Raw SQL
/// fragments and embedded queries are not touched here; embedded queries
/// are quoted when they are compiled themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentifierQuoter;

impl IdentifierQuoter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl QueryListener for IdentifierQuoter {
    fn name(&self) -> &'static str {
        "identifier-quoter"
    }

    fn before_compile(&self, query: &mut Query, compiler: &Compiler) -> Result<()> {
        if !compiler.quotes_identifiers() {
            return Ok(());
        }
        let quote = |name: &str| compiler.quote_identifier(name);
        let kind = query.kind();
        let parts = query.parts_mut();

        match kind {
            QueryKind::Select => {
                for field in &mut parts.select {
                    quote_field(&mut field.value, &quote);
                }
                if let Distinct::On(fields) = &mut parts.distinct {
                    for field in fields {
                        quote_field(field, &quote);
                    }
                }
                for field in &mut parts.group {
                    quote_field(field, &quote);
                }
            }
            QueryKind::Insert => {
                if let Some(table) = &mut parts.insert.table {
                    *table = quote(table);
                }
                let columns: Vec<String> =
                    parts.insert.columns.iter().map(|c| quote(c)).collect();
                if let Some(values) = &mut parts.values {
                    values.set_columns(columns.clone());
                }
                parts.insert.columns = columns;
            }
            QueryKind::Update => {
                for table in &mut parts.update {
                    quote_field(table, &quote);
                }
            }
            QueryKind::Delete => {}
        }
        for table in &mut parts.from {
            quote_aliased(table, &quote);
        }
        for join in &mut parts.join {
            quote_aliased(&mut join.table, &quote);
        }
        if let Some(order) = &mut parts.order {
            quote_order(order, &quote);
        }

        query.traverse_expressions_mut(&mut |expr| quote_expression(expr, &quote));
        trace!(query = %kind, "quoted identifiers");
        Ok(())
    }
}

fn quote_field(field: &mut Field, quote: &impl Fn(&str) -> String) {
    if let Field::Name(name) = field {
        *name = quote(name);
    }
}

fn quote_aliased(entry: &mut Aliased, quote: &impl Fn(&str) -> String) {
    quote_field(&mut entry.value, quote);
    if let Some(alias) = &mut entry.alias {
        *alias = quote(alias);
    }
}

/// Order entries with spaces (`title DESC`) are left alone.
fn quote_order(order: &mut OrderByExpression, quote: &impl Fn(&str) -> String) {
    for item in order.items_mut() {
        match item {
            OrderItem::Raw(sql) if !sql.contains(' ') => *sql = quote(sql),
            OrderItem::Keyed { field, .. } if !field.contains(' ') => *field = quote(field),
            _ => {}
        }
    }
}

fn quote_expression(expr: &mut Expression, quote: &impl Fn(&str) -> String) {
    match expr {
        Expression::Comparison(c) => quote_field(c.field_mut(), quote),
        Expression::Between(b) => quote_field(b.field_mut(), quote),
        Expression::OrderClause(o) => quote_field(o.field_mut(), quote),
        Expression::Tuple(t) => {
            for field in t.fields_mut() {
                quote_field(field, quote);
            }
        }
        Expression::Identifier(i) => {
            let quoted = quote(i.name());
            i.set_name(quoted);
        }
        Expression::OrderBy(order) => quote_order(order, quote),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(identifier: &str) -> String {
        quote_identifier(identifier, "\"", "\"")
    }

    #[test]
    fn test_plain_and_dotted_names() {
        assert_eq!(q("id"), "\"id\"");
        assert_eq!(q("a.b"), "\"a\".\"b\"");
        assert_eq!(q("a.b.c"), "\"a\".\"b\".\"c\"");
        assert_eq!(q("a.*"), "\"a\".*");
        assert_eq!(q("first-name"), "\"first-name\"");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(q("*"), "*");
        assert_eq!(q(""), "");
        assert_eq!(q("  "), "");
        assert_eq!(q("\"id\""), "\"id\"");
        assert_eq!(q("\"a\".\"b\""), "\"a\".\"b\"");
    }

    #[test]
    fn test_functions() {
        assert_eq!(q("COUNT(*)"), "COUNT(*)");
        assert_eq!(q("MAX(price)"), "MAX(\"price\")");
        assert_eq!(q("LOWER(a.title)"), "LOWER(\"a\".\"title\")");
    }

    #[test]
    fn test_aliases() {
        assert_eq!(q("t AS x"), "\"t\" AS \"x\"");
        assert_eq!(q("a.title as heading"), "\"a\".\"title\" AS \"heading\"");
        assert_eq!(q("MAX(price) AS top"), "MAX(\"price\") AS \"top\"");
    }

    #[test]
    fn test_dotted_prefix_with_remainder() {
        assert_eq!(q("a.title DESC"), "\"a\".\"title DESC\"");
        assert_eq!(q("a.b = 1"), "\"a\".\"b\" = 1");
    }

    #[test]
    fn test_backticks() {
        assert_eq!(quote_identifier("a.b", "`", "`"), "`a`.`b`");
    }

    #[test]
    fn test_every_pattern_compiles() {
        for re in [
            &WORD,
            &DOTTED,
            &TABLE_STAR,
            &FUNCTION,
            &ALIAS,
            &DOTTED_PREFIX,
            &LEADING_WORD,
        ] {
            assert!(!re.as_str().is_empty());
        }
        assert_eq!(q("first name"), "\"first name\"");
    }
}
