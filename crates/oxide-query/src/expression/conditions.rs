//! Condition trees (`WHERE`, `HAVING`, `ON`, `SET`).
//!
//! A [`QueryExpression`] is an ordered list of conditions joined by a
//! conjunction. Conditions are added from [`Conditions`], a small input
//! language: `("field op", value)` pairs are parsed into comparisons, raw
//! strings are kept verbatim and nested groups become nested trees.

use super::{
    BetweenExpression, CaseStatementExpression, ComparisonExpression, Expression,
    IdentifierExpression, UnaryExpression,
};
use crate::error::{QueryError, Result};
use crate::types::{self, CasterHandle, TypeMap};
use crate::value::{Field, Operand};

/// One entry of a [`Conditions`] list.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A raw SQL fragment.
    Raw(String),
    /// A ready-made expression.
    Expr(Expression),
    /// A `"field [op]"` key with its value.
    Field(String, Operand),
    /// A group joined by `AND`, `OR` or `XOR`.
    Group(String, Vec<Condition>),
    /// A negated `AND` group.
    Not(Vec<Condition>),
    /// A nested `AND` group.
    Nested(Vec<Condition>),
}

impl Condition {
    /// A `"field [op]"` condition.
    #[must_use]
    pub fn field(key: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::Field(key.into(), value.into())
    }

    /// Conditions joined by `AND`.
    #[must_use]
    pub fn and<I, C>(items: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Self>,
    {
        Self::Group(String::from("AND"), items.into_iter().map(Into::into).collect())
    }

    /// Conditions joined by `OR`.
    #[must_use]
    pub fn or<I, C>(items: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Self>,
    {
        Self::Group(String::from("OR"), items.into_iter().map(Into::into).collect())
    }

    /// Negated conditions.
    #[must_use]
    pub fn not<I, C>(items: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Self>,
    {
        Self::Not(items.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Condition {
    fn from(sql: &str) -> Self {
        Self::Raw(sql.to_string())
    }
}

impl From<String> for Condition {
    fn from(sql: String) -> Self {
        Self::Raw(sql)
    }
}

impl From<Expression> for Condition {
    fn from(expr: Expression) -> Self {
        Self::Expr(expr)
    }
}

impl<V: Into<Operand>> From<(&str, V)> for Condition {
    fn from((key, value): (&str, V)) -> Self {
        Self::Field(key.to_string(), value.into())
    }
}

impl<V: Into<Operand>> From<(String, V)> for Condition {
    fn from((key, value): (String, V)) -> Self {
        Self::Field(key, value.into())
    }
}

/// A list of conditions plus single-use type overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    items: Vec<Condition>,
    types: Vec<(String, String)>,
}

impl Conditions {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a condition.
    #[must_use]
    pub fn push(mut self, condition: impl Into<Condition>) -> Self {
        self.items.push(condition.into());
        self
    }

    /// Sets type overrides used while parsing these conditions only.
    #[must_use]
    pub fn types<I, K, V>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.types = types
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// The conditions.
    #[must_use]
    pub fn items(&self) -> &[Condition] {
        &self.items
    }

    /// Returns `true` when there are no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn into_parts(self) -> (Vec<Condition>, Vec<(String, String)>) {
        (self.items, self.types)
    }
}

impl From<Condition> for Conditions {
    fn from(condition: Condition) -> Self {
        Self {
            items: vec![condition],
            types: Vec::new(),
        }
    }
}

impl From<Vec<Condition>> for Conditions {
    fn from(items: Vec<Condition>) -> Self {
        Self {
            items,
            types: Vec::new(),
        }
    }
}

impl<const N: usize> From<[Condition; N]> for Conditions {
    fn from(items: [Condition; N]) -> Self {
        Self::from(Vec::from(items))
    }
}

impl<K: Into<String>, V: Into<Operand>, const N: usize> From<[(K, V); N]> for Conditions {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| Condition::Field(k.into(), v.into()))
            .collect::<Vec<_>>()
            .into()
    }
}

impl<K: Into<String>, V: Into<Operand>> From<Vec<(K, V)>> for Conditions {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| Condition::Field(k.into(), v.into()))
            .collect::<Vec<_>>()
            .into()
    }
}

impl<const N: usize> From<[&str; N]> for Conditions {
    fn from(fragments: [&str; N]) -> Self {
        fragments
            .into_iter()
            .map(Condition::from)
            .collect::<Vec<_>>()
            .into()
    }
}

impl From<&str> for Conditions {
    fn from(sql: &str) -> Self {
        Self::from(Condition::from(sql))
    }
}

impl From<String> for Conditions {
    fn from(sql: String) -> Self {
        Self::from(Condition::from(sql))
    }
}

impl From<Expression> for Conditions {
    fn from(expr: Expression) -> Self {
        Self::from(Condition::Expr(expr))
    }
}

const GROUP_OPERATORS: [&str; 3] = ["and", "or", "xor"];

/// An ordered list of conditions joined by a conjunction.
///
/// One condition compiles bare; several compile as `(a AND b)`. The `","`
/// conjunction is used for `SET` lists.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryExpression {
    conditions: Vec<Expression>,
    conjunction: String,
    type_map: TypeMap,
    caster: CasterHandle,
}

impl Default for QueryExpression {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryExpression {
    /// An empty `AND` tree with default typing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_context(TypeMap::default(), CasterHandle::default())
    }

    /// An empty `AND` tree using the given type map and caster.
    #[must_use]
    pub fn with_context(type_map: TypeMap, caster: CasterHandle) -> Self {
        Self {
            conditions: Vec::new(),
            conjunction: String::from("AND"),
            type_map,
            caster,
        }
    }

    /// Builds a tree from conditions.
    pub fn from_conditions(
        conditions: impl Into<Conditions>,
        type_map: TypeMap,
        caster: CasterHandle,
        conjunction: &str,
    ) -> Result<Self> {
        let mut expr = Self::with_context(type_map, caster).tie_with(conjunction);
        expr.append(conditions)?;
        Ok(expr)
    }

    /// Sets the conjunction.
    #[must_use]
    pub fn tie_with(mut self, conjunction: &str) -> Self {
        self.conjunction = conjunction.to_string();
        self
    }

    /// The conjunction.
    #[must_use]
    pub fn conjunction(&self) -> &str {
        &self.conjunction
    }

    /// The type map used to type parsed conditions.
    #[must_use]
    pub const fn type_map(&self) -> &TypeMap {
        &self.type_map
    }

    /// Replaces the type map.
    pub fn set_type_map(&mut self, type_map: TypeMap) {
        self.type_map = type_map;
    }

    /// The caster applied to values.
    #[must_use]
    pub const fn caster(&self) -> &CasterHandle {
        &self.caster
    }

    /// Replaces the caster.
    pub fn set_caster(&mut self, caster: CasterHandle) {
        self.caster = caster;
    }

    /// The conditions.
    #[must_use]
    pub fn conditions(&self) -> &[Expression] {
        &self.conditions
    }

    /// Mutable access to the conditions.
    pub fn conditions_mut(&mut self) -> &mut Vec<Expression> {
        &mut self.conditions
    }

    /// Number of conditions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.conditions.len()
    }

    /// Returns `true` when no conditions were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns `true` when any condition is itself a condition tree.
    #[must_use]
    pub fn has_nested_expression(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| matches!(c, Expression::Conditions(_)))
    }

    /// Rewrites every condition; returning `None` drops it.
    pub fn iterate_parts<F>(&mut self, mut f: F)
    where
        F: FnMut(Expression) -> Option<Expression>,
    {
        self.conditions = std::mem::take(&mut self.conditions)
            .into_iter()
            .filter_map(&mut f)
            .collect();
    }

    /// Adds conditions.
    pub fn add(mut self, conditions: impl Into<Conditions>) -> Result<Self> {
        self.append(conditions)?;
        Ok(self)
    }

    /// Adds conditions in place.
    pub fn append(&mut self, conditions: impl Into<Conditions>) -> Result<()> {
        let (items, types) = conditions.into().into_parts();
        let type_map = if types.is_empty() {
            self.type_map.clone()
        } else {
            self.type_map.with_types(types)
        };
        for item in items {
            self.add_condition(item, &type_map)?;
        }
        Ok(())
    }

    fn add_condition(&mut self, condition: Condition, type_map: &TypeMap) -> Result<()> {
        match condition {
            Condition::Raw(sql) => {
                if !sql.is_empty() {
                    self.conditions.push(Expression::Raw(sql));
                }
            }
            Condition::Expr(expr) => self.conditions.push(expr),
            Condition::Field(key, value) => {
                if !key.trim().is_empty() {
                    let parsed = self.parse_condition(&key, value, type_map)?;
                    self.conditions.push(parsed);
                }
            }
            Condition::Group(op, items) => {
                if !GROUP_OPERATORS.contains(&op.to_ascii_lowercase().as_str()) {
                    return Err(QueryError::argument(format!(
                        "unknown condition group operator `{op}`"
                    )));
                }
                if !items.is_empty() {
                    let nested = self.nested(items, type_map, &op)?;
                    self.conditions.push(Expression::Conditions(nested));
                }
            }
            Condition::Not(items) => {
                if !items.is_empty() {
                    let nested = self.nested(items, type_map, "AND")?;
                    self.conditions
                        .push(UnaryExpression::not(Expression::Conditions(nested)).into());
                }
            }
            Condition::Nested(items) => {
                if !items.is_empty() {
                    let nested = self.nested(items, type_map, "AND")?;
                    self.conditions.push(Expression::Conditions(nested));
                }
            }
        }
        Ok(())
    }

    fn nested(&self, items: Vec<Condition>, type_map: &TypeMap, conjunction: &str) -> Result<Self> {
        Self::from_conditions(items, type_map.clone(), self.caster.clone(), conjunction)
    }

    /// Parses a `"field [op]"` key into a comparison.
    fn parse_condition(&self, key: &str, value: Operand, type_map: &TypeMap) -> Result<Expression> {
        let field = key.trim();
        let mut operator = String::from("=");
        let mut expression = field.to_string();

        let spaces = field.matches(' ').count();
        if spaces > 1 {
            let mut parts: Vec<String> = field.split(' ').map(String::from).collect();
            if ends_with_negation(&parts) {
                let last = parts.pop().unwrap_or_default();
                let second = parts.pop().unwrap_or_default();
                parts.push(format!("{second} {last}"));
            }
            operator = parts.pop().unwrap_or_default();
            expression = parts.join(" ");
        } else if spaces == 1 {
            if let Some((expr, op)) = field.split_once(' ') {
                expression = expr.to_string();
                operator = op.to_string();
            }
        }
        let mut operator = operator.trim().to_lowercase();

        let mut type_name = type_map.type_of(&expression).map(String::from);
        let mut multiple = types::is_multiple(type_name.as_deref());
        if operator == "in" || operator == "not in" || multiple {
            let base = type_name.unwrap_or_else(|| String::from("string"));
            type_name = Some(if multiple { base } else { format!("{base}[]") });
            if operator == "=" {
                operator = String::from("IN");
            } else if operator == "!=" {
                operator = String::from("NOT IN");
            }
            multiple = true;
        }

        let value = if multiple {
            match value {
                Operand::Value(v) if v.is_null() => Operand::List(Vec::new()),
                Operand::Value(v) => Operand::List(vec![Operand::Value(v)]),
                other => other,
            }
        } else {
            value
        };

        if value.is_null() {
            match operator.as_str() {
                "is" => {
                    return Ok(UnaryExpression::is_null(IdentifierExpression::new(expression)).into())
                }
                "is not" => {
                    return Ok(
                        UnaryExpression::is_not_null(IdentifierExpression::new(expression)).into(),
                    )
                }
                _ if self.conjunction != "," => {
                    return Err(QueryError::MissingOperator { field: expression });
                }
                _ => {}
            }
        } else if operator == "is" {
            operator = String::from("=");
        } else if operator == "is not" {
            operator = String::from("!=");
        }

        ComparisonExpression::typed(
            expression,
            value,
            type_name.as_deref(),
            &operator,
            &self.caster,
        )
        .map(Expression::Comparison)
    }

    fn calculate_type(&self, field: &Field) -> Option<String> {
        match field {
            Field::Name(name) => self.type_map.type_of(name).map(String::from),
            Field::Expr(expr) => match expr.as_ref() {
                Expression::Identifier(id) => self.type_map.type_of(id.name()).map(String::from),
                _ => None,
            },
        }
    }

    fn compare(
        mut self,
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
        operator: &str,
    ) -> Result<Self> {
        let field = field.into();
        let type_name = type_name
            .map(String::from)
            .or_else(|| self.calculate_type(&field));
        let comparison =
            ComparisonExpression::typed(field, value, type_name.as_deref(), operator, &self.caster)?;
        self.conditions.push(comparison.into());
        Ok(self)
    }

    /// Adds `field = value`.
    pub fn eq(
        self,
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        self.compare(field, value, type_name, "=")
    }

    /// Adds `field != value`.
    pub fn not_eq(
        self,
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        self.compare(field, value, type_name, "!=")
    }

    /// Adds `field > value`.
    pub fn gt(
        self,
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        self.compare(field, value, type_name, ">")
    }

    /// Adds `field >= value`.
    pub fn gte(
        self,
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        self.compare(field, value, type_name, ">=")
    }

    /// Adds `field < value`.
    pub fn lt(
        self,
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        self.compare(field, value, type_name, "<")
    }

    /// Adds `field <= value`.
    pub fn lte(
        self,
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        self.compare(field, value, type_name, "<=")
    }

    /// Adds `field LIKE value`.
    pub fn like(
        self,
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        self.compare(field, value, type_name, "LIKE")
    }

    /// Adds `field NOT LIKE value`.
    pub fn not_like(
        self,
        field: impl Into<Field>,
        value: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        self.compare(field, value, type_name, "NOT LIKE")
    }

    /// Adds `field IS NULL`.
    #[must_use]
    pub fn is_null(mut self, field: impl Into<Field>) -> Self {
        self.conditions
            .push(UnaryExpression::is_null(field_expression(field.into())).into());
        self
    }

    /// Adds `field IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(mut self, field: impl Into<Field>) -> Self {
        self.conditions
            .push(UnaryExpression::is_not_null(field_expression(field.into())).into());
        self
    }

    fn membership(
        self,
        field: impl Into<Field>,
        values: impl Into<Operand>,
        type_name: Option<&str>,
        operator: &str,
    ) -> Result<Self> {
        let field = field.into();
        let values = values.into();
        let base = type_name
            .map(String::from)
            .or_else(|| self.calculate_type(&field))
            .or_else(|| first_value_type(&values))
            .unwrap_or_else(|| String::from("string"));
        let type_name = if types::is_multiple(Some(&base)) {
            base
        } else {
            format!("{base}[]")
        };
        self.compare(field, values, Some(&type_name), operator)
    }

    /// Adds `field IN (values)`.
    pub fn in_list(
        self,
        field: impl Into<Field>,
        values: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        self.membership(field, values, type_name, "IN")
    }

    /// Adds `field NOT IN (values)`.
    pub fn not_in_list(
        self,
        field: impl Into<Field>,
        values: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        self.membership(field, values, type_name, "NOT IN")
    }

    /// Adds `field BETWEEN from AND to`.
    pub fn between(
        mut self,
        field: impl Into<Field>,
        from: impl Into<Operand>,
        to: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<Self> {
        let field = field.into();
        let type_name = type_name
            .map(String::from)
            .or_else(|| self.calculate_type(&field));
        let between =
            BetweenExpression::typed(field, from, to, type_name.as_deref(), &self.caster)?;
        self.conditions.push(between.into());
        Ok(self)
    }

    /// Adds `EXISTS (subquery)`.
    #[must_use]
    pub fn exists(mut self, query: impl Into<Expression>) -> Self {
        self.conditions.push(UnaryExpression::exists(query).into());
        self
    }

    /// Adds `NOT EXISTS (subquery)`.
    #[must_use]
    pub fn not_exists(mut self, query: impl Into<Expression>) -> Self {
        self.conditions.push(UnaryExpression::not_exists(query).into());
        self
    }

    /// Adds `left = right` comparing two columns.
    pub fn equal_fields(self, left: impl Into<Field>, right: impl Into<Field>) -> Result<Self> {
        let left = field_expression(left.into());
        let right = field_expression(right.into());
        self.eq(left, right, None)
    }

    /// Returns a new `AND` tree sharing this tree's typing.
    pub fn and_(&self, conditions: impl Into<Conditions>) -> Result<Self> {
        Self::from_conditions(conditions, self.type_map.clone(), self.caster.clone(), "AND")
    }

    /// Returns a new `OR` tree sharing this tree's typing.
    pub fn or_(&self, conditions: impl Into<Conditions>) -> Result<Self> {
        Self::from_conditions(conditions, self.type_map.clone(), self.caster.clone(), "OR")
    }

    /// Adds `NOT (conditions)`.
    pub fn not(mut self, conditions: impl Into<Conditions>) -> Result<Self> {
        let (items, types) = conditions.into().into_parts();
        self.append(Conditions::from(Condition::Not(items)).types(types))?;
        Ok(self)
    }

    /// Starts a searched `CASE` sharing this tree's typing.
    #[must_use]
    pub fn case(&self) -> CaseStatementExpression {
        CaseStatementExpression::new()
            .with_type_map(self.type_map.clone())
            .with_caster(self.caster.clone())
    }

    /// Starts a simple `CASE value` sharing this tree's typing.
    pub fn case_value(
        &self,
        value: impl Into<Operand>,
        type_name: Option<&str>,
    ) -> Result<CaseStatementExpression> {
        CaseStatementExpression::with_value_in(
            value,
            type_name,
            self.type_map.clone(),
            self.caster.clone(),
        )
    }

    /// Adds a completed `CASE` expression.
    pub fn add_case(mut self, case: CaseStatementExpression) -> Result<Self> {
        case.validate()?;
        self.conditions.push(Expression::try_from(case)?);
        Ok(self)
    }
}

fn field_expression(field: Field) -> Expression {
    match field {
        Field::Name(name) => Expression::identifier(name),
        Field::Expr(expr) => *expr,
    }
}

fn first_value_type(values: &Operand) -> Option<String> {
    match values {
        Operand::List(items) => items.first().and_then(Operand::inferred_type),
        Operand::Value(v) => v.inferred_type().map(String::from),
        Operand::Expr(_) => None,
    }
}

fn ends_with_negation(parts: &[String]) -> bool {
    let [.., second, last] = parts else {
        return false;
    };
    (second.eq_ignore_ascii_case("is") && last.eq_ignore_ascii_case("not"))
        || (second.eq_ignore_ascii_case("not")
            && !last.is_empty()
            && last.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    fn only_comparison(expr: &QueryExpression) -> &ComparisonExpression {
        match &expr.conditions()[0] {
            Expression::Comparison(c) => c,
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_shorthand_defaults_to_equality() {
        let expr = QueryExpression::new().add([("author_id", 1)]).unwrap();
        let cmp = only_comparison(&expr);
        assert_eq!(cmp.operator(), "=");
        assert_eq!(cmp.field().as_name(), Some("author_id"));
    }

    #[test]
    fn test_shorthand_operator_is_lowercased() {
        let expr = QueryExpression::new().add([("title LIKE", "%a%")]).unwrap();
        assert_eq!(only_comparison(&expr).operator(), "like");
    }

    #[test]
    fn test_shorthand_multi_word_operators() {
        let expr = QueryExpression::new()
            .add([("title NOT LIKE", "%a%")])
            .unwrap();
        let cmp = only_comparison(&expr);
        assert_eq!(cmp.operator(), "not like");
        assert_eq!(cmp.field().as_name(), Some("title"));

        let expr = QueryExpression::new().add([("id IS NOT", 3)]).unwrap();
        assert_eq!(only_comparison(&expr).operator(), "!=");
    }

    #[test]
    fn test_shorthand_in_switches_to_list_type() {
        let expr = QueryExpression::new().add([("id in", vec![1, 2])]).unwrap();
        let cmp = only_comparison(&expr);
        assert!(cmp.is_multiple());
        assert_eq!(cmp.type_name(), Some("string[]"));
        assert_eq!(cmp.operator(), "in");
    }

    #[test]
    fn test_multiple_typed_column_uses_in() {
        let map = TypeMap::new([("id", "integer[]")]);
        let expr = QueryExpression::with_context(map, CasterHandle::default())
            .add([("id", 5)])
            .unwrap();
        let cmp = only_comparison(&expr);
        assert_eq!(cmp.operator(), "IN");
        assert_eq!(cmp.value(), &Operand::List(vec![Operand::from(5)]));
    }

    #[test]
    fn test_is_null_shorthand() {
        let expr = QueryExpression::new()
            .add([("deleted IS", None::<i32>)])
            .unwrap();
        assert!(matches!(expr.conditions()[0], Expression::Unary(_)));
    }

    #[test]
    fn test_null_without_operator_fails() {
        let err = QueryExpression::new()
            .add([("deleted", None::<i32>)])
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::MissingOperator {
                field: String::from("deleted")
            }
        );

        let set = QueryExpression::new()
            .tie_with(",")
            .add([("deleted", None::<i32>)])
            .unwrap();
        assert_eq!(set.count(), 1);
    }

    #[test]
    fn test_empty_groups_are_skipped() {
        let expr = QueryExpression::new()
            .add([
                Condition::or(Vec::<Condition>::new()),
                Condition::not(Vec::<Condition>::new()),
                Condition::from(""),
            ])
            .unwrap();
        assert!(expr.is_empty());
    }

    #[test]
    fn test_groups_nest() {
        let expr = QueryExpression::new()
            .add([
                Condition::field("a", 1),
                Condition::or([("b", 2), ("c", 3)]),
            ])
            .unwrap();
        assert_eq!(expr.count(), 2);
        assert!(expr.has_nested_expression());
        match &expr.conditions()[1] {
            Expression::Conditions(inner) => assert_eq!(inner.conjunction(), "OR"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_types_override_is_local() {
        let map = TypeMap::new([("id", "string")]);
        let expr = QueryExpression::with_context(map, CasterHandle::default())
            .add(Conditions::from([("id", "7")]).types([("id", "integer")]))
            .unwrap();
        assert_eq!(only_comparison(&expr).value(), &Operand::from(7));
        assert_eq!(expr.type_map().type_of("id"), Some("string"));
    }

    #[test]
    fn test_helpers_use_type_map() {
        let map = TypeMap::new([("price", "float")]);
        let expr = QueryExpression::with_context(map, CasterHandle::default())
            .gt("price", "1.5", None)
            .unwrap();
        assert_eq!(
            only_comparison(&expr).value(),
            &Operand::Value(SqlValue::Float(1.5))
        );
    }

    #[test]
    fn test_in_list_infers_type_from_values() {
        let expr = QueryExpression::new()
            .in_list("id", vec![1, 2], None)
            .unwrap();
        assert_eq!(only_comparison(&expr).type_name(), Some("integer[]"));
    }

    #[test]
    fn test_and_or_return_new_trees() {
        let base = QueryExpression::new();
        let or = base.or_([("a", 1), ("b", 2)]).unwrap();
        assert_eq!(or.conjunction(), "OR");
        assert_eq!(or.count(), 2);
        assert!(base.is_empty());
    }

    #[test]
    fn test_add_case_rejects_pending_when() {
        let base = QueryExpression::new();
        let pending = base.case().when(1, None).unwrap();
        assert!(matches!(
            base.add_case(pending),
            Err(QueryError::InvalidUsage(_))
        ));
    }

    #[test]
    fn test_iterate_parts_drops_and_rewrites() {
        let mut expr = QueryExpression::new()
            .add(["a = 1", "b = 2"])
            .unwrap();
        expr.iterate_parts(|part| match part {
            Expression::Raw(sql) if sql.starts_with('a') => None,
            other => Some(other),
        });
        assert_eq!(expr.conditions(), &[Expression::raw("b = 2")]);
    }
}
