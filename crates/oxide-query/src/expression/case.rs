//! `CASE` statements.
//!
//! [`CaseStatementExpression`] enforces `when()` / `then()` pairing through
//! an explicit state: a `when()` leaves the statement pending until `then()`
//! closes it. Calling `when()`, `else_()`, `build()` or `try_clone()` while
//! pending is a usage error. Expression trees only hold the finished
//! [`CaseExpression`].

use super::{Conditions, Expression, QueryExpression};
use crate::error::{QueryError, Result};
use crate::types::{CasterHandle, TypeMap};
use crate::value::{Operand, SqlValue};

#[derive(Debug, PartialEq)]
enum PendingWhen {
    Value(Operand, Option<String>),
    Conditions(Conditions),
}

#[derive(Debug, PartialEq)]
enum CaseState {
    Idle,
    Pending(PendingWhen),
}

/// Infers the logical type of a `CASE` operand.
fn infer_type(value: &Operand, type_map: &TypeMap) -> Option<String> {
    match value {
        Operand::Value(SqlValue::Date(_) | SqlValue::DateTime(_)) => Some(String::from("datetime")),
        Operand::Value(v) => v.inferred_type().map(String::from),
        Operand::Expr(expr) => match expr.as_ref() {
            Expression::Identifier(id) => type_map.type_of(id.name()).map(String::from),
            other => other.return_type(),
        },
        Operand::List(_) => None,
    }
}

fn cast(value: Operand, type_name: Option<&str>, caster: &CasterHandle) -> Result<Operand> {
    match (&value, type_name) {
        (Operand::Value(_), Some(_)) => caster.cast_to(value, type_name),
        _ => Ok(value),
    }
}

fn reject_list(value: &Operand) -> Result<()> {
    if matches!(value, Operand::List(_)) {
        return Err(QueryError::argument(
            "CASE operands must be null, a scalar or an expression, a list was given",
        ));
    }
    Ok(())
}

/// One `WHEN condition THEN result` branch.
#[derive(Debug, Clone, PartialEq)]
pub struct WhenThenExpression {
    when: Option<Operand>,
    when_type: Option<String>,
    then: Option<Operand>,
    then_type: Option<String>,
    type_map: TypeMap,
    caster: CasterHandle,
}

impl Default for WhenThenExpression {
    fn default() -> Self {
        Self::new(TypeMap::default(), CasterHandle::default())
    }
}

impl WhenThenExpression {
    /// Creates an empty branch typed by `type_map`.
    #[must_use]
    pub fn new(type_map: TypeMap, caster: CasterHandle) -> Self {
        Self {
            when: None,
            when_type: None,
            then: None,
            then_type: None,
            type_map,
            caster,
        }
    }

    /// Sets the `WHEN` operand.
    ///
    /// The type is inferred from scalars when omitted.
    pub fn when(mut self, value: impl Into<Operand>, type_name: Option<&str>) -> Result<Self> {
        let value = value.into();
        reject_list(&value)?;
        let type_name = match type_name {
            Some(t) => Some(t.to_string()),
            None if value.as_expression().is_none() => infer_type(&value, &self.type_map),
            None => None,
        };
        self.when = Some(cast(value, type_name.as_deref(), &self.caster)?);
        self.when_type = type_name;
        Ok(self)
    }

    /// Sets the `WHEN` operand to a condition list.
    ///
    /// The conditions are typed with a copy of this branch's type map, so
    /// their type overrides never leak into the enclosing statement.
    pub fn when_conditions(mut self, conditions: impl Into<Conditions>) -> Result<Self> {
        let conditions = conditions.into();
        if conditions.is_empty() {
            return Err(QueryError::argument(
                "the `when` conditions must be a non-empty list",
            ));
        }
        let tree = QueryExpression::from_conditions(
            conditions,
            self.type_map.clone(),
            self.caster.clone(),
            "AND",
        )?;
        self.when = Some(Operand::from(tree));
        self.when_type = None;
        Ok(self)
    }

    /// Sets the `THEN` result.
    pub fn then(mut self, result: impl Into<Operand>, type_name: Option<&str>) -> Result<Self> {
        let result = result.into();
        reject_list(&result)?;
        let type_name = type_name
            .map(String::from)
            .or_else(|| infer_type(&result, &self.type_map));
        self.then = Some(cast(result, type_name.as_deref(), &self.caster)?);
        self.then_type = type_name;
        Ok(self)
    }

    /// The `WHEN` operand.
    #[must_use]
    pub const fn when_value(&self) -> Option<&Operand> {
        self.when.as_ref()
    }

    /// The `WHEN` type.
    #[must_use]
    pub fn when_type(&self) -> Option<&str> {
        self.when_type.as_deref()
    }

    /// The `THEN` result.
    #[must_use]
    pub const fn result(&self) -> Option<&Operand> {
        self.then.as_ref()
    }

    /// The `THEN` type.
    #[must_use]
    pub fn result_type(&self) -> Option<&str> {
        self.then_type.as_deref()
    }

    /// Checks the branch is complete.
    pub fn validate(&self) -> Result<()> {
        if self.when.is_none() {
            return Err(QueryError::usage(
                "case expression has incomplete when clause, missing `when()`",
            ));
        }
        if self.then.is_none() {
            return Err(QueryError::usage(
                "case expression has incomplete when clause, missing `then()` after `when()`",
            ));
        }
        Ok(())
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        out.extend(self.when.as_ref().and_then(Operand::as_expression));
        out.extend(self.then.as_ref().and_then(Operand::as_expression));
        out
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Expression> {
        let mut out = Vec::new();
        if let Some(Operand::Expr(e)) = &mut self.when {
            out.push(e.as_mut());
        }
        if let Some(Operand::Expr(e)) = &mut self.then {
            out.push(e.as_mut());
        }
        out
    }
}

/// A complete simple (`CASE value WHEN ...`) or searched (`CASE WHEN ...`)
/// statement, as stored in an expression tree.
///
/// Built by [`CaseStatementExpression::build`], so a tree never holds a
/// `when()` still waiting for its `then()`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpression {
    value: Option<Operand>,
    value_type: Option<String>,
    simple: bool,
    whens: Vec<Expression>,
    else_value: Option<Operand>,
    else_type: Option<String>,
    return_type: Option<String>,
}

impl CaseExpression {
    const fn empty() -> Self {
        Self {
            value: None,
            value_type: None,
            simple: false,
            whens: Vec::new(),
            else_value: None,
            else_type: None,
            return_type: None,
        }
    }

    /// The return type.
    ///
    /// An explicit override wins. Otherwise, when every typed branch result
    /// and the `ELSE` share one type, that type is returned, else `string`.
    #[must_use]
    pub fn return_type(&self) -> String {
        if let Some(t) = &self.return_type {
            return t.clone();
        }
        let mut types: Vec<&str> = self
            .when_thens()
            .filter_map(WhenThenExpression::result_type)
            .collect();
        types.extend(self.else_type.as_deref());
        types.sort_unstable();
        types.dedup();
        match types.as_slice() {
            [only] => (*only).to_string(),
            _ => String::from("string"),
        }
    }

    /// Returns `true` for `CASE value WHEN ...`.
    #[must_use]
    pub const fn is_simple(&self) -> bool {
        self.simple
    }

    /// The simple-case discriminant.
    #[must_use]
    pub const fn value(&self) -> Option<&Operand> {
        self.value.as_ref()
    }

    /// The discriminant type.
    #[must_use]
    pub fn value_type(&self) -> Option<&str> {
        self.value_type.as_deref()
    }

    /// The branches.
    pub fn when_thens(&self) -> impl Iterator<Item = &WhenThenExpression> {
        self.whens.iter().filter_map(|e| match e {
            Expression::WhenThen(w) => Some(w),
            _ => None,
        })
    }

    pub(crate) fn when_nodes(&self) -> &[Expression] {
        &self.whens
    }

    /// The `ELSE` result.
    #[must_use]
    pub const fn else_value(&self) -> Option<&Operand> {
        self.else_value.as_ref()
    }

    /// The `ELSE` type.
    #[must_use]
    pub fn else_type(&self) -> Option<&str> {
        self.else_type.as_deref()
    }

    /// Checks the statement can be compiled.
    pub fn validate(&self) -> Result<()> {
        if self.whens.is_empty() {
            return Err(QueryError::usage(
                "case expression must have at least one when statement",
            ));
        }
        Ok(())
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        out.extend(self.value.as_ref().and_then(Operand::as_expression));
        out.extend(self.whens.iter());
        out.extend(self.else_value.as_ref().and_then(Operand::as_expression));
        out
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Expression> {
        let mut out = Vec::new();
        if let Some(Operand::Expr(e)) = &mut self.value {
            out.push(e.as_mut());
        }
        out.extend(self.whens.iter_mut());
        if let Some(Operand::Expr(e)) = &mut self.else_value {
            out.push(e.as_mut());
        }
        out
    }
}

/// Builds a [`CaseExpression`].
///
/// The builder is not `Clone`: a pending `when()` cannot be duplicated, and
/// [`Self::try_clone`] refuses while one is open. It enters an expression
/// tree only through [`Self::build`] (or `Expression::try_from`), which
/// refuses the same way.
#[derive(Debug, PartialEq)]
pub struct CaseStatementExpression {
    case: CaseExpression,
    state: CaseState,
    type_map: TypeMap,
    caster: CasterHandle,
}

impl Default for CaseStatementExpression {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseStatementExpression {
    /// A searched `CASE` statement.
    #[must_use]
    pub fn new() -> Self {
        Self {
            case: CaseExpression::empty(),
            state: CaseState::Idle,
            type_map: TypeMap::default(),
            caster: CasterHandle::default(),
        }
    }

    /// A simple `CASE value` statement.
    ///
    /// Without an explicit type, the type of a scalar value is inferred.
    pub fn with_value(value: impl Into<Operand>, type_name: Option<&str>) -> Result<Self> {
        Self::with_value_in(value, type_name, TypeMap::default(), CasterHandle::default())
    }

    pub(crate) fn with_value_in(
        value: impl Into<Operand>,
        type_name: Option<&str>,
        type_map: TypeMap,
        caster: CasterHandle,
    ) -> Result<Self> {
        let value = value.into();
        reject_list(&value)?;
        let value_type = match type_name {
            Some(t) => Some(t.to_string()),
            None if value.is_null() || value.as_expression().is_some() => None,
            None => infer_type(&value, &type_map),
        };
        let value = cast(value, value_type.as_deref(), &caster)?;
        let mut builder = Self::new().with_type_map(type_map).with_caster(caster);
        builder.case.value = Some(value);
        builder.case.value_type = value_type;
        builder.case.simple = true;
        Ok(builder)
    }

    /// Sets the type map used to infer and type branch values.
    #[must_use]
    pub fn with_type_map(mut self, type_map: TypeMap) -> Self {
        self.type_map = type_map;
        self
    }

    /// Sets the caster.
    #[must_use]
    pub fn with_caster(mut self, caster: CasterHandle) -> Self {
        self.caster = caster;
        self
    }

    fn ensure_idle(&self, call: &str) -> Result<()> {
        match self.state {
            CaseState::Idle => Ok(()),
            CaseState::Pending(_) => Err(QueryError::usage(format!(
                "cannot call `{call}()` between `when()` and `then()`"
            ))),
        }
    }

    fn branch(&self) -> WhenThenExpression {
        WhenThenExpression::new(self.type_map.clone(), self.caster.clone())
    }

    /// Opens a `WHEN` branch; it must be closed by [`Self::then`].
    pub fn when(mut self, value: impl Into<Operand>, type_name: Option<&str>) -> Result<Self> {
        self.ensure_idle("when")?;
        self.state = CaseState::Pending(PendingWhen::Value(
            value.into(),
            type_name.map(String::from),
        ));
        Ok(self)
    }

    /// Opens a `WHEN` branch on a condition list.
    pub fn when_conditions(mut self, conditions: impl Into<Conditions>) -> Result<Self> {
        self.ensure_idle("when")?;
        self.state = CaseState::Pending(PendingWhen::Conditions(conditions.into()));
        Ok(self)
    }

    /// Adds a branch built by `build`.
    ///
    /// The closure receives a fresh branch seeded with this statement's type
    /// map and must return a [`WhenThenExpression`].
    pub fn when_with<F>(mut self, build: F) -> Result<Self>
    where
        F: FnOnce(WhenThenExpression) -> Result<Expression>,
    {
        self.ensure_idle("when")?;
        match build(self.branch())? {
            Expression::WhenThen(branch) => {
                self.case.whens.push(Expression::WhenThen(branch));
                Ok(self)
            }
            _ => Err(QueryError::ExpectedWhenThen),
        }
    }

    /// Adds a complete branch.
    pub fn add_when_then(mut self, branch: WhenThenExpression) -> Result<Self> {
        self.ensure_idle("when")?;
        self.case.whens.push(Expression::WhenThen(branch));
        Ok(self)
    }

    /// Closes the pending `WHEN` branch with its result.
    pub fn then(mut self, result: impl Into<Operand>, type_name: Option<&str>) -> Result<Self> {
        let CaseState::Pending(pending) = std::mem::replace(&mut self.state, CaseState::Idle)
        else {
            return Err(QueryError::usage("cannot call `then()` before `when()`"));
        };
        let branch = match pending {
            PendingWhen::Value(value, when_type) => {
                self.branch().when(value, when_type.as_deref())?
            }
            PendingWhen::Conditions(conditions) => self.branch().when_conditions(conditions)?,
        };
        let branch = branch.then(result, type_name)?;
        self.case.whens.push(Expression::WhenThen(branch));
        Ok(self)
    }

    /// Sets the `ELSE` result; `NULL` is emitted when never set.
    pub fn else_(mut self, result: impl Into<Operand>, type_name: Option<&str>) -> Result<Self> {
        self.ensure_idle("else")?;
        let result = result.into();
        reject_list(&result)?;
        let type_name = type_name
            .map(String::from)
            .or_else(|| infer_type(&result, &self.type_map));
        self.case.else_value = Some(cast(result, type_name.as_deref(), &self.caster)?);
        self.case.else_type = type_name;
        Ok(self)
    }

    /// Overrides the return type.
    #[must_use]
    pub fn set_return_type(mut self, type_name: impl Into<String>) -> Self {
        self.case.return_type = Some(type_name.into());
        self
    }

    /// The return type of the branches closed so far.
    #[must_use]
    pub fn return_type(&self) -> String {
        self.case.return_type()
    }

    /// Returns `true` for `CASE value WHEN ...`.
    #[must_use]
    pub const fn is_simple(&self) -> bool {
        self.case.simple
    }

    /// Returns `true` while a `when()` awaits its `then()`.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.state, CaseState::Pending(_))
    }

    /// The discriminant type.
    #[must_use]
    pub fn value_type(&self) -> Option<&str> {
        self.case.value_type()
    }

    /// The completed branches.
    pub fn when_thens(&self) -> impl Iterator<Item = &WhenThenExpression> {
        self.case.when_thens()
    }

    fn ensure_complete(&self) -> Result<()> {
        if self.is_pending() {
            return Err(QueryError::usage(
                "case expression has incomplete when clause, missing `then()` after `when()`",
            ));
        }
        Ok(())
    }

    /// Checks the statement can be built and compiled.
    pub fn validate(&self) -> Result<()> {
        self.ensure_complete()?;
        self.case.validate()
    }

    /// Clones the builder, refusing while a `when()` is pending.
    pub fn try_clone(&self) -> Result<Self> {
        self.ensure_complete()?;
        Ok(Self {
            case: self.case.clone(),
            state: CaseState::Idle,
            type_map: self.type_map.clone(),
            caster: self.caster.clone(),
        })
    }

    /// Finishes the statement, refusing while a `when()` is pending.
    pub fn build(self) -> Result<CaseExpression> {
        self.ensure_complete()?;
        Ok(self.case)
    }
}

impl TryFrom<CaseStatementExpression> for Expression {
    type Error = QueryError;

    fn try_from(builder: CaseStatementExpression) -> Result<Self> {
        builder.build().map(Self::Case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_when_when_fails() {
        let err = CaseStatementExpression::new()
            .when(1, None)
            .unwrap()
            .when(2, None)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidUsage(_)));
    }

    #[test]
    fn test_then_without_when_fails() {
        let err = CaseStatementExpression::new()
            .then("x", None)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidUsage(_)));
    }

    #[test]
    fn test_else_while_pending_fails() {
        let err = CaseStatementExpression::new()
            .when(1, None)
            .unwrap()
            .else_("x", None)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidUsage(_)));
    }

    #[test]
    fn test_try_clone_while_pending_fails() {
        let case = CaseStatementExpression::new().when(1, None).unwrap();
        assert!(case.try_clone().is_err());
        assert!(case.validate().is_err());
    }

    #[test]
    fn test_build_while_pending_fails() {
        let case = CaseStatementExpression::new().when(1, None).unwrap();
        assert!(matches!(case.build(), Err(QueryError::InvalidUsage(_))));

        let pending = CaseStatementExpression::new().when(1, None).unwrap();
        assert!(matches!(
            Expression::try_from(pending),
            Err(QueryError::InvalidUsage(_))
        ));
    }

    #[test]
    fn test_try_clone_of_complete_statement() {
        let case = CaseStatementExpression::new()
            .when(1, None)
            .unwrap()
            .then("one", None)
            .unwrap();
        let copy = case.try_clone().unwrap();
        assert_eq!(copy, case);
        assert!(!copy.is_pending());
    }

    #[test]
    fn test_when_with_requires_when_then() {
        let err = CaseStatementExpression::new()
            .when_with(|_| Ok(Expression::raw("1 = 1")))
            .unwrap_err();
        assert_eq!(err, QueryError::ExpectedWhenThen);

        let case = CaseStatementExpression::new()
            .when_with(|w| Ok(w.when(1, None)?.then("one", None)?.into()))
            .unwrap();
        assert_eq!(case.when_thens().count(), 1);
    }

    #[test]
    fn test_return_type_common_or_string() {
        let same = CaseStatementExpression::new()
            .when(1, None)
            .unwrap()
            .then(10, None)
            .unwrap()
            .else_(20, None)
            .unwrap();
        assert_eq!(same.return_type(), "integer");

        let mixed = same.try_clone().unwrap().else_("x", None).unwrap();
        assert_eq!(mixed.return_type(), "string");

        let forced = mixed.set_return_type("float");
        assert_eq!(forced.return_type(), "float");
    }

    #[test]
    fn test_simple_case_infers_value_type() {
        let case = CaseStatementExpression::with_value(3, None).unwrap();
        assert!(case.is_simple());
        assert_eq!(case.value_type(), Some("integer"));

        let searched = CaseStatementExpression::new();
        assert!(!searched.is_simple());
    }

    #[test]
    fn test_identifier_type_comes_from_type_map() {
        let map = TypeMap::new([("price", "float")]);
        let case = CaseStatementExpression::new()
            .with_type_map(map)
            .when(1, None)
            .unwrap()
            .then(Expression::identifier("price"), None)
            .unwrap();
        let branch = case.when_thens().next().unwrap();
        assert_eq!(branch.result_type(), Some("float"));
    }

    #[test]
    fn test_when_conditions_must_not_be_empty() {
        let err = WhenThenExpression::default()
            .when_conditions(Conditions::new())
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }

    #[test]
    fn test_when_condition_types_stay_local() {
        let map = TypeMap::new([("a", "string")]);
        let case = CaseStatementExpression::new()
            .with_type_map(map.clone())
            .when_conditions(Conditions::from([("a", "1")]).types([("a", "integer")]))
            .unwrap()
            .then(1, None)
            .unwrap();
        assert_eq!(case.type_map, map);
    }

    #[test]
    fn test_children_visit_branches() {
        let case = CaseStatementExpression::with_value(Expression::identifier("x"), None)
            .unwrap()
            .when(1, None)
            .unwrap()
            .then(Expression::identifier("y"), None)
            .unwrap();
        let tree = Expression::try_from(case).unwrap();
        let mut count = 0;
        tree.traverse(&mut |_| count += 1);
        // value, branch, branch result
        assert_eq!(count, 3);
    }
}
