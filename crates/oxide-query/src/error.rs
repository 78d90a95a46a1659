//! Error types for query building and compilation.

use thiserror::Error;

/// Errors raised while building or compiling a query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The fluent API was used out of order (e.g. `then()` before `when()`).
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// A closure given to `CaseStatementExpression::when_with` returned
    /// something other than a `WhenThenExpression`.
    #[error("`when()` callables must return an instance of `WhenThenExpression`")]
    ExpectedWhenThen,

    /// A malformed argument was passed to a builder method.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A string-keyed ORDER BY entry carried something other than a direction.
    #[error(
        "passing extra expressions by associative array (`'{key}' => '{value}'`) is not \
         allowed to avoid potential SQL injection, use an expression or a positional entry"
    )]
    PossibleSqlInjection {
        /// The entry key (field).
        key: String,
        /// The offending value.
        value: String,
    },

    /// A multi-value comparison was compiled with no values.
    #[error("impossible to generate condition with empty list of values for field ({field})")]
    EmptyValueList {
        /// The compared field.
        field: String,
    },

    /// A `null` value was given without an `IS`/`IS NOT` operator.
    #[error("expression `{field}` is missing operator (IS, IS NOT) with `null` value")]
    MissingOperator {
        /// The field the condition was built for.
        field: String,
    },

    /// Page numbers start at 1.
    #[error("pages must start at 1, got {0}")]
    InvalidPage(i64),

    /// An INSERT was defined without columns.
    #[error("at least 1 column is required to perform an insert")]
    InsertWithoutColumns,

    /// An INSERT was compiled without a target table.
    #[error("could not compile insert query, no table was specified, use `into()` to define a table")]
    InsertWithoutTable,

    /// `values()` was called before `insert()` defined the columns.
    #[error("you cannot add values before defining columns to use")]
    ValuesBeforeColumns,

    /// Sub-query values and row values were mixed in one INSERT.
    #[error("you cannot mix subqueries and array values in inserts")]
    MixedInsertValues,

    /// A list value was bound where a single scalar type was declared.
    #[error("cannot bind a list of values to a single placeholder (type: {type_name})")]
    ArrayValueForScalarType {
        /// The declared type, or `none`.
        type_name: String,
    },

    /// No compiler unit is registered for the given key.
    #[error("no compiler registered for `{0}`")]
    NoCompilerForExpression(String),

    /// A compiler unit was handed a query kind or node it does not support.
    #[error("compiler `{compiler}` does not support `{kind}`")]
    UnsupportedExpressionType {
        /// The compiler unit name.
        compiler: String,
        /// The rejected kind.
        kind: String,
    },

    /// The active dialect cannot express the requested construct.
    #[error("the {dialect} dialect does not support {feature}")]
    UnsupportedFeature {
        /// Dialect name.
        dialect: String,
        /// The missing feature.
        feature: String,
    },

    /// A value could not be converted to the requested logical type.
    #[error("cannot cast value to `{type_name}`: {message}")]
    TypeCast {
        /// The logical type name.
        type_name: String,
        /// Details.
        message: String,
    },

    /// A clause name that no query defines was requested.
    #[error("the `{0}` clause is not defined")]
    UndefinedClause(String),

    /// UPDATE/DELETE alias stripping was requested on a query with joins.
    #[error(
        "aliases are being removed from conditions for UPDATE/DELETE queries, \
         this can break references to joined tables"
    )]
    UnsafeAliasRemoval,
}

impl QueryError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::InvalidUsage(message.into())
    }

    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
