//! Statement units: the clause order of each query kind.

use std::sync::Arc;

use super::{Compiler, QueryCompiler, Unit};
use crate::binder::ValueBinder;
use crate::error::Result;
use crate::query::{ClauseName, Query, QueryKind};

/// Clause order of a SELECT.
pub const SELECT_ORDER: [ClauseName; 14] = [
    ClauseName::Comment,
    ClauseName::With,
    ClauseName::Select,
    ClauseName::From,
    ClauseName::Join,
    ClauseName::Where,
    ClauseName::Group,
    ClauseName::Having,
    ClauseName::Window,
    ClauseName::Order,
    ClauseName::Limit,
    ClauseName::Offset,
    ClauseName::Union,
    ClauseName::Epilog,
];

/// Clause order of an INSERT.
pub const INSERT_ORDER: [ClauseName; 5] = [
    ClauseName::Comment,
    ClauseName::With,
    ClauseName::Insert,
    ClauseName::Values,
    ClauseName::Epilog,
];

/// Clause order of an UPDATE.
pub const UPDATE_ORDER: [ClauseName; 7] = [
    ClauseName::Comment,
    ClauseName::With,
    ClauseName::Update,
    ClauseName::Set,
    ClauseName::From,
    ClauseName::Where,
    ClauseName::Epilog,
];

/// Clause order of a DELETE.
pub const DELETE_ORDER: [ClauseName; 7] = [
    ClauseName::Comment,
    ClauseName::With,
    ClauseName::Delete,
    ClauseName::Modifier,
    ClauseName::From,
    ClauseName::Where,
    ClauseName::Epilog,
];

/// Compiles a statement by concatenating its clauses in a fixed order.
///
/// Clauses with no content are skipped.
#[derive(Debug, Clone)]
pub struct StatementCompiler {
    name: &'static str,
    kinds: Vec<QueryKind>,
    order: Vec<ClauseName>,
}

impl StatementCompiler {
    /// A unit compiling `kinds` in clause `order`.
    #[must_use]
    pub fn new(
        name: &'static str,
        kinds: impl IntoIterator<Item = QueryKind>,
        order: impl IntoIterator<Item = ClauseName>,
    ) -> Self {
        Self {
            name,
            kinds: kinds.into_iter().collect(),
            order: order.into_iter().collect(),
        }
    }

    /// The clause order.
    #[must_use]
    pub fn order(&self) -> &[ClauseName] {
        &self.order
    }
}

impl QueryCompiler for StatementCompiler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, kind: QueryKind) -> bool {
        self.kinds.contains(&kind)
    }

    fn compile(
        &self,
        query: &Query,
        compiler: &Compiler,
        binder: &mut ValueBinder,
    ) -> Result<String> {
        let mut sql = String::new();
        for &name in &self.order {
            if !query.part(name).is_compilable() {
                continue;
            }
            sql.push_str(&compiler.compile_clause(name, query, binder)?);
        }
        Ok(sql)
    }
}

pub(super) fn register(compiler: &mut Compiler) {
    let select_order = compiler.dialect().select_order().to_vec();
    let units = [
        StatementCompiler::new("select", [QueryKind::Select], select_order),
        StatementCompiler::new("insert", [QueryKind::Insert], INSERT_ORDER),
        StatementCompiler::new("update", [QueryKind::Update], UPDATE_ORDER),
        StatementCompiler::new("delete", [QueryKind::Delete], DELETE_ORDER),
    ];
    for unit in units {
        let kind = unit.kinds[0];
        compiler.add(kind, Unit::Query(Arc::new(unit)));
    }
}
