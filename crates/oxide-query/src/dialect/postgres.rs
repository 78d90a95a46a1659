//! PostgreSQL dialect.

use std::sync::Arc;

use super::{listeners, Dialect, HavingAliasRewriter, InsertReturning};
use crate::compiler::Events;
use crate::query::{ClauseName, QueryKind};

/// PostgreSQL.
///
/// Select aliases are always quoted, since unquoted aliases are folded to
/// lower case. HAVING cannot reference them, so aliased function calls are
/// inlined there.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quotes_select_aliases(&self) -> bool {
        true
    }

    fn register_listeners(&self, events: &mut Events) {
        events.on_query(QueryKind::Insert, Arc::new(InsertReturning));
        listeners::register_common(events, self.ordered_union());
        events.on_clause(
            QueryKind::Select,
            ClauseName::Having,
            Arc::new(HavingAliasRewriter),
        );
    }
}
