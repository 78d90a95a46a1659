//! SQLite dialect.

use std::sync::Arc;

use super::{listeners, Dialect, DistinctOnToGroupBy};
use crate::compiler::Events;
use crate::query::QueryKind;

/// SQLite.
///
/// Compound selects cannot be parenthesized, so set operation branches are
/// emitted bare.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn ordered_union(&self) -> bool {
        false
    }

    fn register_listeners(&self, events: &mut Events) {
        events.on_query(QueryKind::Select, Arc::new(DistinctOnToGroupBy));
        listeners::register_common(events, self.ordered_union());
    }
}
