//! MySQL dialect.

use std::sync::Arc;

use super::{listeners, Dialect, DistinctOnToGroupBy};
use crate::compiler::Events;
use crate::query::{ClauseName, QueryKind, SetOperator};

/// MySQL puts set operations before `LIMIT`/`OFFSET`.
const MYSQL_SELECT_ORDER: [ClauseName; 14] = [
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
    ClauseName::Union,
    ClauseName::Limit,
    ClauseName::Offset,
    ClauseName::Epilog,
];

/// MySQL / MariaDB.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlDialect;

impl MysqlDialect {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn start_quote(&self) -> &'static str {
        "`"
    }

    fn end_quote(&self) -> &'static str {
        "`"
    }

    fn select_order(&self) -> &'static [ClauseName] {
        &MYSQL_SELECT_ORDER
    }

    fn supports_set_operator(&self, operator: SetOperator) -> bool {
        operator == SetOperator::Union
    }

    fn register_listeners(&self, events: &mut Events) {
        events.on_query(QueryKind::Select, Arc::new(DistinctOnToGroupBy));
        listeners::register_common(events, self.ordered_union());
    }
}
