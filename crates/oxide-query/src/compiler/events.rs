//! Compilation hooks.
//!
//! Dialects register listeners that run around query and clause
//! compilation. Query listeners see a private copy of the query before it is
//! compiled and may rewrite it, then may rewrite the final SQL. Clause
//! listeners may replace a clause's SQL outright or post-process it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Compiler;
use crate::binder::ValueBinder;
use crate::error::Result;
use crate::query::{ClauseName, Query, QueryKind};

/// Hooks around the compilation of a whole query.
pub trait QueryListener: Send + Sync {
    /// Listener name, used in logs.
    fn name(&self) -> &'static str;

    /// Rewrites the working copy of the query before compilation.
    fn before_compile(&self, _query: &mut Query, _compiler: &Compiler) -> Result<()> {
        Ok(())
    }

    /// Rewrites the SQL produced for `query`.
    fn after_compile(&self, _query: &Query, sql: String) -> Result<String> {
        Ok(sql)
    }
}

/// What a clause listener gets to look at.
pub struct ClauseContext<'a> {
    pub clause: ClauseName,
    pub query: &'a Query,
    pub compiler: &'a Compiler,
    pub binder: &'a mut ValueBinder,
}

/// Hooks around the compilation of one clause.
pub trait ClauseListener: Send + Sync {
    /// Listener name, used in logs.
    fn name(&self) -> &'static str;

    /// Returns replacement SQL for the clause, or `None` to compile it
    /// normally.
    fn before_clause(&self, _ctx: &mut ClauseContext<'_>) -> Result<Option<String>> {
        Ok(None)
    }

    /// Rewrites the SQL produced for the clause.
    fn after_clause(&self, _ctx: &mut ClauseContext<'_>, sql: String) -> Result<String> {
        Ok(sql)
    }
}

/// Listeners keyed by query kind and clause.
#[derive(Clone, Default)]
pub struct Events {
    query: HashMap<QueryKind, Vec<Arc<dyn QueryListener>>>,
    clause: HashMap<(QueryKind, ClauseName), Vec<Arc<dyn ClauseListener>>>,
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |listeners: &[Arc<dyn QueryListener>]| {
            listeners.iter().map(|l| l.name()).collect::<Vec<_>>()
        };
        f.debug_struct("Events")
            .field(
                "query",
                &self
                    .query
                    .iter()
                    .map(|(k, v)| (k.as_str(), names(v.as_slice())))
                    .collect::<HashMap<_, _>>(),
            )
            .field("clause", &self.clause.len())
            .finish()
    }
}

impl Events {
    /// Registers a query listener for `kind`.
    pub fn on_query(&mut self, kind: QueryKind, listener: Arc<dyn QueryListener>) -> &mut Self {
        self.query.entry(kind).or_default().push(listener);
        self
    }

    /// Registers a clause listener for `clause` in queries of `kind`.
    pub fn on_clause(
        &mut self,
        kind: QueryKind,
        clause: ClauseName,
        listener: Arc<dyn ClauseListener>,
    ) -> &mut Self {
        self.clause.entry((kind, clause)).or_default().push(listener);
        self
    }

    /// Drops every listener.
    pub fn clear(&mut self) {
        self.query.clear();
        self.clause.clear();
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.query.values().map(Vec::len).sum::<usize>()
            + self.clause.values().map(Vec::len).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn query_listeners(&self, kind: QueryKind) -> &[Arc<dyn QueryListener>] {
        self.query.get(&kind).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn clause_listeners(
        &self,
        kind: QueryKind,
        clause: ClauseName,
    ) -> &[Arc<dyn ClauseListener>] {
        self.clause.get(&(kind, clause)).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl QueryListener for Noop {
        fn name(&self) -> &'static str {
            "noop"
        }
    }

    impl ClauseListener for Noop {
        fn name(&self) -> &'static str {
            "noop"
        }
    }

    #[test]
    fn test_listeners_are_keyed_by_kind() {
        let mut events = Events::default();
        events
            .on_query(QueryKind::Select, Arc::new(Noop))
            .on_clause(QueryKind::Update, ClauseName::Where, Arc::new(Noop));

        assert_eq!(events.len(), 2);
        assert_eq!(events.query_listeners(QueryKind::Select).len(), 1);
        assert!(events.query_listeners(QueryKind::Insert).is_empty());
        assert_eq!(
            events
                .clause_listeners(QueryKind::Update, ClauseName::Where)
                .len(),
            1
        );
        assert!(events
            .clause_listeners(QueryKind::Delete, ClauseName::Where)
            .is_empty());

        events.clear();
        assert!(events.is_empty());
    }
}
