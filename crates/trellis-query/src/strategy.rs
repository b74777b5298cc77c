//! Client-side query strategies.
//!
//! A strategy is a pure `Query -> Query` rewrite applied once when a query
//! source builds its start query. Strategies run in registration order;
//! nothing reorders them, so a strategy depending on another's effect has
//! to be registered after it.

use crate::query::Query;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Rewrite applied to the start query of a query source
pub trait QueryStrategy: Send + Sync {
    /// Name used for exclusion
    fn name(&self) -> &str;

    fn apply(&self, query: Query) -> Query;
}

/// Strategy backed by a closure
pub struct FnStrategy<F> {
    name: String,
    apply: F,
}

impl<F> QueryStrategy for FnStrategy<F>
where
    F: Fn(Query) -> Query + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, query: Query) -> Query {
        (self.apply)(query)
    }
}

/// Wrap a closure as a named strategy
pub fn strategy<F>(name: impl Into<String>, apply: F) -> FnStrategy<F>
where
    F: Fn(Query) -> Query + Send + Sync,
{
    FnStrategy {
        name: name.into(),
        apply,
    }
}

/// Ordered list of strategies
#[derive(Clone, Default)]
pub struct StrategyPipeline {
    strategies: Vec<Arc<dyn QueryStrategy>>,
}

impl StrategyPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy after the ones already registered
    pub fn add(mut self, strategy: Arc<dyn QueryStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy names in application order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.iter().map(|s| s.name())
    }

    /// Fold `query` through every strategy not named in `excluded`
    pub fn apply(&self, query: Query, excluded: &BTreeSet<String>) -> Query {
        self.strategies.iter().fold(query, |query, strategy| {
            if excluded.contains(strategy.name()) {
                debug!(strategy = strategy.name(), "Skipping excluded strategy");
                return query;
            }

            debug!(strategy = strategy.name(), "Applying strategy");
            strategy.apply(query)
        })
    }
}

impl fmt::Debug for StrategyPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
