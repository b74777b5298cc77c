//! Query sources.
//!
//! A [`QuerySource`] is the immutable configuration every query starts
//! from: the traversal source name, the environment (model, options,
//! execution pipeline) and the client-side strategies. Each configuration
//! call returns a new source. The start query is built lazily, at most
//! once per source value as far as callers can observe.

use crate::environment::QueryEnvironment;
use crate::error::{QueryError, QueryResult};
use crate::execution::ExecutionPipeline;
use crate::model::GraphModel;
use crate::options::{QueryOptions, SourceSettings};
use crate::query::{Edge, Query, Vertex};
use crate::step::Step;
use crate::strategy::{QueryStrategy, StrategyPipeline};
use crate::value::{DomainObject, Value};
use once_cell::race::OnceBox;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Entry point for building queries
pub struct QuerySource {
    name: Arc<str>,
    environment: Arc<QueryEnvironment>,
    strategies: StrategyPipeline,
    excluded: BTreeSet<String>,
    start: OnceBox<Query>,
}

impl Default for QuerySource {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for QuerySource {
    /// Clones share configuration; the start query is rebuilt on demand
    fn clone(&self) -> Self {
        self.rebuild(|_| {})
    }
}

impl QuerySource {
    /// Source named `g` with the identity model and an unconfigured pipeline
    pub fn new() -> Self {
        Self {
            name: Arc::from("g"),
            environment: Arc::new(QueryEnvironment::default()),
            strategies: StrategyPipeline::new(),
            excluded: BTreeSet::new(),
            start: OnceBox::new(),
        }
    }

    fn rebuild(&self, update: impl FnOnce(&mut Parts)) -> Self {
        let mut parts = Parts {
            name: self.name.clone(),
            environment: (*self.environment).clone(),
            strategies: self.strategies.clone(),
            excluded: self.excluded.clone(),
        };
        update(&mut parts);

        Self {
            name: parts.name,
            environment: Arc::new(parts.environment),
            strategies: parts.strategies,
            excluded: parts.excluded,
            start: OnceBox::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn environment(&self) -> &Arc<QueryEnvironment> {
        &self.environment
    }

    pub fn strategies(&self) -> &StrategyPipeline {
        &self.strategies
    }

    /// Names of the strategies disabled on the server and skipped locally
    pub fn excluded_strategies(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Rename the traversal source; empty names are rejected
    pub fn use_name(&self, name: &str) -> QueryResult<Self> {
        if name.trim().is_empty() {
            return Err(QueryError::InvalidSourceName(name.to_string()));
        }
        Ok(self.rebuild(|parts| parts.name = Arc::from(name)))
    }

    pub fn use_model(&self, model: impl GraphModel + 'static) -> Self {
        let model: Arc<dyn GraphModel> = Arc::new(model);
        self.configure_model(|_| model)
    }

    pub fn configure_model(
        &self,
        configure: impl FnOnce(Arc<dyn GraphModel>) -> Arc<dyn GraphModel>,
    ) -> Self {
        self.rebuild(|parts| {
            let model = configure(parts.environment.model().clone());
            parts.environment = parts.environment.clone().with_model(model);
        })
    }

    pub fn configure_options(&self, configure: impl FnOnce(QueryOptions) -> QueryOptions) -> Self {
        self.rebuild(|parts| {
            let options = configure(parts.environment.options().clone());
            parts.environment = parts.environment.clone().with_options(options);
        })
    }

    pub fn use_execution_pipeline(&self, pipeline: ExecutionPipeline) -> Self {
        self.configure_execution_pipeline(|_| pipeline)
    }

    pub fn configure_execution_pipeline(
        &self,
        configure: impl FnOnce(ExecutionPipeline) -> ExecutionPipeline,
    ) -> Self {
        self.rebuild(|parts| {
            let pipeline = configure(parts.environment.pipeline().clone());
            parts.environment = parts.environment.clone().with_pipeline(pipeline);
        })
    }

    /// Append a strategy after those already registered
    pub fn add_strategy(&self, strategy: impl QueryStrategy + 'static) -> Self {
        self.add_strategies([Arc::new(strategy) as Arc<dyn QueryStrategy>])
    }

    pub fn add_strategies(&self, strategies: impl IntoIterator<Item = Arc<dyn QueryStrategy>>) -> Self {
        self.rebuild(|parts| {
            for strategy in strategies {
                parts.strategies = std::mem::take(&mut parts.strategies).add(strategy);
            }
        })
    }

    /// Disable strategies by name, both on the server and locally
    pub fn remove_strategies<I, S>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rebuild(|parts| parts.excluded.extend(names.into_iter().map(Into::into)))
    }

    /// Apply loaded settings on top of this source
    pub fn configure(&self, settings: &SourceSettings) -> QueryResult<Self> {
        let options = settings.options.clone();
        Ok(self
            .use_name(&settings.name)?
            .configure_options(|_| options)
            .remove_strategies(settings.exclude_strategies.iter().cloned()))
    }

    // ========================================================================
    // Start operations
    // ========================================================================

    fn start(&self) -> &Query {
        self.start.get_or_init(|| {
            let query = self.create();
            debug!(
                source = %self.name,
                steps = query.steps().len(),
                "Built start query"
            );
            Box::new(query)
        })
    }

    fn create(&self) -> Query {
        let mut query = Query::create(self.name.clone(), self.environment.clone());
        if !self.excluded.is_empty() {
            query = query.add_step(Step::without_strategies(self.excluded.iter().cloned()));
        }
        self.strategies.apply(query, &self.excluded)
    }

    pub fn v<I, V>(&self, ids: I) -> Query<Vertex>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.start().v(ids)
    }

    pub fn e<I, V>(&self, ids: I) -> Query<Edge>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.start().e(ids)
    }

    pub fn add_v(&self, vertex: DomainObject) -> Query<Vertex> {
        self.start().add_v(vertex)
    }

    pub fn add_e(&self, edge: DomainObject) -> Query<Edge> {
        self.start().add_e(edge)
    }

    pub fn inject<I, V>(&self, elements: I) -> Query
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.start().inject(elements)
    }

    /// `V(id).ofType(T).update(vertex)`
    pub fn replace_v(&self, vertex: DomainObject) -> QueryResult<Query<Vertex>> {
        let id = required_id(&vertex)?;
        Ok(self
            .v([id])
            .of_type::<Vertex>(vertex.type_name())
            .update(vertex))
    }

    /// `E(id).ofType(T).update(edge)`
    pub fn replace_e(&self, edge: DomainObject) -> QueryResult<Query<Edge>> {
        let id = required_id(&edge)?;
        Ok(self
            .e([id])
            .of_type::<Edge>(edge.type_name())
            .update(edge))
    }
}

struct Parts {
    name: Arc<str>,
    environment: QueryEnvironment,
    strategies: StrategyPipeline,
    excluded: BTreeSet<String>,
}

fn required_id(element: &DomainObject) -> QueryResult<Value> {
    element
        .id()
        .cloned()
        .ok_or_else(|| QueryError::MissingIdentifier {
            type_name: element.type_name().to_string(),
        })
}

impl fmt::Debug for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySource")
            .field("name", &self.name)
            .field("environment", &self.environment)
            .field("strategies", &self.strategies)
            .field("excluded", &self.excluded)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::SerializerBuilder;
    use crate::strategy::strategy;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn render<T>(query: &Query<T>) -> String {
        SerializerBuilder::groovy()
            .build()
            .compile(query, true)
            .unwrap()
            .query
    }

    fn marker(name: &'static str) -> impl QueryStrategy + 'static {
        strategy(name, move |q: Query| q.add_step(Step::bare(name)))
    }

    // ============================================================================
    // Configuration
    // ============================================================================

    #[test]
    fn test_default_source() {
        let g = QuerySource::new();
        assert_eq!(g.name(), "g");
        assert_eq!(render(&g.v([1i64])), "g.V(1)");
    }

    #[test]
    fn test_use_name() {
        let g = QuerySource::new();
        let a = g.use_name("a").unwrap();

        assert_eq!(g.name(), "g");
        assert_eq!(render(&a.v([1i64])), "a.V(1)");
    }

    #[test]
    fn test_use_name_rejects_empty() {
        let err = QuerySource::new().use_name("  ").unwrap_err();
        assert!(matches!(err, QueryError::InvalidSourceName(_)));
    }

    #[test]
    fn test_configuration_does_not_mutate_original() {
        let g = QuerySource::new();
        let configured = g
            .configure_options(|o| QueryOptions {
                inline_parameters: true,
                ..o
            })
            .remove_strategies(["SubgraphStrategy"])
            .add_strategy(marker("identity"));

        assert!(!g.environment().options().inline_parameters);
        assert!(g.excluded_strategies().is_empty());
        assert!(g.strategies().is_empty());
        assert!(configured.environment().options().inline_parameters);
        assert_eq!(configured.strategies().len(), 1);
    }

    #[test]
    fn test_configure_from_settings() {
        let settings = SourceSettings::from_toml_str(
            r#"
            name = "h"
            exclude_strategies = ["SubgraphStrategy"]

            [options]
            inline_parameters = true
            "#,
        )
        .unwrap();

        let h = QuerySource::new().configure(&settings).unwrap();

        assert_eq!(h.name(), "h");
        assert!(h.environment().options().inline_parameters);
        assert_eq!(
            render(&h.v([1i64])),
            "h.withoutStrategies(SubgraphStrategy).V(1)"
        );
    }

    // ============================================================================
    // Strategies and the start query
    // ============================================================================

    #[test]
    fn test_strategies_apply_in_order() {
        let g = QuerySource::new()
            .add_strategy(marker("identity"))
            .add_strategy(marker("dedup"));

        assert_eq!(render(&g.v([1i64])), "g.identity().dedup().V(1)");
    }

    #[test]
    fn test_excluded_strategy_is_skipped() {
        let g = QuerySource::new()
            .add_strategy(marker("identity"))
            .add_strategy(marker("dedup"))
            .remove_strategies(["identity"]);

        assert_eq!(
            render(&g.v([1i64])),
            "g.withoutStrategies(identity).dedup().V(1)"
        );
    }

    #[test]
    fn test_start_query_built_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let g = QuerySource::new().add_strategy(strategy("count", move |q: Query| {
            counter.fetch_add(1, Ordering::SeqCst);
            q.add_step(Step::bare("identity"))
        }));

        let a = g.v([1i64]);
        let b = g.e([2i64]);
        let c = g.inject([3i64]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(g.start().steps().shares_prefix_with(a.steps()));
        assert!(g.start().steps().shares_prefix_with(b.steps()));
        assert_eq!(c.steps().len(), 2);
    }

    #[test]
    fn test_derived_source_rebuilds_start_query() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let g = QuerySource::new().add_strategy(strategy("count", move |q: Query| {
            counter.fetch_add(1, Ordering::SeqCst);
            q
        }));

        let _ = g.v([1i64]);
        let h = g.use_name("h").unwrap();
        let _ = h.v([1i64]);
        let _ = g.v([1i64]);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_start_queries_agree() {
        let g = Arc::new(QuerySource::new().remove_strategies(["SubgraphStrategy"]));

        let queries: Vec<Query<Vertex>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let g = g.clone();
                    scope.spawn(move || g.v([1i64]))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let start = g.start();
        for query in &queries {
            assert!(start.steps().shares_prefix_with(query.steps()));
            assert_eq!(render(query), "g.withoutStrategies(SubgraphStrategy).V(1)");
        }
    }

    // ============================================================================
    // Replace operations
    // ============================================================================

    #[test]
    fn test_replace_v() {
        let person = DomainObject::new("Person").with("id", 1i64).with("name", "marko");

        let query = QuerySource::new().replace_v(person).unwrap();

        assert_eq!(
            render(&query),
            r#"g.V(1).hasLabel('Person').property("name", 'marko')"#
        );
    }

    #[test]
    fn test_replace_e_requires_id() {
        let knows = DomainObject::new("Knows").with("weight", 0.5);
        let err = QuerySource::new().replace_e(knows).unwrap_err();

        assert!(matches!(err, QueryError::MissingIdentifier { type_name } if type_name == "Knows"));
    }
}
