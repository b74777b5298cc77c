//! Execution boundary.
//!
//! The transport that talks to a graph server lives outside this crate.
//! It plugs in as a [`QueryExecutor`] and is paired with a serializer in
//! an [`ExecutionPipeline`] carried by every query's environment.

use crate::error::{QueryError, QueryResult};
use crate::query::Query;
use crate::serialize::{InvalidSerializer, QuerySerializer, SerializedQuery, UnitSerializer};
use crate::step::Step;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Stream of raw results as returned by the server
pub type ResultStream = BoxStream<'static, QueryResult<serde_json::Value>>;

/// Sends serialized queries somewhere and streams back the results
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executor name for logging
    fn name(&self) -> &str;

    async fn execute(&self, query: SerializedQuery) -> QueryResult<ResultStream>;
}

/// Placeholder executor of an unconfigured pipeline; always fails
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidExecutor;

#[async_trait]
impl QueryExecutor for InvalidExecutor {
    fn name(&self) -> &str {
        "invalid"
    }

    async fn execute(&self, _query: SerializedQuery) -> QueryResult<ResultStream> {
        Err(QueryError::UnconfiguredExecutor)
    }
}

/// Executor that never produces results
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyExecutor;

#[async_trait]
impl QueryExecutor for EmptyExecutor {
    fn name(&self) -> &str {
        "empty"
    }

    async fn execute(&self, _query: SerializedQuery) -> QueryResult<ResultStream> {
        Ok(stream::empty().boxed())
    }
}

/// Serializer and executor used to run a query
#[derive(Clone)]
pub struct ExecutionPipeline {
    serializer: Arc<dyn QuerySerializer>,
    executor: Arc<dyn QueryExecutor>,
}

impl ExecutionPipeline {
    pub fn new(serializer: Arc<dyn QuerySerializer>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            serializer,
            executor,
        }
    }

    /// Pipeline failing at the first step of every execution
    pub fn invalid() -> Self {
        Self::new(Arc::new(InvalidSerializer), Arc::new(InvalidExecutor))
    }

    /// Pipeline that accepts every query and returns nothing
    pub fn empty() -> Self {
        Self::new(Arc::new(UnitSerializer), Arc::new(EmptyExecutor))
    }

    pub fn with_serializer(self, serializer: Arc<dyn QuerySerializer>) -> Self {
        Self { serializer, ..self }
    }

    pub fn with_executor(self, executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor, ..self }
    }

    pub fn serializer(&self) -> &Arc<dyn QuerySerializer> {
        &self.serializer
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    /// Serialize `query` and hand it to the executor
    pub async fn execute(&self, query: &Query) -> QueryResult<ResultStream> {
        let serialized = self.serializer.serialize(query)?;
        debug!(
            serializer = self.serializer.name(),
            executor = self.executor.name(),
            steps = query.steps().len(),
            "Executing query"
        );
        self.executor.execute(serialized).await
    }
}

impl fmt::Debug for ExecutionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPipeline")
            .field("serializer", &self.serializer.name())
            .field("executor", &self.executor.name())
            .finish()
    }
}

impl<T> Query<T> {
    /// Run the query through its environment's pipeline
    pub async fn execute(&self) -> QueryResult<ResultStream> {
        self.environment().pipeline().execute(&self.erase()).await
    }

    /// Run the query and collect every result
    pub async fn to_vec(&self) -> QueryResult<Vec<serde_json::Value>> {
        self.execute().await?.try_collect().await
    }

    /// First result; fails with [`QueryError::EmptyResult`] when there is none
    pub async fn first(&self) -> QueryResult<serde_json::Value> {
        self.first_or_none().await?.ok_or(QueryError::EmptyResult)
    }

    /// First result, if any. The query is limited to one result first.
    pub async fn first_or_none(&self) -> QueryResult<Option<serde_json::Value>> {
        let limited: Query<T> = self.add_step(Step::limit(1));
        limited.execute().await?.try_next().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::QueryEnvironment;
    use crate::serialize::SerializerBuilder;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records what it was sent and replays canned results
    #[derive(Default)]
    struct RecordingExecutor {
        sent: Mutex<Vec<SerializedQuery>>,
        results: Vec<serde_json::Value>,
    }

    #[async_trait]
    impl QueryExecutor for RecordingExecutor {
        fn name(&self) -> &str {
            "recording"
        }

        async fn execute(&self, query: SerializedQuery) -> QueryResult<ResultStream> {
            self.sent.lock().unwrap().push(query);
            let results: Vec<QueryResult<serde_json::Value>> =
                self.results.iter().cloned().map(Ok).collect();
            Ok(stream::iter(results).boxed())
        }
    }

    fn g(pipeline: ExecutionPipeline) -> Query {
        Query::create(
            "g",
            Arc::new(QueryEnvironment::default().with_pipeline(pipeline)),
        )
    }

    fn script_of(query: &SerializedQuery) -> &str {
        match query {
            SerializedQuery::Script(rendered) => &rendered.query,
            other => panic!("expected a script, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_pipeline_fails_on_serializer() {
        let query = Query::create("g", Arc::new(QueryEnvironment::default())).v([1i64]);
        let err = query.to_vec().await.unwrap_err();
        assert!(matches!(err, QueryError::UnconfiguredSerializer));
    }

    #[tokio::test]
    async fn test_invalid_executor_fails() {
        let pipeline = ExecutionPipeline::invalid()
            .with_serializer(Arc::new(SerializerBuilder::groovy().build()));
        let err = g(pipeline).v([1i64]).to_vec().await.unwrap_err();
        assert!(matches!(err, QueryError::UnconfiguredExecutor));
    }

    #[tokio::test]
    async fn test_empty_pipeline_returns_nothing() {
        let query = g(ExecutionPipeline::empty()).v([1i64]);
        assert!(query.to_vec().await.unwrap().is_empty());
        assert!(query.first_or_none().await.unwrap().is_none());
        assert!(matches!(query.first().await, Err(QueryError::EmptyResult)));
    }

    #[tokio::test]
    async fn test_to_vec_sends_script() {
        let executor = Arc::new(RecordingExecutor {
            results: vec![json!(1), json!(2)],
            ..Default::default()
        });
        let pipeline = ExecutionPipeline::new(
            Arc::new(SerializerBuilder::groovy().build()),
            executor.clone(),
        );

        let results = g(pipeline).v([1i64]).out(["knows"]).to_vec().await.unwrap();

        assert_eq!(results, vec![json!(1), json!(2)]);
        let sent = executor.sent.lock().unwrap();
        assert_eq!(script_of(&sent[0]), "g.V(P0).out(P1)");
    }

    #[tokio::test]
    async fn test_first_appends_limit() {
        let executor = Arc::new(RecordingExecutor {
            results: vec![json!("marko")],
            ..Default::default()
        });
        let pipeline = ExecutionPipeline::new(
            Arc::new(SerializerBuilder::groovy().build()),
            executor.clone(),
        );
        let query = g(pipeline).v([1i64]);

        assert_eq!(query.first().await.unwrap(), json!("marko"));
        assert_eq!(query.steps().len(), 1);

        let sent = executor.sent.lock().unwrap();
        assert_eq!(script_of(&sent[0]), "g.V(P0).limit(P0)");
    }
}
