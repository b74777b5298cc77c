//! # Trellis Query
//!
//! Immutable traversal queries and a pluggable Gremlin compiler.
//!
//! ## Overview
//!
//! - [`QuerySource`] holds the configuration queries start from and builds
//!   the start query once, running client-side strategies over it
//! - [`Query`] is a persistent step list; every builder returns a new query
//!   sharing its prefix with the receiver
//! - [`StepResolver`] maps logical members and element types to provider
//!   names through a [`GraphModel`]
//! - [`SerializerBuilder`] assembles per-type handler chains into a
//!   [`ScriptSerializer`] producing Gremlin-Groovy text and bound parameters
//! - [`ExecutionPipeline`] pairs a serializer with an externally provided
//!   [`QueryExecutor`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis_query::{QuerySource, SerializerBuilder};
//!
//! let g = QuerySource::new();
//! let query = g.v(Vec::<i64>::new()).has_key("name", "marko");
//!
//! let rendered = SerializerBuilder::groovy().build().compile(&query, false)?;
//! assert_eq!(rendered.query, r#"g.V().has("name", P0)"#);
//! ```

#![warn(clippy::all)]

pub mod environment;
pub mod error;
pub mod execution;
pub mod model;
pub mod options;
pub mod query;
pub mod resolve;
pub mod serialize;
pub mod source;
pub mod step;
pub mod strategy;
pub mod value;

pub use environment::QueryEnvironment;
pub use error::{QueryError, QueryResult};
pub use execution::{EmptyExecutor, ExecutionPipeline, InvalidExecutor, QueryExecutor, ResultStream};
pub use model::{DynamicModel, GraphModel, StaticModel};
pub use options::{QueryOptions, SourceSettings};
pub use query::{Cardinality, Edge, Query, StepLabel, Vertex};
pub use resolve::StepResolver;
pub use serialize::{
    Atom, BytecodeSerializer, Chain, QuerySerializer, QueryWriter, RenderedQuery, ScriptSerializer,
    SerializedQuery, SerializerBuilder, TypeTag,
};
pub use source::QuerySource;
pub use step::Step;
pub use strategy::{strategy, QueryStrategy, StrategyPipeline};
pub use value::{DomainObject, Expr, MemberRef, Value, ValueKind};
