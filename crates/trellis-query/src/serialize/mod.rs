//! Query serialization.
//!
//! A [`QuerySerializer`] turns a query into the artifact an executor sends
//! to the server. Two backends ship:
//!
//! - [`ScriptSerializer`]: Gremlin-Groovy text plus bound parameters,
//!   built from a [`SerializerBuilder`] whose per-type handler chains let
//!   providers rewrite individual steps and values
//! - [`BytecodeSerializer`]: GraphSON-shaped instruction lists
//!
//! ```ignore
//! let serializer = SerializerBuilder::groovy()
//!     .override_step("skip", |step, w, chain| {
//!         let n = step.integer_at(0).unwrap_or_default();
//!         chain.recurse(&Step::range(n, -1), w)
//!     })
//!     .build();
//!
//! let rendered = serializer.compile(&query, false)?;
//! ```

mod builder;
mod bytecode;
mod cache;
mod defaults;
mod encode;
mod script;
mod writer;

pub use builder::{Atom, Handler, SerializerBuilder, TypeTag};
pub use bytecode::{Argument, Bytecode, BytecodeSerializer, Instruction};
pub use cache::ParameterCache;
pub use script::{Chain, ScriptSerializer, MAX_DISPATCH_NESTING, MAX_RECURSION_DEPTH};
pub use writer::QueryWriter;

use crate::error::{QueryError, QueryResult};
use crate::query::Query;
use std::collections::HashMap;

/// Compiled script text with its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    /// Script text
    pub query: String,
    /// Bound parameter values by name (`P0`, `P1`, …)
    pub params: HashMap<String, serde_json::Value>,
}

/// Artifact produced by a [`QuerySerializer`]
#[derive(Debug, Clone, PartialEq)]
pub enum SerializedQuery {
    /// Nothing to send
    Unit,
    Script(RenderedQuery),
    Bytecode(Bytecode),
}

/// Turns queries into executor input
pub trait QuerySerializer: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    fn serialize(&self, query: &Query) -> QueryResult<SerializedQuery>;
}

/// Placeholder serializer of an unconfigured pipeline; always fails
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidSerializer;

impl QuerySerializer for InvalidSerializer {
    fn name(&self) -> &str {
        "invalid"
    }

    fn serialize(&self, _query: &Query) -> QueryResult<SerializedQuery> {
        Err(QueryError::UnconfiguredSerializer)
    }
}

/// Serializer producing [`SerializedQuery::Unit`] for every query
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitSerializer;

impl QuerySerializer for UnitSerializer {
    fn name(&self) -> &str {
        "unit"
    }

    fn serialize(&self, _query: &Query) -> QueryResult<SerializedQuery> {
        Ok(SerializedQuery::Unit)
    }
}
