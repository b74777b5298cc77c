//! Script backend: handler dispatch over a query's atoms.

use super::builder::{Atom, HandlerLayer, HandlerTable};
use super::encode;
use super::writer::QueryWriter;
use super::{QuerySerializer, RenderedQuery, SerializedQuery};
use crate::error::{QueryError, QueryResult};
use crate::query::Query;
use crate::value::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Bound on nested [`Chain::recurse`] calls within one dispatch
pub const MAX_RECURSION_DEPTH: usize = 64;

/// Bound on nested dispatches of any kind, children included
pub const MAX_DISPATCH_NESTING: usize = 256;

/// Immutable Gremlin-Groovy serializer built by a
/// [`SerializerBuilder`](super::SerializerBuilder).
///
/// Cheap to clone; the handler table is shared. One instance may compile
/// any number of queries concurrently since each pass owns its own
/// [`QueryWriter`].
#[derive(Clone)]
pub struct ScriptSerializer {
    handlers: Arc<HandlerTable>,
}

impl ScriptSerializer {
    pub(crate) fn new(handlers: HandlerTable) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }

    /// Compile `query` into script text plus bound parameters.
    ///
    /// With `inline_parameters` every literal is embedded in the text and
    /// `params` stays empty. On error nothing is returned.
    pub fn compile<T>(&self, query: &Query<T>, inline_parameters: bool) -> QueryResult<RenderedQuery> {
        let mut writer = QueryWriter::new(inline_parameters, query.environment().options().clone());
        let root = Value::Query(query.erase());

        self.dispatch(Atom::Value(&root), &mut writer, 0, 0)?;

        let rendered = writer.finish();
        debug!(
            steps = query.steps().len(),
            params = rendered.params.len(),
            inline = inline_parameters,
            "Compiled query"
        );
        Ok(rendered)
    }

    fn top_layer(&self, atom: Atom<'_>) -> Option<&HandlerLayer> {
        let layer = match atom {
            Atom::Step(step) => self.handlers.steps.get(step.name()),
            Atom::Value(value) => self.handlers.values.get(&value.kind()),
        };
        layer.map(|layer| layer.as_ref())
    }

    fn dispatch(
        &self,
        atom: Atom<'_>,
        writer: &mut QueryWriter,
        depth: usize,
        nesting: usize,
    ) -> QueryResult<()> {
        if nesting > MAX_DISPATCH_NESTING {
            return Err(QueryError::SerializationLoop { depth: nesting });
        }

        Chain {
            serializer: self,
            layer: self.top_layer(atom),
            depth,
            nesting,
        }
        .proceed(atom, writer)
    }
}

impl QuerySerializer for ScriptSerializer {
    fn name(&self) -> &str {
        "groovy"
    }

    fn serialize(&self, query: &Query) -> QueryResult<SerializedQuery> {
        let inline = query.environment().options().inline_parameters;
        Ok(SerializedQuery::Script(self.compile(query, inline)?))
    }
}

/// Position of a handler within its chain, handed to the handler.
#[derive(Clone, Copy)]
pub struct Chain<'a> {
    serializer: &'a ScriptSerializer,
    layer: Option<&'a HandlerLayer>,
    depth: usize,
    nesting: usize,
}

impl<'a> Chain<'a> {
    fn proceed(&self, atom: Atom<'_>, writer: &mut QueryWriter) -> QueryResult<()> {
        match self.layer {
            Some(layer) => {
                let below = Chain {
                    layer: layer.below.as_deref(),
                    ..*self
                };
                (layer.handler)(atom, writer, &below)
            }
            None => encode::encode(atom, writer, self),
        }
    }

    /// Hand `atom` to the handler this one was layered on top of
    pub fn overridden<'b>(&self, atom: impl Into<Atom<'b>>, writer: &mut QueryWriter) -> QueryResult<()> {
        self.proceed(atom.into(), writer)
    }

    /// Restart full dispatch with a substitute atom
    pub fn recurse<'b>(&self, atom: impl Into<Atom<'b>>, writer: &mut QueryWriter) -> QueryResult<()> {
        let depth = self.depth + 1;
        if depth > MAX_RECURSION_DEPTH {
            return Err(QueryError::SerializationLoop { depth });
        }

        let atom = atom.into();
        trace!(tag = ?atom.type_tag(), depth, "Recursing into substitute");
        self.serializer.dispatch(atom, writer, depth, self.nesting + 1)
    }

    /// Dispatch a child atom, such as a step parameter, from the top of its chain.
    ///
    /// Keeps the substitution depth but still counts towards
    /// [`MAX_DISPATCH_NESTING`], so a handler re-dispatching its own atom
    /// fails instead of looping.
    pub fn dispatch<'b>(&self, atom: impl Into<Atom<'b>>, writer: &mut QueryWriter) -> QueryResult<()> {
        self.serializer
            .dispatch(atom.into(), writer, self.depth, self.nesting + 1)
    }

    /// Number of substitutions leading to the current atom
    pub fn depth(&self) -> usize {
        self.depth
    }
}
