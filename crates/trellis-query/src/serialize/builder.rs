//! Handler chain registration.
//!
//! Handlers are keyed by [`TypeTag`]: steps by name, values by kind. Each
//! tag holds exactly one chain. Registering a handler for a tag that
//! already has one layers the new handler on top, and the old chain
//! becomes what the new handler reaches through [`Chain::overridden`].
//! Below the lowest layer sits the generic encoder, so a builder without
//! any handlers still produces valid output.

use super::defaults;
use super::script::{Chain, ScriptSerializer};
use super::writer::QueryWriter;
use crate::error::QueryResult;
use crate::step::Step;
use crate::value::{Value, ValueKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Unit of dispatch: a step or a value
#[derive(Debug, Clone, Copy)]
pub enum Atom<'a> {
    Step(&'a Step),
    Value(&'a Value),
}

impl<'a> Atom<'a> {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Atom::Step(step) => TypeTag::step(step.name()),
            Atom::Value(value) => TypeTag::Value(value.kind()),
        }
    }
}

impl<'a> From<&'a Step> for Atom<'a> {
    fn from(step: &'a Step) -> Self {
        Atom::Step(step)
    }
}

impl<'a> From<&'a Value> for Atom<'a> {
    fn from(value: &'a Value) -> Self {
        Atom::Value(value)
    }
}

/// Key of a handler chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Steps with this name
    Step(String),
    /// Values of this kind
    Value(ValueKind),
}

impl TypeTag {
    pub fn step(name: impl Into<String>) -> Self {
        TypeTag::Step(name.into())
    }
}

impl From<ValueKind> for TypeTag {
    fn from(kind: ValueKind) -> Self {
        TypeTag::Value(kind)
    }
}

/// Serialization handler.
///
/// Receives the atom, the pass output and the rest of its chain. It may
/// write output and return, defer to the layer below with
/// [`Chain::overridden`], or substitute another atom with
/// [`Chain::recurse`].
pub type Handler =
    Arc<dyn Fn(Atom<'_>, &mut QueryWriter, &Chain<'_>) -> QueryResult<()> + Send + Sync>;

pub(crate) struct HandlerLayer {
    pub(crate) handler: Handler,
    pub(crate) below: Option<Arc<HandlerLayer>>,
}

impl HandlerLayer {
    fn depth(&self) -> usize {
        1 + self.below.as_ref().map_or(0, |below| below.depth())
    }
}

#[derive(Clone, Default)]
pub(crate) struct HandlerTable {
    pub(crate) steps: HashMap<String, Arc<HandlerLayer>>,
    pub(crate) values: HashMap<ValueKind, Arc<HandlerLayer>>,
}

/// Builder assembling handler chains into a [`ScriptSerializer`]
#[derive(Clone, Default)]
pub struct SerializerBuilder {
    table: HandlerTable,
}

impl SerializerBuilder {
    /// Builder with no handlers; everything goes to the generic encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with the default Gremlin handler set
    pub fn groovy() -> Self {
        Self::new().use_default_handlers()
    }

    /// Layer the default Gremlin handler set onto this builder
    pub fn use_default_handlers(self) -> Self {
        defaults::register(self)
    }

    /// Layer `handler` on top of whatever is registered for `tag`
    pub fn override_handler<F>(mut self, tag: TypeTag, handler: F) -> Self
    where
        F: Fn(Atom<'_>, &mut QueryWriter, &Chain<'_>) -> QueryResult<()> + Send + Sync + 'static,
    {
        let slot = match &tag {
            TypeTag::Step(name) => self.table.steps.remove(name),
            TypeTag::Value(kind) => self.table.values.remove(kind),
        };
        let layer = Arc::new(HandlerLayer {
            handler: Arc::new(handler),
            below: slot,
        });
        trace!(?tag, depth = layer.depth(), "Registered serialization handler");

        match tag {
            TypeTag::Step(name) => {
                self.table.steps.insert(name, layer);
            }
            TypeTag::Value(kind) => {
                self.table.values.insert(kind, layer);
            }
        }
        self
    }

    /// Layer a handler for steps named `name`
    pub fn override_step<F>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&Step, &mut QueryWriter, &Chain<'_>) -> QueryResult<()> + Send + Sync + 'static,
    {
        self.override_handler(TypeTag::step(name), move |atom, writer, chain| match atom {
            Atom::Step(step) => handler(step, writer, chain),
            other => chain.overridden(other, writer),
        })
    }

    /// Layer a handler for values of `kind`
    pub fn override_value<F>(self, kind: ValueKind, handler: F) -> Self
    where
        F: Fn(&Value, &mut QueryWriter, &Chain<'_>) -> QueryResult<()> + Send + Sync + 'static,
    {
        self.override_handler(TypeTag::Value(kind), move |atom, writer, chain| match atom {
            Atom::Value(value) => handler(value, writer, chain),
            other => chain.overridden(other, writer),
        })
    }

    /// Number of handlers layered for `tag`
    pub fn layers(&self, tag: &TypeTag) -> usize {
        let layer = match tag {
            TypeTag::Step(name) => self.table.steps.get(name),
            TypeTag::Value(kind) => self.table.values.get(kind),
        };
        layer.map_or(0, |layer| layer.depth())
    }

    /// Freeze the chains into an immutable serializer
    pub fn build(self) -> ScriptSerializer {
        ScriptSerializer::new(self.table)
    }
}
