//! # Trellis Cosmos
//!
//! Serialization workarounds for the CosmosDb Gremlin dialect, layered on
//! top of any [`SerializerBuilder`] through its public handler API.
//!
//! CosmosDb does not implement `skip` or `none`, and rejects counts and
//! integers outside the 32-bit range.
//!
//! ```rust,ignore
//! use trellis_cosmos::CosmosSerializerBuilderExt;
//! use trellis_query::SerializerBuilder;
//!
//! let serializer = SerializerBuilder::groovy().use_cosmos_db_workarounds().build();
//! ```

use std::sync::Arc;
use trellis_query::{
    Query, QueryEnvironment, QueryError, QueryResult, SerializerBuilder, Step, Value, ValueKind,
};
use tracing::trace;

/// Largest count or integer CosmosDb accepts
pub const MAX_COSMOS_INTEGER: i64 = i32::MAX as i64;

/// CosmosDb workarounds for [`SerializerBuilder`]
pub trait CosmosSerializerBuilderExt {
    /// Layer the CosmosDb workarounds on top of the handlers registered so far
    fn use_cosmos_db_workarounds(self) -> Self;
}

impl CosmosSerializerBuilderExt for SerializerBuilder {
    fn use_cosmos_db_workarounds(self) -> Self {
        let none_workaround = none_workaround();
        trace!("Registering CosmosDb workarounds");

        self.override_step("skip", |step, w, chain| match step.integer_at(0) {
            Some(count) => chain.recurse(&Step::range(count, -1), w),
            None => chain.overridden(step, w),
        })
        .override_step("none", move |_, w, chain| chain.recurse(&none_workaround, w))
        .override_step("limit", |step, w, chain| {
            check_range(step)?;
            chain.overridden(step, w)
        })
        .override_step("tail", |step, w, chain| {
            check_range(step)?;
            chain.overridden(step, w)
        })
        .override_step("range", |step, w, chain| {
            check_range(step)?;
            chain.overridden(step, w)
        })
        .override_value(ValueKind::Long, |value, w, chain| match value {
            Value::Long(l) => {
                let narrowed = i32::try_from(*l)
                    .map_err(|_| QueryError::value_range("Long", *l, MAX_COSMOS_INTEGER))?;
                chain.recurse(&Value::Int(narrowed), w)
            }
            other => chain.overridden(other, w),
        })
    }
}

/// `not(__.identity())`, which filters out everything like `none()`
fn none_workaround() -> Step {
    let identity: Query = Query::anonymous(Arc::new(QueryEnvironment::default()))
        .add_step(Step::bare("identity"));
    Step::new("not", [Value::from(identity)])
}

fn check_range(step: &Step) -> QueryResult<()> {
    for value in step.parameters().iter().filter_map(Value::as_i64) {
        if value > MAX_COSMOS_INTEGER {
            return Err(QueryError::value_range(step.name(), value, MAX_COSMOS_INTEGER));
        }
    }
    Ok(())
}
