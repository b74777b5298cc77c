//! Default Gremlin handler set.

use super::builder::SerializerBuilder;
use crate::step::Step;
use crate::value::Value;

pub(crate) fn register(builder: SerializerBuilder) -> SerializerBuilder {
    builder
        // has(key, null) cannot match anything; the intent is hasNot(key)
        .override_step("has", |step, w, chain| match step.parameters() {
            [key, Value::Null] => chain.recurse(&Step::new("hasNot", [key.clone()]), w),
            _ => chain.overridden(step, w),
        })
        .override_step("hasLabel", |step, w, chain| {
            if step.parameters().is_empty() {
                chain.recurse(&Step::bare("none"), w)
            } else {
                chain.overridden(step, w)
            }
        })
        // TINKERPOP-2112
        .override_step("property", |step, w, chain| match step.parameters() {
            [Value::Token(cardinality), rest @ ..]
                if cardinality == "single" && w.options().workaround_tinkerpop_2112 =>
            {
                chain.recurse(&Step::new("property", rest.iter().cloned()), w)
            }
            _ => chain.overridden(step, w),
        })
}
