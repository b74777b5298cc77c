//! Generic encoder at the bottom of every handler chain.

use super::builder::Atom;
use super::script::Chain;
use super::writer::QueryWriter;
use crate::error::{QueryError, QueryResult};
use crate::query::Query;
use crate::resolve::StepResolver;
use crate::step::Step;
use crate::value::Value;

pub(crate) fn encode(atom: Atom<'_>, writer: &mut QueryWriter, chain: &Chain<'_>) -> QueryResult<()> {
    match atom {
        Atom::Step(step) => encode_step(step, writer, chain),
        Atom::Value(value) => encode_value(value, writer, chain),
    }
}

/// `name(p1, p2, …)`, each parameter dispatched through its own chain
fn encode_step(step: &Step, writer: &mut QueryWriter, chain: &Chain<'_>) -> QueryResult<()> {
    writer.push_str(step.name());
    writer.push('(');
    for (i, parameter) in step.parameters().iter().enumerate() {
        if i > 0 {
            writer.push_str(", ");
        }
        chain.dispatch(parameter, writer)?;
    }
    writer.push(')');
    Ok(())
}

fn encode_value(value: &Value, writer: &mut QueryWriter, chain: &Chain<'_>) -> QueryResult<()> {
    match value {
        Value::Query(query) => encode_query(query, writer, chain),
        Value::Key(key) => {
            writer.write_key(key);
            Ok(())
        }
        Value::Token(token) => {
            writer.push_str(token);
            Ok(())
        }
        // Logical references only reach the encoder when a handler bypassed resolution
        Value::Member(member) => Err(QueryError::unknown_mapping(member.to_string())),
        Value::TypeLabel(logical_type) => Err(QueryError::unknown_mapping(logical_type.as_str())),
        literal => {
            writer.write_literal(literal);
            Ok(())
        }
    }
}

/// Graph name followed by the resolved steps, `.`-separated
fn encode_query(query: &Query, writer: &mut QueryWriter, chain: &Chain<'_>) -> QueryResult<()> {
    let resolver = StepResolver::new(query.environment().model().as_ref(), query.member_mappings());

    writer.push_str(query.graph_name());
    let mut separate = !query.graph_name().is_empty();

    for step in query.steps().iter() {
        for resolved in resolver.resolve(step)? {
            if separate {
                writer.push('.');
            }
            separate = true;
            chain.dispatch(&resolved, writer)?;
        }
    }
    Ok(())
}
