//! Bytecode backend.
//!
//! Translates resolved steps into a GraphSON-shaped instruction list.
//! Handler chains are a script concern and do not apply here; strategy
//! markers move to the source instructions where servers expect them.

use super::{QuerySerializer, SerializedQuery};
use crate::error::{QueryError, QueryResult};
use crate::query::Query;
use crate::resolve::StepResolver;
use crate::step::Step;
use crate::value::Value;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::json;

const SOURCE_STEPS: &[&str] = &["withoutStrategies", "withStrategies", "withSideEffect"];

/// Traversal as source and step instructions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub source: Vec<Instruction>,
    pub step: Vec<Instruction>,
}

/// One operator with its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub operator: String,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Argument {
    Value(serde_json::Value),
    Traversal(Bytecode),
}

impl Serialize for Bytecode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(skip_serializing_if = "no_instructions")]
            source: &'a [Instruction],
            step: &'a [Instruction],
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("@type", "g:Bytecode")?;
        map.serialize_entry(
            "@value",
            &Body {
                source: &self.source,
                step: &self.step,
            },
        )?;
        map.end()
    }
}

fn no_instructions(instructions: &&[Instruction]) -> bool {
    instructions.is_empty()
}

impl Serialize for Instruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.arguments.len() + 1))?;
        seq.serialize_element(&self.operator)?;
        for argument in &self.arguments {
            seq.serialize_element(argument)?;
        }
        seq.end()
    }
}

/// Serializer producing [`SerializedQuery::Bytecode`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BytecodeSerializer;

impl BytecodeSerializer {
    pub fn translate<T>(&self, query: &Query<T>) -> QueryResult<Bytecode> {
        translate(&query.erase())
    }
}

impl QuerySerializer for BytecodeSerializer {
    fn name(&self) -> &str {
        "bytecode"
    }

    fn serialize(&self, query: &Query) -> QueryResult<SerializedQuery> {
        Ok(SerializedQuery::Bytecode(translate(query)?))
    }
}

fn translate(query: &Query) -> QueryResult<Bytecode> {
    let resolver = StepResolver::new(query.environment().model().as_ref(), query.member_mappings());
    let mut bytecode = Bytecode::default();

    for step in query.steps().iter() {
        for resolved in resolver.resolve(step)? {
            let instruction = instruction(&resolved)?;
            if SOURCE_STEPS.contains(&resolved.name()) {
                bytecode.source.push(instruction);
            } else {
                bytecode.step.push(instruction);
            }
        }
    }
    Ok(bytecode)
}

fn instruction(step: &Step) -> QueryResult<Instruction> {
    Ok(Instruction {
        operator: step.name().to_string(),
        arguments: step
            .parameters()
            .iter()
            .map(argument)
            .collect::<QueryResult<_>>()?,
    })
}

fn argument(value: &Value) -> QueryResult<Argument> {
    Ok(match value {
        Value::Query(query) => Argument::Traversal(translate(query)?),
        Value::Token(token) => Argument::Value(token_json(token)),
        Value::Member(member) => return Err(QueryError::unknown_mapping(member.to_string())),
        Value::TypeLabel(logical_type) => return Err(QueryError::unknown_mapping(logical_type.as_str())),
        other => Argument::Value(other.to_json()),
    })
}

fn token_json(token: &str) -> serde_json::Value {
    match token {
        "single" | "list" | "set" => json!({ "@type": "g:Cardinality", "@value": token }),
        _ => match token.strip_prefix("T.") {
            Some(name) => json!({ "@type": "g:T", "@value": name }),
            None => json!(token),
        },
    }
}
