//! Step resolution.
//!
//! Expands a logical step into zero or more provider-resolved steps:
//! members become property keys, element types become labels and domain
//! objects are spread into `property` steps. Resolution is pure; it reads
//! the graph model and the query's member mappings and nothing else.

use crate::error::QueryResult;
use crate::model::GraphModel;
use crate::step::Step;
use crate::value::{DomainObject, MemberRef, Value};
use std::collections::BTreeMap;

/// Token used for the element identifier in property positions
pub const ID_TOKEN: &str = "T.id";

/// Resolves logical steps of one query against a graph model
#[derive(Clone, Copy)]
pub struct StepResolver<'a> {
    model: &'a dyn GraphModel,
    mappings: &'a BTreeMap<MemberRef, String>,
}

impl<'a> StepResolver<'a> {
    pub fn new(model: &'a dyn GraphModel, mappings: &'a BTreeMap<MemberRef, String>) -> Self {
        Self { model, mappings }
    }

    /// Resolved steps for `step`, in output order
    pub fn resolve(&self, step: &Step) -> QueryResult<Vec<Step>> {
        match (step.name(), step.parameters()) {
            (name @ ("addV" | "addE"), [Value::Object(element)]) => {
                let label = self.model.resolve_label(element.type_name())?;
                let mut steps = vec![Step::new(name, [Value::String(label)])];
                steps.extend(self.property_steps(element, true)?);
                Ok(steps)
            }
            ("update", [Value::Object(element)]) => self.property_steps(element, false),
            ("ofType", [Value::TypeLabel(logical_type)]) => {
                let labels = self.model.derived_labels(logical_type)?;
                if labels.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![Step::new(
                    "hasLabel",
                    labels.into_iter().map(Value::String),
                )])
            }
            ("withoutStrategies", []) => Ok(Vec::new()),
            (name, parameters) => {
                let parameters = parameters
                    .iter()
                    .map(|p| self.resolve_value(p))
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(vec![Step::new(name, parameters)])
            }
        }
    }

    /// Resolved form of a single parameter
    pub fn resolve_value(&self, value: &Value) -> QueryResult<Value> {
        match value {
            Value::Member(member) => self.resolve_member(member),
            Value::TypeLabel(logical_type) => {
                Ok(Value::String(self.model.resolve_label(logical_type)?))
            }
            other => Ok(other.clone()),
        }
    }

    fn resolve_member(&self, member: &MemberRef) -> QueryResult<Value> {
        if let Some(name) = self.mappings.get(member) {
            return Ok(Value::Key(name.clone()));
        }
        if member.member == "id" {
            return Ok(Value::token(ID_TOKEN));
        }
        Ok(Value::Key(
            self.model.resolve_property(&member.owner, &member.member)?,
        ))
    }

    fn property_steps(&self, element: &DomainObject, include_id: bool) -> QueryResult<Vec<Step>> {
        element
            .members()
            .iter()
            .filter(|(name, value)| *value != Value::Null && (include_id || name != "id"))
            .map(|(name, value)| {
                let key = self.resolve_member(&MemberRef::new(element.type_name(), name.as_str()))?;
                Ok(Step::new("property", [key, self.resolve_value(value)?]))
            })
            .collect()
    }
}
