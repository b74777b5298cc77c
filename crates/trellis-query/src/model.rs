//! Graph model capability.
//!
//! The model maps logical element types and members onto the labels and
//! property keys stored by the provider. Implementations must be
//! deterministic and free of side effects; the step resolver may call them
//! any number of times while compiling a query.

use crate::error::{QueryError, QueryResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Logical-to-provider name mapping consumed by the step resolver
pub trait GraphModel: fmt::Debug + Send + Sync {
    /// Provider label of a logical element type
    fn resolve_label(&self, logical_type: &str) -> QueryResult<String>;

    /// Provider key of a member declared on a logical element type
    fn resolve_property(&self, logical_type: &str, member: &str) -> QueryResult<String>;

    /// Labels of `logical_type` and all of its subtypes.
    ///
    /// An empty list means the type does not constrain labels at all.
    fn derived_labels(&self, logical_type: &str) -> QueryResult<Vec<String>> {
        Ok(vec![self.resolve_label(logical_type)?])
    }
}

/// Identity model: labels are type names, keys are member names
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicModel;

impl GraphModel for DynamicModel {
    fn resolve_label(&self, logical_type: &str) -> QueryResult<String> {
        Ok(logical_type.to_string())
    }

    fn resolve_property(&self, _logical_type: &str, member: &str) -> QueryResult<String> {
        Ok(member.to_string())
    }
}

/// Model backed by explicit tables
#[derive(Debug, Clone, Default)]
pub struct StaticModel {
    labels: BTreeMap<String, String>,
    subtypes: BTreeMap<String, BTreeSet<String>>,
    properties: BTreeMap<(String, String), String>,
    unconstrained: BTreeSet<String>,
}

impl StaticModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element type stored under `label`
    pub fn with_type(mut self, logical_type: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(logical_type.into(), label.into());
        self
    }

    /// Declare `subtype` as deriving from `base`
    pub fn with_subtype(mut self, base: impl Into<String>, subtype: impl Into<String>) -> Self {
        self.subtypes
            .entry(base.into())
            .or_default()
            .insert(subtype.into());
        self
    }

    /// Declare a root type such as "any vertex" that matches every label
    pub fn with_unconstrained(mut self, logical_type: impl Into<String>) -> Self {
        self.unconstrained.insert(logical_type.into());
        self
    }

    pub fn with_property(
        mut self,
        logical_type: impl Into<String>,
        member: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.properties
            .insert((logical_type.into(), member.into()), key.into());
        self
    }

    /// Walks the subtype table once per logical type, so cycles terminate
    fn collect_labels<'a>(
        &'a self,
        logical_type: &'a str,
        visited: &mut BTreeSet<&'a str>,
        out: &mut BTreeSet<String>,
    ) -> QueryResult<()> {
        if !visited.insert(logical_type) {
            return Ok(());
        }

        out.insert(self.resolve_label(logical_type)?);
        if let Some(subtypes) = self.subtypes.get(logical_type) {
            for subtype in subtypes {
                self.collect_labels(subtype, visited, out)?;
            }
        }
        Ok(())
    }
}

impl GraphModel for StaticModel {
    fn resolve_label(&self, logical_type: &str) -> QueryResult<String> {
        self.labels
            .get(logical_type)
            .cloned()
            .ok_or_else(|| QueryError::unknown_mapping(logical_type))
    }

    fn resolve_property(&self, logical_type: &str, member: &str) -> QueryResult<String> {
        self.properties
            .get(&(logical_type.to_string(), member.to_string()))
            .cloned()
            .ok_or_else(|| QueryError::unknown_mapping(format!("{logical_type}.{member}")))
    }

    fn derived_labels(&self, logical_type: &str) -> QueryResult<Vec<String>> {
        if self.unconstrained.contains(logical_type) {
            return Ok(Vec::new());
        }

        let mut labels = BTreeSet::new();
        self.collect_labels(logical_type, &mut BTreeSet::new(), &mut labels)?;
        Ok(labels.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> StaticModel {
        StaticModel::new()
            .with_type("Animal", "animal")
            .with_type("Dog", "dog")
            .with_type("Puppy", "puppy")
            .with_subtype("Animal", "Dog")
            .with_subtype("Dog", "Puppy")
            .with_unconstrained("Vertex")
            .with_property("Dog", "name", "n")
    }

    #[test]
    fn test_dynamic_model_is_identity() {
        assert_eq!(DynamicModel.resolve_label("Person").unwrap(), "Person");
        assert_eq!(DynamicModel.resolve_property("Person", "age").unwrap(), "age");
        assert_eq!(DynamicModel.derived_labels("Person").unwrap(), vec!["Person"]);
    }

    #[test]
    fn test_static_model_unknown_property() {
        let err = model().resolve_property("Dog", "age").unwrap_err();
        assert!(matches!(err, QueryError::UnknownMapping { identifier } if identifier == "Dog.age"));
    }

    #[test]
    fn test_static_model_derived_labels_are_transitive() {
        assert_eq!(
            model().derived_labels("Animal").unwrap(),
            vec!["animal", "dog", "puppy"]
        );
        assert!(model().derived_labels("Vertex").unwrap().is_empty());
    }

    #[test]
    fn test_static_model_subtype_cycle_terminates() {
        let cyclic = StaticModel::new()
            .with_type("A", "a")
            .with_type("B", "b")
            .with_subtype("A", "B")
            .with_subtype("B", "A");

        assert_eq!(cyclic.derived_labels("A").unwrap(), vec!["a", "b"]);
        assert_eq!(cyclic.derived_labels("B").unwrap(), vec!["a", "b"]);
    }
}
