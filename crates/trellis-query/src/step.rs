//! Traversal steps.

use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// One traversal operation: a name and its ordered parameters.
///
/// Steps are immutable; parameters are shared between clones.
#[derive(Clone, PartialEq)]
pub struct Step {
    name: Arc<str>,
    parameters: Arc<[Value]>,
}

impl Step {
    pub fn new(name: impl Into<Arc<str>>, parameters: impl IntoIterator<Item = Value>) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().collect(),
        }
    }

    /// A step without parameters
    pub fn bare(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, [])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Integer parameter at `index`, accepting both `Int` and `Long`
    pub fn integer_at(&self, index: usize) -> Option<i64> {
        self.parameters.get(index).and_then(Value::as_i64)
    }

    pub fn limit(count: i64) -> Self {
        Self::new("limit", [Value::Long(count)])
    }

    pub fn skip(count: i64) -> Self {
        Self::new("skip", [Value::Long(count)])
    }

    pub fn tail(count: i64) -> Self {
        Self::new("tail", [Value::Long(count)])
    }

    pub fn range(lower: i64, upper: i64) -> Self {
        Self::new("range", [Value::Long(lower), Value::Long(upper)])
    }

    /// Marker step telling the server to disable the named strategies
    pub fn without_strategies<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            "withoutStrategies",
            names.into_iter().map(|n| Value::Token(n.into())),
        )
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(&self.name).field(&self.parameters).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_parameters() {
        let step = Step::new("has", [Value::key("name"), Value::from("marko")]);
        let copy = step.clone();

        assert!(Arc::ptr_eq(&step.parameters, &copy.parameters));
        assert_eq!(step, copy);
    }

    #[test]
    fn test_integer_at_accepts_int_and_long() {
        let step = Step::new("range", [Value::Int(1), Value::Long(5)]);
        assert_eq!(step.integer_at(0), Some(1));
        assert_eq!(step.integer_at(1), Some(5));
        assert_eq!(step.integer_at(2), None);
    }

    #[test]
    fn test_without_strategies_uses_tokens() {
        let step = Step::without_strategies(["SubgraphStrategy"]);
        assert_eq!(step.name(), "withoutStrategies");
        assert_eq!(step.parameters(), &[Value::token("SubgraphStrategy")]);
    }
}
