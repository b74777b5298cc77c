//! Parameter cache for bound literals.

use crate::value::Value;
use std::collections::HashMap;

/// Structural identity of a literal.
///
/// Floats compare by bit pattern so every value has exactly one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(u64),
    String(String),
    Other(String),
}

impl CacheKey {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => CacheKey::Null,
            Value::Bool(b) => CacheKey::Bool(*b),
            Value::Int(i) => CacheKey::Int(*i),
            Value::Long(l) => CacheKey::Long(*l),
            Value::Float(f) => CacheKey::Float(f.to_bits()),
            Value::String(s) => CacheKey::String(s.clone()),
            other => CacheKey::Other(format!("{:?}:{}", other.kind(), other.to_json())),
        }
    }
}

/// Deduplicating name generator for one serialization pass.
///
/// Names are `P0`, `P1`, … in first-seen order. A cache is owned by a
/// single pass and dropped with it; it is not meant to be shared.
#[derive(Debug, Default)]
pub struct ParameterCache {
    next_id: usize,
    names: HashMap<CacheKey, String>,
}

impl ParameterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of `value`, allocating the next one on first sight
    pub fn cache(&mut self, value: &Value) -> String {
        let next_id = &mut self.next_id;
        self.names
            .entry(CacheKey::of(value))
            .or_insert_with(|| {
                let name = format!("P{next_id}");
                *next_id += 1;
                name
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_same_value_same_name() {
        let mut cache = ParameterCache::new();
        assert_eq!(cache.cache(&Value::from("marko")), "P0");
        assert_eq!(cache.cache(&Value::from("marko")), "P0");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_values_distinct_names() {
        let mut cache = ParameterCache::new();
        assert_eq!(cache.cache(&Value::from("marko")), "P0");
        assert_eq!(cache.cache(&Value::Int(5)), "P1");
        assert_eq!(cache.cache(&Value::Long(5)), "P2");
        assert_eq!(cache.cache(&Value::Int(5)), "P1");
    }

    #[test]
    fn test_float_keys_by_bits() {
        let mut cache = ParameterCache::new();
        let nan = cache.cache(&Value::Float(f64::NAN));
        assert_eq!(cache.cache(&Value::Float(f64::NAN)), nan);
        assert_ne!(cache.cache(&Value::Float(0.0)), cache.cache(&Value::Float(-0.0)));
    }

    proptest! {
        #[test]
        fn prop_names_are_stable_and_unique(values in proptest::collection::vec(any::<i64>(), 0..64)) {
            let mut cache = ParameterCache::new();
            let first: Vec<String> = values.iter().map(|v| cache.cache(&Value::Long(*v))).collect();
            let second: Vec<String> = values.iter().map(|v| cache.cache(&Value::Long(*v))).collect();

            prop_assert_eq!(&first, &second);
            for (i, a) in values.iter().enumerate() {
                for (j, b) in values.iter().enumerate() {
                    prop_assert_eq!(a == b, first[i] == first[j]);
                }
            }
        }
    }
}
