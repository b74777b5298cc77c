//! Property tests for query immutability and compilation stability

use proptest::prelude::*;
use trellis_query::{Query, QuerySource, SerializerBuilder, Vertex};

#[derive(Debug, Clone)]
enum Op {
    Out(String),
    HasName(String),
    Limit(i64),
    Skip(i64),
    Dedup,
    Identity,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(Op::Out),
        "[a-zA-Z' ]{0,8}".prop_map(Op::HasName),
        (0i64..1000).prop_map(Op::Limit),
        (0i64..1000).prop_map(Op::Skip),
        Just(Op::Dedup),
        Just(Op::Identity),
    ]
}

fn apply(query: &Query<Vertex>, op: &Op) -> Query<Vertex> {
    match op {
        Op::Out(label) => query.out([label.as_str()]),
        Op::HasName(name) => query.has_key("name", name.as_str()),
        Op::Limit(n) => query.limit(*n),
        Op::Skip(n) => query.skip(*n),
        Op::Dedup => query.dedup(),
        Op::Identity => query.identity(),
    }
}

fn step_names<T>(query: &Query<T>) -> Vec<String> {
    query.steps().iter().map(|s| s.name().to_string()).collect()
}

proptest! {
    #[test]
    fn prop_deriving_never_changes_the_base(
        prefix in proptest::collection::vec(op(), 0..16),
        suffix in proptest::collection::vec(op(), 1..16),
    ) {
        let g = QuerySource::new();
        let base = prefix.iter().fold(g.v([1i64]), |q, op| apply(&q, op));
        let serializer = SerializerBuilder::groovy().build();
        let before_names = step_names(&base);
        let before = serializer.compile(&base, false).unwrap();

        let derived = suffix.iter().fold(base.clone(), |q, op| apply(&q, op));

        prop_assert_eq!(step_names(&base), before_names);
        prop_assert_eq!(serializer.compile(&base, false).unwrap(), before);
        prop_assert_eq!(derived.steps().len(), base.steps().len() + suffix.len());
        prop_assert!(base.steps().shares_prefix_with(derived.steps()));
    }

    #[test]
    fn prop_inline_and_bound_agree_on_structure(
        ops in proptest::collection::vec(op(), 0..16),
    ) {
        let g = QuerySource::new();
        let query = ops.iter().fold(g.v([1i64]), |q, op| apply(&q, op));
        let serializer = SerializerBuilder::groovy().build();

        let inline = serializer.compile(&query, true).unwrap();
        let bound = serializer.compile(&query, false).unwrap();

        prop_assert!(inline.params.is_empty());
        prop_assert_eq!(inline.query.matches(").").count(), bound.query.matches(").").count());
        for name in bound.params.keys() {
            prop_assert!(bound.query.contains(name.as_str()));
        }
    }
}
