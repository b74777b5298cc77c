//! Fluent step builders.
//!
//! Each builder appends exactly one logical step. Logical references
//! (members, element types, domain objects) are kept as they are and only
//! resolved against the graph model when the query is compiled.

use super::{Edge, Query, Vertex};
use crate::step::Step;
use crate::value::{DomainObject, MemberRef, Value};

/// Label attached to a step with [`Query::as_`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepLabel(pub String);

/// Property cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    List,
    Set,
}

impl Cardinality {
    pub fn as_token(self) -> &'static str {
        match self {
            Cardinality::Single => "single",
            Cardinality::List => "list",
            Cardinality::Set => "set",
        }
    }
}

fn values<I, V>(items: I) -> Vec<Value>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    items.into_iter().map(Into::into).collect()
}

fn strings<I, S>(items: I) -> Vec<Value>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(|s| Value::String(s.into())).collect()
}

impl<T> Query<T> {
    // ========================================================================
    // Start steps
    // ========================================================================

    pub fn v<I, V>(&self, ids: I) -> Query<Vertex>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_step(Step::new("V", values(ids)))
    }

    pub fn e<I, V>(&self, ids: I) -> Query<Edge>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_step(Step::new("E", values(ids)))
    }

    pub fn add_v(&self, vertex: DomainObject) -> Query<Vertex> {
        self.add_step(Step::new("addV", [Value::from(vertex)]))
    }

    pub fn add_e(&self, edge: DomainObject) -> Query<Edge> {
        self.add_step(Step::new("addE", [Value::from(edge)]))
    }

    pub fn inject<I, V>(&self, elements: I) -> Query<T>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_step(Step::new("inject", values(elements)))
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Filter on a logical member
    pub fn has(&self, member: MemberRef, value: impl Into<Value>) -> Query<T> {
        self.add_step(Step::new("has", [Value::Member(member), value.into()]))
    }

    /// Filter on an already resolved property key
    pub fn has_key(&self, key: impl Into<String>, value: impl Into<Value>) -> Query<T> {
        self.add_step(Step::new("has", [Value::Key(key.into()), value.into()]))
    }

    pub fn has_not(&self, member: MemberRef) -> Query<T> {
        self.add_step(Step::new("hasNot", [Value::Member(member)]))
    }

    pub fn has_label<I, S>(&self, labels: I) -> Query<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_step(Step::new("hasLabel", strings(labels)))
    }

    /// Restrict to a logical element type and its subtypes
    pub fn of_type<U>(&self, type_name: impl Into<String>) -> Query<U> {
        self.add_step(Step::new("ofType", [Value::TypeLabel(type_name.into())]))
    }

    pub fn dedup(&self) -> Query<T> {
        self.add_step(Step::bare("dedup"))
    }

    pub fn identity(&self) -> Query<T> {
        self.add_step(Step::bare("identity"))
    }

    pub fn none(&self) -> Query<T> {
        self.add_step(Step::bare("none"))
    }

    pub fn not<U>(&self, traversal: impl FnOnce(Query<T>) -> Query<U>) -> Query<T> {
        let inner = traversal(self.to_anonymous());
        self.add_step(Step::new("not", [Value::from(inner)]))
    }

    pub fn where_<U>(&self, traversal: impl FnOnce(Query<T>) -> Query<U>) -> Query<T> {
        let inner = traversal(self.to_anonymous());
        self.add_step(Step::new("where", [Value::from(inner)]))
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn out<I, S>(&self, labels: I) -> Query<Vertex>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_step(Step::new("out", strings(labels)))
    }

    pub fn in_<I, S>(&self, labels: I) -> Query<Vertex>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_step(Step::new("in", strings(labels)))
    }

    pub fn both<I, S>(&self, labels: I) -> Query<Vertex>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_step(Step::new("both", strings(labels)))
    }

    pub fn out_e<I, S>(&self, labels: I) -> Query<Edge>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_step(Step::new("outE", strings(labels)))
    }

    pub fn in_e<I, S>(&self, labels: I) -> Query<Edge>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_step(Step::new("inE", strings(labels)))
    }

    pub fn out_v(&self) -> Query<Vertex> {
        self.add_step(Step::bare("outV"))
    }

    pub fn in_v(&self) -> Query<Vertex> {
        self.add_step(Step::bare("inV"))
    }

    // ========================================================================
    // Projection and paging
    // ========================================================================

    pub fn values<I>(&self, members: I) -> Query<Value>
    where
        I: IntoIterator<Item = MemberRef>,
    {
        self.add_step(Step::new("values", members.into_iter().map(Value::Member)))
    }

    pub fn id(&self) -> Query<Value> {
        self.add_step(Step::bare("id"))
    }

    pub fn label(&self) -> Query<String> {
        self.add_step(Step::bare("label"))
    }

    pub fn count(&self) -> Query<i64> {
        self.add_step(Step::bare("count"))
    }

    pub fn fold(&self) -> Query<Vec<T>> {
        self.add_step(Step::bare("fold"))
    }

    pub fn limit(&self, count: i64) -> Query<T> {
        self.add_step(Step::limit(count))
    }

    pub fn skip(&self, count: i64) -> Query<T> {
        self.add_step(Step::skip(count))
    }

    pub fn tail(&self, count: i64) -> Query<T> {
        self.add_step(Step::tail(count))
    }

    pub fn range(&self, lower: i64, upper: i64) -> Query<T> {
        self.add_step(Step::range(lower, upper))
    }

    /// Label the current step with a fresh identifier
    pub fn as_(&self) -> (Query<T>, StepLabel) {
        let label = StepLabel(self.identifiers().next_identifier());
        let query = self.add_step(Step::new("as", [Value::String(label.0.clone())]));
        (query, label)
    }

    pub fn select<U>(&self, label: &StepLabel) -> Query<U> {
        self.add_step(Step::new("select", [Value::String(label.0.clone())]))
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    pub fn property(&self, member: MemberRef, value: impl Into<Value>) -> Query<T> {
        self.add_step(Step::new("property", [Value::Member(member), value.into()]))
    }

    pub fn property_with(
        &self,
        cardinality: Cardinality,
        member: MemberRef,
        value: impl Into<Value>,
    ) -> Query<T> {
        self.add_step(Step::new(
            "property",
            [
                Value::token(cardinality.as_token()),
                Value::Member(member),
                value.into(),
            ],
        ))
    }

    /// Overwrite the element's properties with the members of `element`
    pub fn update(&self, element: DomainObject) -> Query<T> {
        self.add_step(Step::new("update", [Value::from(element)]))
    }

    pub fn drop(&self) -> Query {
        self.add_step(Step::bare("drop"))
    }
}
