//! Immutable query model.
//!
//! A [`Query`] is a graph name, a persistent [`StepList`], the environment
//! it compiles and executes against, a shared alias factory and the member
//! mappings registered on it. Every operation returns a new value; the
//! receiver is never modified, so queries can be shared freely between
//! threads and reused as prefixes of other queries.

mod list;
mod steps;

pub use list::StepList;
pub use steps::{Cardinality, StepLabel};

use crate::environment::QueryEnvironment;
use crate::error::{QueryError, QueryResult};
use crate::step::Step;
use crate::value::{Expr, MemberRef};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Graph name marking an anonymous sub-traversal
pub const ANONYMOUS_GRAPH_NAME: &str = "__";

/// Element type marker for vertex queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vertex;

/// Element type marker for edge queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge;

/// Traversal under construction.
///
/// `T` is the declared element type. It is a static contract only and
/// never checked at runtime; [`Query::cast`] relabels it freely.
pub struct Query<T = ()> {
    graph_name: Arc<str>,
    steps: StepList,
    environment: Arc<QueryEnvironment>,
    identifiers: Arc<IdentifierFactory>,
    member_mappings: Arc<BTreeMap<MemberRef, String>>,
    _element: PhantomData<fn() -> T>,
}

impl Query {
    /// Start an empty query on `graph_name`
    pub fn create(graph_name: impl Into<Arc<str>>, environment: Arc<QueryEnvironment>) -> Self {
        Self {
            graph_name: graph_name.into(),
            steps: StepList::new(),
            environment,
            identifiers: Arc::new(IdentifierFactory::default()),
            member_mappings: Arc::new(BTreeMap::new()),
            _element: PhantomData,
        }
    }

    /// Start an anonymous sub-traversal
    pub fn anonymous(environment: Arc<QueryEnvironment>) -> Self {
        Self::create(ANONYMOUS_GRAPH_NAME, environment)
    }
}

impl<T> Query<T> {
    fn rebuild<U>(&self, graph_name: Arc<str>, steps: StepList) -> Query<U> {
        Query {
            graph_name,
            steps,
            environment: self.environment.clone(),
            identifiers: self.identifiers.clone(),
            member_mappings: self.member_mappings.clone(),
            _element: PhantomData,
        }
    }

    pub fn graph_name(&self) -> &str {
        &self.graph_name
    }

    pub fn steps(&self) -> &StepList {
        &self.steps
    }

    pub fn environment(&self) -> &Arc<QueryEnvironment> {
        &self.environment
    }

    pub fn identifiers(&self) -> &IdentifierFactory {
        &self.identifiers
    }

    pub fn member_mappings(&self) -> &BTreeMap<MemberRef, String> {
        &self.member_mappings
    }

    pub fn is_anonymous(&self) -> bool {
        &*self.graph_name == ANONYMOUS_GRAPH_NAME
    }

    /// Append a step, declaring the resulting element type
    pub fn add_step<U>(&self, step: Step) -> Query<U> {
        self.rebuild(self.graph_name.clone(), self.steps.push(step))
    }

    /// Relabel the element type without touching the steps
    pub fn cast<U>(&self) -> Query<U> {
        self.rebuild(self.graph_name.clone(), self.steps.clone())
    }

    /// Drop the element type, e.g. to nest the query as a parameter
    pub fn erase(&self) -> Query {
        self.cast()
    }

    /// Anonymous traversal with the same environment and mappings but no steps
    pub fn to_anonymous(&self) -> Query<T> {
        self.rebuild(ANONYMOUS_GRAPH_NAME.into(), StepList::new())
    }

    /// Same query bound to another environment
    pub fn replace_environment(&self, environment: Arc<QueryEnvironment>) -> Query<T> {
        Query {
            environment,
            ..self.cast()
        }
    }

    /// Map a member to a provider name for this query and everything derived from it.
    ///
    /// Only direct member references are accepted; a single conversion
    /// around the member is unwrapped.
    pub fn add_member_mapping(&self, expression: &Expr, name: impl Into<String>) -> QueryResult<Query<T>> {
        let member = expression
            .as_member()
            .ok_or_else(|| QueryError::InvalidMappingExpression {
                expression: format!("{expression:?}"),
            })?;

        let mut mappings = (*self.member_mappings).clone();
        mappings.insert(member.clone(), name.into());

        Ok(Query {
            member_mappings: Arc::new(mappings),
            ..self.cast()
        })
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        self.cast()
    }
}

impl<T> PartialEq for Query<T> {
    fn eq(&self, other: &Self) -> bool {
        self.graph_name == other.graph_name
            && self.steps == other.steps
            && self.member_mappings == other.member_mappings
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("graph_name", &self.graph_name)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

/// Generates step labels (`_a` … `_z`, `_ba`, …) unique within a query family
#[derive(Debug, Default)]
pub struct IdentifierFactory {
    next: AtomicUsize,
}

impl IdentifierFactory {
    pub fn next_identifier(&self) -> String {
        let mut n = self.next.fetch_add(1, Ordering::Relaxed);
        let mut digits = Vec::new();
        loop {
            digits.push(char::from(b'a' + (n % 26) as u8));
            n /= 26;
            if n == 0 {
                break;
            }
        }
        std::iter::once('_').chain(digits.into_iter().rev()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn query() -> Query {
        Query::create("g", Arc::new(QueryEnvironment::default()))
    }

    #[test]
    fn test_add_step_does_not_mutate() {
        let q = query().add_step::<()>(Step::bare("V"));
        let before: Vec<Step> = q.steps().iter().cloned().collect();

        let derived = q.add_step::<()>(Step::bare("out"));

        let after: Vec<Step> = q.steps().iter().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(q.steps().len(), 1);
        assert_eq!(derived.steps().len(), 2);
        assert!(q.steps().shares_prefix_with(derived.steps()));
    }

    #[test]
    fn test_to_anonymous_keeps_mappings() {
        let member = MemberRef::new("Person", "name");
        let q = query()
            .add_step::<()>(Step::bare("V"))
            .add_member_mapping(&Expr::Member(member.clone()), "n")
            .unwrap();

        let anon = q.to_anonymous();

        assert!(anon.is_anonymous());
        assert!(anon.steps().is_empty());
        assert_eq!(anon.member_mappings().get(&member), Some(&"n".to_string()));
        assert!(Arc::ptr_eq(anon.environment(), q.environment()));
    }

    #[test]
    fn test_add_member_mapping_rejects_non_members() {
        let expr = Expr::Constant(Value::Int(3));
        let result = query().add_member_mapping(&expr, "x");

        assert!(matches!(
            result,
            Err(QueryError::InvalidMappingExpression { .. })
        ));
    }

    #[test]
    fn test_add_member_mapping_does_not_leak_into_source() {
        let q = query();
        let member = MemberRef::new("Person", "name");
        let mapped = q
            .add_member_mapping(&Expr::Convert(Box::new(Expr::Member(member.clone()))), "n")
            .unwrap();

        assert!(q.member_mappings().is_empty());
        assert_eq!(mapped.member_mappings().len(), 1);
    }

    #[test]
    fn test_replace_environment() {
        let q = query().add_step::<()>(Step::bare("V"));
        let env = Arc::new(QueryEnvironment::default());

        let replaced = q.replace_environment(env.clone());

        assert!(Arc::ptr_eq(replaced.environment(), &env));
        assert_eq!(replaced, q);
    }

    #[test]
    fn test_identifier_sequence() {
        let factory = IdentifierFactory::default();
        let ids: Vec<String> = (0..28).map(|_| factory.next_identifier()).collect();

        assert_eq!(ids[0], "_a");
        assert_eq!(ids[25], "_z");
        assert_eq!(ids[26], "_ba");
        assert_eq!(ids[27], "_bb");
    }
}
