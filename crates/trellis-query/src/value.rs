//! Values carried as step parameters.
//!
//! A [`Value`] is either a literal, a resolved grammar element (property
//! key, bare token), a logical reference that the step resolver replaces
//! before serialization (member, element type, domain object), or a nested
//! sub-query.

use crate::error::{QueryError, QueryResult};
use crate::query::Query;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A step parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null literal
    Null,
    /// Boolean literal
    Bool(bool),
    /// 32-bit integer literal
    Int(i32),
    /// 64-bit integer literal
    Long(i64),
    /// Floating point literal
    Float(f64),
    /// String literal
    String(String),
    /// Provider property key, emitted double-quoted and never bound
    Key(String),
    /// Bare grammar token such as `single` or a strategy class name
    Token(String),
    /// Logical member reference, resolved to a [`Value::Key`]
    Member(MemberRef),
    /// Logical element type, resolved to a provider label
    TypeLabel(String),
    /// Opaque domain object
    Object(Arc<DomainObject>),
    /// Nested compilable sub-query
    Query(Query),
}

/// Fieldless discriminant of a [`Value`], used to key serialization handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Long,
    Float,
    String,
    Key,
    Token,
    Member,
    TypeLabel,
    Object,
    Query,
}

impl Value {
    /// Discriminant of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Key(_) => ValueKind::Key,
            Value::Token(_) => ValueKind::Token,
            Value::Member(_) => ValueKind::Member,
            Value::TypeLabel(_) => ValueKind::TypeLabel,
            Value::Object(_) => ValueKind::Object,
            Value::Query(_) => ValueKind::Query,
        }
    }

    /// Whether this value is a plain literal that may be inlined or bound
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Bool(_)
                | Value::Int(_)
                | Value::Long(_)
                | Value::Float(_)
                | Value::String(_)
        )
    }

    /// Integer view of `Int` and `Long` values
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// String view of `String` values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build a property key
    pub fn key(key: impl Into<String>) -> Self {
        Value::Key(key.into())
    }

    /// Build a bare token
    pub fn token(token: impl Into<String>) -> Self {
        Value::Token(token.into())
    }

    /// JSON form used for bound parameters and bytecode arguments.
    ///
    /// Non-finite floats have no JSON representation and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Long(l) => Json::from(*l),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) | Value::Key(s) | Value::Token(s) | Value::TypeLabel(s) => {
                Json::String(s.clone())
            }
            Value::Member(m) => Json::String(m.to_string()),
            Value::Object(obj) => Json::Object(
                obj.members()
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Query(q) => Json::String(format!("{q:?}")),
        }
    }

    fn from_json(type_name: &str, json: serde_json::Value) -> QueryResult<Self> {
        use serde_json::Value as Json;

        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(l), _) => Value::Long(l),
                (None, Some(f)) => Value::Float(f),
                (None, None) => {
                    return Err(QueryError::InvalidDomainObject {
                        type_name: type_name.to_string(),
                        reason: format!("number {n} is not representable"),
                    })
                }
            },
            Json::String(s) => Value::String(s),
            other => {
                return Err(QueryError::InvalidDomainObject {
                    type_name: type_name.to_string(),
                    reason: format!("nested value {other} cannot be stored as a property"),
                })
            }
        })
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<MemberRef> for Value {
    fn from(value: MemberRef) -> Self {
        Value::Member(value)
    }
}

impl From<DomainObject> for Value {
    fn from(value: DomainObject) -> Self {
        Value::Object(Arc::new(value))
    }
}

impl<T> From<Query<T>> for Value {
    fn from(value: Query<T>) -> Self {
        Value::Query(value.erase())
    }
}

/// Reference to a member of a logical element type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberRef {
    /// Logical element type declaring the member
    pub owner: String,
    /// Member name on that type
    pub member: String,
}

impl MemberRef {
    pub fn new(owner: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            member: member.into(),
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.member)
    }
}

/// Member expression handed over by an upstream expression producer
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Direct member access
    Member(MemberRef),
    /// Type conversion wrapping another expression
    Convert(Box<Expr>),
    /// Constant value
    Constant(Value),
    /// Method call
    Call {
        /// Called method
        method: String,
        /// Call arguments
        args: Vec<Expr>,
    },
}

impl Expr {
    /// The member this expression refers to, with one conversion unwrapped
    pub fn as_member(&self) -> Option<&MemberRef> {
        let body = match self {
            Expr::Convert(inner) => inner.as_ref(),
            other => other,
        };

        match body {
            Expr::Member(member) => Some(member),
            _ => None,
        }
    }
}

/// Opaque domain object: a logical type plus its members in order
#[derive(Debug, Clone, PartialEq)]
pub struct DomainObject {
    type_name: String,
    members: Vec<(String, Value)>,
}

impl DomainObject {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: Vec::new(),
        }
    }

    /// Add or replace a member
    pub fn with(mut self, member: impl Into<String>, value: impl Into<Value>) -> Self {
        let member = member.into();
        let value = value.into();
        match self.members.iter_mut().find(|(name, _)| *name == member) {
            Some(slot) => slot.1 = value,
            None => self.members.push((member, value)),
        }
        self
    }

    /// Build an object from any serializable struct.
    ///
    /// Fields become members ordered by name. Nested arrays and maps are
    /// rejected since they have no property representation.
    pub fn from_serialize<S: Serialize>(type_name: impl Into<String>, value: &S) -> QueryResult<Self> {
        let type_name = type_name.into();
        let json = serde_json::to_value(value).map_err(|e| QueryError::InvalidDomainObject {
            type_name: type_name.clone(),
            reason: e.to_string(),
        })?;

        let serde_json::Value::Object(map) = json else {
            return Err(QueryError::InvalidDomainObject {
                type_name,
                reason: "expected a struct or map".to_string(),
            });
        };

        let members = map
            .into_iter()
            .map(|(name, json)| Ok((name, Value::from_json(&type_name, json)?)))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(Self { type_name, members })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn members(&self) -> &[(String, Value)] {
        &self.members
    }

    /// The `id` member, if present and not null
    pub fn id(&self) -> Option<&Value> {
        self.members
            .iter()
            .find(|(name, value)| name == "id" && *value != Value::Null)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Person {
        name: String,
        age: i64,
        nickname: Option<String>,
    }

    #[test]
    fn test_expr_unwraps_single_conversion() {
        let member = MemberRef::new("Person", "name");
        let expr = Expr::Convert(Box::new(Expr::Member(member.clone())));
        assert_eq!(expr.as_member(), Some(&member));
    }

    #[test]
    fn test_expr_rejects_calls() {
        let expr = Expr::Call {
            method: "ToString".to_string(),
            args: vec![],
        };
        assert_eq!(expr.as_member(), None);
        assert_eq!(Expr::Constant(Value::Int(1)).as_member(), None);
    }

    #[test]
    fn test_domain_object_from_serialize() {
        let person = Person {
            name: "marko".to_string(),
            age: 29,
            nickname: None,
        };

        let obj = DomainObject::from_serialize("Person", &person).unwrap();

        assert_eq!(obj.type_name(), "Person");
        assert_eq!(
            obj.members(),
            &[
                ("age".to_string(), Value::Long(29)),
                ("name".to_string(), Value::from("marko")),
                ("nickname".to_string(), Value::Null),
            ]
        );
    }

    #[test]
    fn test_domain_object_rejects_nested_values() {
        let result = DomainObject::from_serialize("Bag", &serde_json::json!({ "items": [1, 2] }));
        assert!(matches!(result, Err(QueryError::InvalidDomainObject { .. })));
    }

    #[test]
    fn test_domain_object_with_replaces_member() {
        let obj = DomainObject::new("Person").with("name", "a").with("name", "b");
        assert_eq!(obj.members(), &[("name".to_string(), Value::from("b"))]);
    }

    #[test]
    fn test_domain_object_id() {
        let obj = DomainObject::new("Person").with("id", 7i64);
        assert_eq!(obj.id(), Some(&Value::Long(7)));
        assert_eq!(DomainObject::new("Person").with("id", Value::Null).id(), None);
    }

    #[test]
    fn test_to_json_non_finite_float_is_null() {
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(Value::Long(5).to_json(), serde_json::json!(5));
    }
}
