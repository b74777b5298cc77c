//! Query error types
//!
//! Every error is raised synchronously while a query is configured or
//! compiled and propagates straight to the caller. Nothing in this crate
//! retries.

use thiserror::Error;

/// Error type for query construction, compilation and execution
#[derive(Debug, Error)]
pub enum QueryError {
    /// Serialization was attempted before a real serializer was configured
    #[error(
        "no serializer configured: configure a proper serializer on the query source before executing queries"
    )]
    UnconfiguredSerializer,

    /// Execution was attempted before a real executor was configured
    #[error("no executor configured: configure a proper executor on the query source")]
    UnconfiguredExecutor,

    /// A member or label could not be resolved against the graph model
    #[error("unknown mapping for '{identifier}'")]
    UnknownMapping {
        /// The offending identifier
        identifier: String,
    },

    /// A member mapping was registered with something other than a direct member reference
    #[error("member mappings require a direct member reference, got {expression}")]
    InvalidMappingExpression {
        /// Debug rendering of the rejected expression
        expression: String,
    },

    /// A provider-specific numeric limit was exceeded
    #[error("value {value} for '{context}' is outside the supported range (max {max})")]
    ValueRange {
        /// Step or value kind that carried the value
        context: String,
        /// The rejected value
        value: i64,
        /// Largest value the target accepts
        max: i64,
    },

    /// A handler chain kept substituting values past the recursion bound
    #[error("serialization recursed {depth} times, the handler chain is likely looping")]
    SerializationLoop {
        /// Depth at which serialization gave up
        depth: usize,
    },

    /// Query source names must not be empty
    #[error("invalid query source name '{0}'")]
    InvalidSourceName(String),

    /// A replace operation needs the element identifier
    #[error("domain object of type '{type_name}' carries no 'id' member")]
    MissingIdentifier {
        /// Logical type of the object
        type_name: String,
    },

    /// A domain object could not be turned into members
    #[error("invalid domain object of type '{type_name}': {reason}")]
    InvalidDomainObject {
        /// Logical type of the object
        type_name: String,
        /// What went wrong
        reason: String,
    },

    /// `first` was called on a query that produced no results
    #[error("query produced no results")]
    EmptyResult,

    /// Settings could not be loaded
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Error reported by the execution transport, propagated untouched
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Specialized Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// Create an unknown mapping error
    pub fn unknown_mapping(identifier: impl Into<String>) -> Self {
        Self::UnknownMapping {
            identifier: identifier.into(),
        }
    }

    /// Create a value range error
    pub fn value_range(context: impl Into<String>, value: i64, max: i64) -> Self {
        Self::ValueRange {
            context: context.into(),
            value,
            max,
        }
    }

    /// Wrap an error coming from the transport layer
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }

    /// Check if this error stems from configuration rather than from a query
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnconfiguredSerializer
                | Self::UnconfiguredExecutor
                | Self::InvalidMappingExpression { .. }
                | Self::InvalidSourceName(_)
                | Self::InvalidConfiguration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_mapping_names_identifier() {
        let err = QueryError::unknown_mapping("Person.age");
        assert_eq!(err.to_string(), "unknown mapping for 'Person.age'");
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_value_range_message() {
        let err = QueryError::value_range("limit", 4_294_967_296, i32::MAX as i64);
        assert!(err.to_string().contains("'limit'"));
        assert!(err.to_string().contains("2147483647"));
    }

    #[test]
    fn test_configuration_errors() {
        assert!(QueryError::UnconfiguredSerializer.is_configuration_error());
        assert!(QueryError::InvalidSourceName(String::new()).is_configuration_error());
        assert!(!QueryError::SerializationLoop { depth: 64 }.is_configuration_error());
    }
}
