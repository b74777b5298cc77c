//! Query options and query source settings.
//!
//! Options are read by the serializer and strategy layer. Settings bundle
//! everything a query source can be configured with from a TOML file:
//!
//! ```toml
//! name = "g"
//! exclude_strategies = ["SubgraphStrategy"]
//!
//! [options]
//! inline_parameters = false
//! workaround_tinkerpop_2112 = true
//! ```

use crate::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Named flags recognized by the serializer and strategies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Inline literals into the query text instead of binding them
    pub inline_parameters: bool,
    /// Omit `single` cardinality on `property` steps (TINKERPOP-2112)
    pub workaround_tinkerpop_2112: bool,
}

/// Query source configuration loadable from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Traversal source name the compiled text starts with
    pub name: String,
    /// Server-side strategies to disable
    pub exclude_strategies: Vec<String>,
    /// Serializer and strategy options
    pub options: QueryOptions,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            name: "g".to_string(),
            exclude_strategies: Vec::new(),
            options: QueryOptions::default(),
        }
    }
}

impl SourceSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> QueryResult<Self> {
        toml::from_str(content).map_err(|e| QueryError::InvalidConfiguration(e.to_string()))
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::InvalidConfiguration(format!("{}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }
}
