//! Output buffer of one serialization pass.

use super::cache::ParameterCache;
use super::RenderedQuery;
use crate::options::QueryOptions;
use crate::value::Value;
use std::collections::HashMap;

/// Query text, bound parameters and the parameter cache of one pass.
///
/// Handlers write through this; `inline_parameters` is fixed for the
/// whole pass.
#[derive(Debug)]
pub struct QueryWriter {
    text: String,
    params: HashMap<String, serde_json::Value>,
    cache: ParameterCache,
    inline_parameters: bool,
    options: QueryOptions,
}

impl QueryWriter {
    pub fn new(inline_parameters: bool, options: QueryOptions) -> Self {
        Self {
            text: String::new(),
            params: HashMap::new(),
            cache: ParameterCache::new(),
            inline_parameters,
            options,
        }
    }

    pub fn inline_parameters(&self) -> bool {
        self.inline_parameters
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Text written so far
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    /// Register `value` as a bound parameter and write its name
    pub fn bind(&mut self, value: &Value) {
        let name = self.cache.cache(value);
        self.params
            .entry(name.clone())
            .or_insert_with(|| value.to_json());
        self.text.push_str(&name);
    }

    /// Write a literal, inlined or bound depending on the pass
    pub fn write_literal(&mut self, value: &Value) {
        if !self.inline_parameters {
            self.bind(value);
            return;
        }

        match value {
            Value::Null => self.push_str("null"),
            Value::Bool(b) => self.push_str(if *b { "true" } else { "false" }),
            Value::Int(i) => self.push_str(&i.to_string()),
            Value::Long(l) => self.push_str(&l.to_string()),
            Value::Float(f) => self.push_str(&format!("{f:?}")),
            Value::String(s) => {
                self.text.push('\'');
                self.text.push_str(&escape(s, '\''));
                self.text.push('\'');
            }
            other => self.push_str(&other.to_json().to_string()),
        }
    }

    /// Write a double-quoted property key
    pub fn write_key(&mut self, key: &str) {
        self.text.push('"');
        self.text.push_str(&escape(key, '"'));
        self.text.push('"');
    }

    pub(crate) fn finish(self) -> RenderedQuery {
        RenderedQuery {
            query: self.text,
            params: self.params,
        }
    }
}

fn escape(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == quote || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
