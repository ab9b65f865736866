//! Wildcard query - matches terms using wildcards
//!
//! Supports:
//! - `*` - matches any sequence of characters
//! - `?` - matches any single character
//!
//! Filters are written with SQL-style LIKE patterns; [`WildcardQuery::from_like`]
//! translates them.
//!
//! # Example
//!
//! ```rust
//! use searchgate::query::nodes::WildcardQuery;
//!
//! let query = WildcardQuery::from_like("title", "casa%");
//! assert_eq!(query.pattern, "casa*");
//! ```

use crate::query::ast::QueryNode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Query that matches terms using wildcard patterns
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WildcardQuery {
    /// Field to search in
    pub field: String,
    /// Backend wildcard pattern
    pub pattern: String,
}

impl WildcardQuery {
    pub fn new(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// Build from a LIKE pattern
    ///
    /// `%` and `_` become `*` and `?`; `\%` and `\_` are literal. Characters
    /// that are wildcards to the backend but not to LIKE (`*`, `?`) are
    /// escaped, and `\*` / `\?` pass through escaped.
    pub fn from_like(field: impl Into<String>, like: &str) -> Self {
        Self::new(field, like_to_wildcard(like))
    }
}

fn like_to_wildcard(like: &str) -> String {
    let mut pattern = String::with_capacity(like.len() + 4);
    let mut chars = like.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek() {
                Some('%') | Some('_') => {
                    if let Some(next) = chars.next() {
                        pattern.push(next);
                    }
                }
                Some('*') | Some('?') => {
                    pattern.push('\\');
                    if let Some(next) = chars.next() {
                        pattern.push(next);
                    }
                }
                _ => pattern.push_str("\\\\"),
            },
            '%' => pattern.push('*'),
            '_' => pattern.push('?'),
            '*' | '?' => {
                pattern.push('\\');
                pattern.push(ch);
            }
            _ => pattern.push(ch),
        }
    }
    pattern
}

impl QueryNode for WildcardQuery {
    fn query_type(&self) -> &'static str {
        "wildcard"
    }

    fn to_dsl(&self) -> Value {
        json!({ "wildcard": { self.field.as_str(): { "value": self.pattern } } })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
