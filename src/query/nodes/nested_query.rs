//! Nested query - scopes an inner query to one sub-document of a nested path

use crate::query::ast::QueryNode;
use serde_json::{json, Value};

/// Runs `query` against each sub-document under `path` independently
///
/// A document matches when at least one of its sub-documents matches the
/// whole inner query.
#[derive(Clone, Debug)]
pub struct NestedQuery {
    pub path: String,
    pub query: Box<dyn QueryNode>,
}

impl NestedQuery {
    pub fn new(path: impl Into<String>, query: Box<dyn QueryNode>) -> Self {
        Self {
            path: path.into(),
            query,
        }
    }

    /// Wrap `query` once per path, innermost path first
    ///
    /// `paths` is ordered outermost first, as returned by
    /// [`Field::nested_paths`](crate::query::field::Field::nested_paths).
    pub fn wrap(paths: &[String], query: Box<dyn QueryNode>) -> Box<dyn QueryNode> {
        paths
            .iter()
            .rev()
            .fold(query, |inner, path| -> Box<dyn QueryNode> {
                Box::new(NestedQuery::new(path.clone(), inner))
            })
    }
}

impl QueryNode for NestedQuery {
    fn query_type(&self) -> &'static str {
        "nested"
    }

    fn to_dsl(&self) -> Value {
        json!({ "nested": { "path": self.path, "query": self.query.to_dsl() } })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
