//! Compiled backend query representation
//!
//! This module defines the `QueryNode` trait that every compiled query
//! primitive implements. The gateway never executes a node; it only renders
//! it into the JSON body understood by the backend search engine.

use serde_json::{json, Value};
use std::fmt::Debug;

/// Core trait for all compiled query nodes
///
/// Nodes form a tree mirroring the backend's query structure. A node is built
/// once per request by the compilers and rendered with [`QueryNode::to_dsl`].
pub trait QueryNode: Send + Sync + Debug {
    /// Backend query type name, e.g. `bool` or `geo_polygon`
    fn query_type(&self) -> &'static str;

    /// Render the node as a backend query object
    fn to_dsl(&self) -> Value;

    /// Clone this query node into a boxed trait object
    fn clone_box(&self) -> Box<dyn QueryNode>;
}

impl Clone for Box<dyn QueryNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A query that matches all documents
#[derive(Clone, Debug, Default)]
pub struct MatchAllQuery;

impl QueryNode for MatchAllQuery {
    fn query_type(&self) -> &'static str {
        "match_all"
    }

    fn to_dsl(&self) -> Value {
        json!({ "match_all": {} })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
