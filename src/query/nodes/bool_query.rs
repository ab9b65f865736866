//! Boolean query - combines multiple clauses with AND, OR, NOT semantics

use crate::query::ast::QueryNode;
use serde_json::{json, Map, Value};

/// Boolean query combining multiple clauses
///
/// The boolean query supports four types of clauses:
/// - `must`: All clauses must match (AND)
/// - `should`: At least one clause should match (OR)
/// - `must_not`: No clause may match (NOT)
/// - `filter`: All clauses must match, without scoring
///
/// Empty clause lists are left out of the rendered query.
///
/// # Example
///
/// ```json
/// {
///   "bool": {
///     "must": [
///       { "term": { "city": "Rio" } }
///     ],
///     "must_not": [
///       { "term": { "status": "draft" } }
///     ]
///   }
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct BoolQuery {
    pub must: Vec<Box<dyn QueryNode>>,
    pub should: Vec<Box<dyn QueryNode>>,
    pub must_not: Vec<Box<dyn QueryNode>>,
    pub filter: Vec<Box<dyn QueryNode>>,
    /// Minimum number of should clauses that must match
    pub minimum_should_match: Option<String>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, query: impl QueryNode + 'static) -> Self {
        self.must.push(Box::new(query));
        self
    }

    pub fn should(mut self, query: impl QueryNode + 'static) -> Self {
        self.should.push(Box::new(query));
        self
    }

    pub fn must_not(mut self, query: impl QueryNode + 'static) -> Self {
        self.must_not.push(Box::new(query));
        self
    }

    pub fn filter(mut self, query: impl QueryNode + 'static) -> Self {
        self.filter.push(Box::new(query));
        self
    }

    pub fn must_boxed(mut self, query: Box<dyn QueryNode>) -> Self {
        self.must.push(query);
        self
    }

    pub fn should_boxed(mut self, query: Box<dyn QueryNode>) -> Self {
        self.should.push(query);
        self
    }

    pub fn must_not_boxed(mut self, query: Box<dyn QueryNode>) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn filter_boxed(mut self, query: Box<dyn QueryNode>) -> Self {
        self.filter.push(query);
        self
    }

    pub fn with_minimum_should_match(mut self, msm: impl Into<String>) -> Self {
        self.minimum_should_match = Some(msm.into());
        self
    }

    /// Check if this is an empty query
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }

    /// Get total number of clauses
    pub fn clause_count(&self) -> usize {
        self.must.len() + self.should.len() + self.must_not.len() + self.filter.len()
    }
}

fn render(clauses: &[Box<dyn QueryNode>]) -> Value {
    clauses.iter().map(|q| q.to_dsl()).collect()
}

impl QueryNode for BoolQuery {
    fn query_type(&self) -> &'static str {
        "bool"
    }

    fn to_dsl(&self) -> Value {
        let mut body = Map::new();
        for (occur, clauses) in [
            ("must", &self.must),
            ("should", &self.should),
            ("must_not", &self.must_not),
            ("filter", &self.filter),
        ] {
            if !clauses.is_empty() {
                body.insert(occur.to_string(), render(clauses));
            }
        }
        if let Some(msm) = &self.minimum_should_match {
            body.insert("minimum_should_match".to_string(), json!(msm));
        }
        json!({ "bool": body })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
