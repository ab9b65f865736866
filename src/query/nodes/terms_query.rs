//! Terms query - match any of several exact values

use crate::query::ast::QueryNode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Query that matches documents whose field holds any of `values`
///
/// Equivalent to a bool query with multiple term queries in should clauses,
/// but rendered as a single backend primitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TermsQuery {
    pub field: String,
    pub values: Vec<Value>,
}

impl TermsQuery {
    pub fn new(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            values,
        }
    }

    pub fn add_value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }
}

impl QueryNode for TermsQuery {
    fn query_type(&self) -> &'static str {
        "terms"
    }

    fn to_dsl(&self) -> Value {
        json!({ "terms": { self.field.as_str(): self.values } })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
