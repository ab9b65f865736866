//! Exists query - matches documents holding any value for a field

use crate::query::ast::QueryNode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExistsQuery {
    pub field: String,
}

impl ExistsQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl QueryNode for ExistsQuery {
    fn query_type(&self) -> &'static str {
        "exists"
    }

    fn to_dsl(&self) -> Value {
        json!({ "exists": { "field": self.field } })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
