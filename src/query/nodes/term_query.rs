//! Term query - exact match on a field

use crate::query::ast::QueryNode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Query that matches documents whose field holds exactly `value`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    /// Field to search in
    pub field: String,
    /// Exact value to match
    pub value: Value,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl QueryNode for TermQuery {
    fn query_type(&self) -> &'static str {
        "term"
    }

    fn to_dsl(&self) -> Value {
        json!({ "term": { self.field.as_str(): { "value": self.value } } })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_query() {
        let query = TermQuery::new("address.city", "Rio");
        assert_eq!(query.query_type(), "term");
        assert_eq!(
            query.to_dsl(),
            json!({ "term": { "address.city": { "value": "Rio" } } })
        );
    }

    #[test]
    fn test_term_query_keeps_value_type() {
        assert_eq!(
            TermQuery::new("rooms", 3).to_dsl()["term"]["rooms"]["value"],
            json!(3)
        );
        assert_eq!(
            TermQuery::new("active", false).to_dsl()["term"]["active"]["value"],
            json!(false)
        );
    }
}
