//! Multi-match query - free text over several fields

use crate::query::ast::QueryNode;
use crate::query::types::MatchOperator;
use serde_json::{json, Map, Value};

/// Full-text query run against `fields`
///
/// Field names may carry a `^boost` suffix. With no fields the backend's
/// default search fields apply.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiMatchQuery {
    pub query: String,
    pub fields: Vec<String>,
    pub operator: MatchOperator,
    pub minimum_should_match: Option<String>,
}

impl MultiMatchQuery {
    pub fn new(query: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            query: query.into(),
            fields,
            operator: MatchOperator::default(),
            minimum_should_match: None,
        }
    }

    pub fn with_operator(mut self, operator: MatchOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn with_minimum_should_match(mut self, msm: impl Into<String>) -> Self {
        self.minimum_should_match = Some(msm.into());
        self
    }
}

impl QueryNode for MultiMatchQuery {
    fn query_type(&self) -> &'static str {
        "multi_match"
    }

    fn to_dsl(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), json!(self.query));
        if !self.fields.is_empty() {
            body.insert("fields".to_string(), json!(self.fields));
        }
        body.insert("operator".to_string(), json!(self.operator.as_str()));
        if let Some(msm) = &self.minimum_should_match {
            body.insert("minimum_should_match".to_string(), json!(msm));
        }
        json!({ "multi_match": body })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_match() {
        let query = MultiMatchQuery::new("casa praia", vec!["title^2".to_string(), "body".to_string()])
            .with_operator(MatchOperator::And)
            .with_minimum_should_match("75%");
        assert_eq!(
            query.to_dsl(),
            json!({
                "multi_match": {
                    "query": "casa praia",
                    "fields": ["title^2", "body"],
                    "operator": "and",
                    "minimum_should_match": "75%"
                }
            })
        );
    }

    #[test]
    fn test_default_fields_omitted() {
        let dsl = MultiMatchQuery::new("casa", Vec::new()).to_dsl();
        assert!(dsl["multi_match"].get("fields").is_none());
        assert_eq!(dsl["multi_match"]["operator"], json!("or"));
    }
}
