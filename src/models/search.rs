use serde_json::{json, Map, Value};

use crate::compiler::facet::{aggregations_to_dsl, Aggregation};
use crate::compiler::sort::SortClause;
use crate::compiler::source::SourceFields;
use crate::query::ast::QueryNode;

/// A fully compiled search, ready for the backend caller
#[derive(Clone, Debug)]
pub struct CompiledSearch {
    pub index: String,
    pub from: usize,
    pub size: usize,
    pub query: Box<dyn QueryNode>,
    /// Empty when sorting is disabled
    pub sort: Vec<SortClause>,
    pub aggregations: Vec<Aggregation>,
    pub source: SourceFields,
}

impl CompiledSearch {
    /// Backend request body
    ///
    /// `sort` and `aggs` are left out when empty.
    pub fn to_dsl(&self) -> Value {
        let mut body = Map::new();
        body.insert("from".to_string(), json!(self.from));
        body.insert("size".to_string(), json!(self.size));
        body.insert("query".to_string(), self.query.to_dsl());
        if !self.sort.is_empty() {
            let sort: Vec<Value> = self.sort.iter().map(SortClause::to_dsl).collect();
            body.insert("sort".to_string(), Value::Array(sort));
        }
        if !self.aggregations.is_empty() {
            body.insert("aggs".to_string(), aggregations_to_dsl(&self.aggregations));
        }
        body.insert(
            "_source".to_string(),
            json!({ "includes": self.source.includes, "excludes": self.source.excludes }),
        );
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::MatchAllQuery;

    #[test]
    fn test_minimal_body() {
        let search = CompiledSearch {
            index: "listings".to_string(),
            from: 0,
            size: 20,
            query: Box::new(MatchAllQuery),
            sort: Vec::new(),
            aggregations: Vec::new(),
            source: SourceFields::default(),
        };
        assert_eq!(
            search.to_dsl(),
            json!({
                "from": 0,
                "size": 20,
                "query": { "match_all": {} },
                "_source": { "includes": [], "excludes": [] }
            })
        );
    }

    #[test]
    fn test_sort_and_aggs_rendered() {
        let search = CompiledSearch {
            index: "listings".to_string(),
            from: 40,
            size: 20,
            query: Box::new(MatchAllQuery),
            sort: vec![SortClause::tiebreak()],
            aggregations: vec![Aggregation {
                name: "city".to_string(),
                field: "city".to_string(),
                size: 5,
                nested_paths: Vec::new(),
            }],
            source: SourceFields::default(),
        };
        let dsl = search.to_dsl();
        assert_eq!(dsl["sort"], json!([{ "_id": { "order": "desc" } }]));
        assert_eq!(dsl["aggs"]["city"]["terms"]["size"], json!(5));
    }
}
