use serde::{Deserialize, Serialize};

use crate::query::types::MatchOperator;

/// Search request as received from the transport layer
///
/// Every DSL part is raw text; compilation parses and validates it against
/// the target index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub index: String,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub disable_sort: bool,
    pub facets: Option<String>,
    pub facet_size: Option<usize>,
    pub include_fields: Vec<String>,
    pub exclude_fields: Vec<String>,
    /// Free-text query
    pub q: Option<String>,
    /// Fields searched by `q`, each optionally `name^boost`
    pub fields: Vec<String>,
    pub operator: Option<MatchOperator>,
    /// minimum_should_match for `q`
    pub mm: Option<String>,
    pub from: Option<i64>,
    pub size: Option<i64>,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_disable_sort(mut self, disable: bool) -> Self {
        self.disable_sort = disable;
        self
    }

    pub fn with_facets(mut self, facets: impl Into<String>, size: Option<usize>) -> Self {
        self.facets = Some(facets.into());
        self.facet_size = size;
        self
    }

    pub fn with_include_fields(mut self, fields: &[&str]) -> Self {
        self.include_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_exclude_fields(mut self, fields: &[&str]) -> Self {
        self.exclude_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_text(mut self, q: impl Into<String>, fields: &[&str]) -> Self {
        self.q = Some(q.into());
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_operator(mut self, operator: MatchOperator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn with_minimum_should_match(mut self, mm: impl Into<String>) -> Self {
        self.mm = Some(mm.into());
        self
    }

    pub fn with_page(mut self, from: i64, size: i64) -> Self {
        self.from = Some(from);
        self.size = Some(size);
        self
    }
}
