//! Range query - matches documents with field values in a range

use crate::query::ast::QueryNode;
use crate::query::types::{RangeBounds, RangeValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Query that matches documents with field values within a specified range
///
/// Works with numeric, date and keyword fields. Unset bounds are open.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    /// Field to search in
    pub field: String,
    /// Range bounds (gte, gt, lte, lt)
    #[serde(flatten)]
    pub bounds: RangeBounds,
}

impl RangeQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            bounds: RangeBounds::default(),
        }
    }

    pub fn gte(mut self, value: RangeValue) -> Self {
        self.bounds.gte = Some(value);
        self
    }

    pub fn gt(mut self, value: RangeValue) -> Self {
        self.bounds.gt = Some(value);
        self
    }

    pub fn lte(mut self, value: RangeValue) -> Self {
        self.bounds.lte = Some(value);
        self
    }

    pub fn lt(mut self, value: RangeValue) -> Self {
        self.bounds.lt = Some(value);
        self
    }
}

impl QueryNode for RangeQuery {
    fn query_type(&self) -> &'static str {
        "range"
    }

    fn to_dsl(&self) -> Value {
        json!({ "range": { self.field.as_str(): self.bounds.to_dsl() } })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
