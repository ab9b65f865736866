//! Sort compiler
//!
//! Turns the requested sort text into backend sort clauses. A request whose
//! sort is blank, malformed or names an unknown field gets the index's
//! default sort instead; a failing default leaves only the tiebreak. Every
//! compiled sort ends with `_id DESC` so paging is deterministic, unless it
//! already orders by `_id`.

use crate::config::IndexSettings;
use crate::error::GatewayError;
use crate::metrics::GatewayMetrics;
use crate::query::ast::QueryNode;
use crate::query::field::ID_FIELD;
use crate::query::query_string::SortParser;
use crate::query::sort::{SortItem, SortKind};
use crate::query::types::SortOrder;
use crate::query::value::GeoPoint;
use crate::schema::IndexSnapshot;
use crate::Result;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::filter::FilterCompiler;

/// Nested scope of a field sort, outermost path first
#[derive(Clone, Debug)]
pub struct NestedSort {
    pub path: String,
    pub filter: Option<Box<dyn QueryNode>>,
    pub nested: Option<Box<NestedSort>>,
}

impl NestedSort {
    /// Chain of scopes for `paths`, with `filter` on the innermost one
    fn chain(paths: &[String], filter: Option<Box<dyn QueryNode>>) -> Option<Self> {
        let (innermost, outer) = paths.split_last()?;
        let mut scope = NestedSort {
            path: innermost.clone(),
            filter,
            nested: None,
        };
        for path in outer.iter().rev() {
            scope = NestedSort {
                path: path.clone(),
                filter: None,
                nested: Some(Box::new(scope)),
            };
        }
        Some(scope)
    }

    pub fn to_dsl(&self) -> Value {
        let mut body = Map::new();
        body.insert("path".to_string(), json!(self.path));
        if let Some(filter) = &self.filter {
            body.insert("filter".to_string(), filter.to_dsl());
        }
        if let Some(nested) = &self.nested {
            body.insert("nested".to_string(), nested.to_dsl());
        }
        Value::Object(body)
    }
}

/// One compiled backend sort clause
#[derive(Clone, Debug)]
pub enum SortClause {
    Field {
        field: String,
        order: SortOrder,
        nested: Option<NestedSort>,
    },
    /// Relevance, always descending
    Score,
    GeoDistance {
        field: String,
        origin: GeoPoint,
        order: SortOrder,
        nested: Option<NestedSort>,
    },
}

impl SortClause {
    /// The fixed `_id DESC` tiebreak
    pub fn tiebreak() -> Self {
        SortClause::Field {
            field: ID_FIELD.to_string(),
            order: SortOrder::Desc,
            nested: None,
        }
    }

    pub fn field_name(&self) -> &str {
        match self {
            SortClause::Field { field, .. } | SortClause::GeoDistance { field, .. } => field,
            SortClause::Score => "_score",
        }
    }

    pub fn to_dsl(&self) -> Value {
        match self {
            SortClause::Field {
                field,
                order,
                nested,
            } => {
                let mut body = Map::new();
                body.insert("order".to_string(), json!(order.as_str()));
                if let Some(nested) = nested {
                    body.insert("nested".to_string(), nested.to_dsl());
                }
                json!({ field.as_str(): body })
            }
            SortClause::Score => json!({ "_score": { "order": "desc" } }),
            SortClause::GeoDistance {
                field,
                origin,
                order,
                nested,
            } => {
                let mut body = Map::new();
                body.insert(field.clone(), origin.to_dsl());
                body.insert("order".to_string(), json!(order.as_str()));
                body.insert("unit".to_string(), json!("km"));
                if let Some(nested) = nested {
                    body.insert("nested".to_string(), nested.to_dsl());
                }
                json!({ "_geo_distance": body })
            }
        }
    }
}

/// Compiles sorts for one index snapshot and its settings
pub struct SortCompiler<'a> {
    schema: &'a IndexSnapshot,
    settings: &'a IndexSettings,
    metrics: Option<&'a GatewayMetrics>,
}

impl<'a> SortCompiler<'a> {
    pub fn new(schema: &'a IndexSnapshot, settings: &'a IndexSettings) -> Self {
        Self {
            schema,
            settings,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Option<&'a GatewayMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Compile the requested sort, falling back to the index default
    ///
    /// Returns no clauses at all when sorting is disabled by the request or
    /// the index.
    pub fn compile(&self, requested: Option<&str>, disabled: bool) -> Vec<SortClause> {
        if disabled || self.settings.sort_disabled {
            debug!(index = %self.schema.index(), "sorting disabled");
            return Vec::new();
        }

        let requested = requested.unwrap_or_default();
        let mut clauses = match self.compile_text(requested) {
            Ok(clauses) => clauses,
            Err(e) => {
                debug!(
                    index = %self.schema.index(),
                    sort = %requested,
                    error = %e,
                    "falling back to default sort"
                );
                if let Some(metrics) = self.metrics {
                    metrics.record_sort_fallback();
                }
                self.default_clauses()
            }
        };

        if !clauses.iter().any(|clause| clause.field_name() == ID_FIELD) {
            clauses.push(SortClause::tiebreak());
        }
        clauses
    }

    fn default_clauses(&self) -> Vec<SortClause> {
        let default = self.settings.default_sort.as_str();
        if default.trim().is_empty() {
            return Vec::new();
        }
        self.compile_text(default).unwrap_or_else(|e| {
            warn!(
                index = %self.schema.index(),
                sort = %default,
                error = %e,
                "default sort is invalid, using tiebreak only"
            );
            Vec::new()
        })
    }

    /// Parse and compile sort text without any fallback
    pub fn compile_text(&self, text: &str) -> Result<Vec<SortClause>> {
        if text.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("empty sort".to_string()));
        }
        let sort = SortParser::new(text)?.with_schema(self.schema).parse()?;
        sort.items()
            .iter()
            .map(|item| self.compile_item(item))
            .collect()
    }

    fn compile_item(&self, item: &SortItem) -> Result<SortClause> {
        let paths = item.field.nested_paths();
        let filter = match &item.filter {
            Some(list) => Some(Box::new(
                FilterCompiler::new(self.settings)
                    .with_nested_scope(&paths)
                    .compile(list)?,
            ) as Box<dyn QueryNode>),
            None => None,
        };
        if filter.is_some() && paths.is_empty() {
            debug!(field = %item.field, "sortFilter ignored outside a nested path");
        }
        let nested = NestedSort::chain(&paths, filter);

        Ok(match &item.kind {
            SortKind::Score => SortClause::Score,
            SortKind::Field => SortClause::Field {
                field: item.field.name(),
                order: item.order,
                nested,
            },
            SortKind::Distance(origin) => SortClause::GeoDistance {
                field: item.field.name(),
                origin: *origin,
                order: item.order,
                nested,
            },
        })
    }
}
