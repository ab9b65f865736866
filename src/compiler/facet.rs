//! Facet compiler: one terms aggregation per requested field

use crate::config::IndexSettings;
use crate::query::facet::Facets;
use crate::query::query_string::FacetParser;
use crate::schema::IndexSnapshot;
use crate::Result;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Terms aggregation over one field, ordered by document count
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregation {
    /// Aggregation name, the field's dotted name
    pub name: String,
    pub field: String,
    pub size: usize,
    /// Nested ancestors of the field, outermost first
    pub nested_paths: Vec<String>,
}

impl Aggregation {
    /// Render as a `(name, body)` pair for the backend `aggs` object
    pub fn to_dsl(&self) -> (String, Value) {
        let mut body = json!({
            "terms": {
                "field": self.field,
                "size": self.size,
                "order": { "_count": "desc" }
            }
        });
        for path in self.nested_paths.iter().rev() {
            body = json!({
                "nested": { "path": path },
                "aggs": { self.name.as_str(): body }
            });
        }
        (self.name.clone(), body)
    }
}

/// Render a list of aggregations as one backend `aggs` object
pub fn aggregations_to_dsl(aggregations: &[Aggregation]) -> Value {
    let map: Map<String, Value> = aggregations.iter().map(Aggregation::to_dsl).collect();
    Value::Object(map)
}

pub struct FacetCompiler<'a> {
    schema: &'a IndexSnapshot,
    settings: &'a IndexSettings,
}

impl<'a> FacetCompiler<'a> {
    pub fn new(schema: &'a IndexSnapshot, settings: &'a IndexSettings) -> Self {
        Self { schema, settings }
    }

    /// Parse and compile a facet list. `size` of `None` or zero uses the
    /// index default.
    pub fn compile(&self, text: &str, size: Option<usize>) -> Result<Vec<Aggregation>> {
        let facets = FacetParser::new(text)?.with_schema(self.schema).parse()?;
        Ok(self.compile_facets(&facets, size))
    }

    pub fn compile_facets(&self, facets: &Facets, size: Option<usize>) -> Vec<Aggregation> {
        let size = size
            .filter(|s| *s > 0)
            .unwrap_or(self.settings.default_facet_size);

        facets
            .fields()
            .iter()
            .map(|field| {
                if field.is_not() {
                    debug!(field = %field, "NOT on a facet field has no effect");
                }
                Aggregation {
                    name: field.name(),
                    field: field.name(),
                    size,
                    nested_paths: field.nested_paths(),
                }
            })
            .collect()
    }
}
