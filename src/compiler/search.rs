//! Whole-request compilation
//!
//! [`SearchCompiler`] loads the current mapping snapshot and settings of the
//! target index once, then runs every part of the request against that one
//! view: filter, free text, sort, facets, source fields and paging.

use std::sync::Arc;
use std::time::Instant;

use crate::config::{GatewayConfig, IndexSettings, SettingsRegistry};
use crate::error::GatewayError;
use crate::metrics::GatewayMetrics;
use crate::models::{CompiledSearch, SearchRequest};
use crate::query::ast::{MatchAllQuery, QueryNode};
use crate::query::fragment::MAX_FRAGMENTS;
use crate::query::nodes::{BoolQuery, MultiMatchQuery, NestedQuery};
use crate::query::query_string::QueryParser;
use crate::schema::{IndexSnapshot, MappingRegistry};
use crate::Result;
use tracing::debug;

use super::facet::FacetCompiler;
use super::filter::FilterCompiler;
use super::sort::SortCompiler;
use super::source::{SourceFieldCompiler, SourceFields};

pub struct SearchCompiler {
    mappings: Arc<MappingRegistry>,
    settings: Arc<SettingsRegistry>,
    sources: Arc<SourceFieldCompiler>,
    metrics: Option<Arc<GatewayMetrics>>,
    max_fragments: usize,
}

impl SearchCompiler {
    pub fn new(
        mappings: Arc<MappingRegistry>,
        settings: Arc<SettingsRegistry>,
        sources: Arc<SourceFieldCompiler>,
    ) -> Self {
        Self {
            mappings,
            settings,
            sources,
            metrics: None,
            max_fragments: MAX_FRAGMENTS,
        }
    }

    /// Compiler with fresh registries seeded from `config`
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            Arc::new(MappingRegistry::new()),
            Arc::new(SettingsRegistry::from_config(config)),
            Arc::new(SourceFieldCompiler::new()),
        )
        .with_max_fragments(config.max_fragments)
    }

    pub fn with_metrics(mut self, metrics: Arc<GatewayMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_max_fragments(mut self, max: usize) -> Self {
        self.max_fragments = max;
        self
    }

    pub fn mappings(&self) -> &Arc<MappingRegistry> {
        &self.mappings
    }

    pub fn settings(&self) -> &Arc<SettingsRegistry> {
        &self.settings
    }

    pub fn sources(&self) -> &Arc<SourceFieldCompiler> {
        &self.sources
    }

    /// Compile a search request
    pub fn compile(&self, request: &SearchRequest) -> Result<CompiledSearch> {
        let started = Instant::now();
        let result = self.compile_search(request);

        match &result {
            Ok(_) => {
                let elapsed = started.elapsed().as_secs_f64();
                debug!(index = %request.index, elapsed, "compiled search");
                if let Some(metrics) = &self.metrics {
                    metrics.record_compile(elapsed);
                }
            }
            Err(e) => {
                debug!(index = %request.index, error = %e, "rejected search");
                if let Some(metrics) = &self.metrics {
                    metrics.record_error(e.error_type());
                }
            }
        }
        result
    }

    /// Source fields for fetching documents by id
    pub fn compile_by_id(&self, request: &SearchRequest) -> Result<SourceFields> {
        let schema = self.mappings.snapshot(&request.index)?;
        let settings = self.settings.get(&request.index);
        self.sources.compile(
            &schema,
            &settings,
            &request.include_fields,
            &request.exclude_fields,
        )
    }

    fn compile_search(&self, request: &SearchRequest) -> Result<CompiledSearch> {
        let schema = self.mappings.snapshot(&request.index)?;
        let settings = self.settings.get(&request.index);

        let mut query = BoolQuery::new();
        if let Some(text_query) = self.compile_text(&schema, &settings, request)? {
            query = query.must_boxed(text_query);
        }
        query = query.filter_boxed(self.compile_filter(&schema, &settings, request)?);

        let sort = SortCompiler::new(&schema, &settings)
            .with_metrics(self.metrics.as_deref())
            .compile(request.sort.as_deref(), request.disable_sort);

        let aggregations = match non_blank(request.facets.as_deref()) {
            Some(facets) => {
                FacetCompiler::new(&schema, &settings).compile(facets, request.facet_size)?
            }
            None => Vec::new(),
        };

        let source = self.sources.compile(
            &schema,
            &settings,
            &request.include_fields,
            &request.exclude_fields,
        )?;

        let (from, size) = page(request.from, request.size, &settings);

        Ok(CompiledSearch {
            index: request.index.clone(),
            from,
            size,
            query: Box::new(query),
            sort,
            aggregations,
            source,
        })
    }

    fn compile_filter(
        &self,
        schema: &IndexSnapshot,
        settings: &IndexSettings,
        request: &SearchRequest,
    ) -> Result<Box<dyn QueryNode>> {
        let Some(filter) = non_blank(request.filter.as_deref()) else {
            return Ok(Box::new(MatchAllQuery));
        };
        let list = QueryParser::new(filter)?
            .with_schema(schema)
            .with_max_fragments(self.max_fragments)
            .parse()?;
        Ok(Box::new(FilterCompiler::new(settings).compile(&list)?))
    }

    /// Free-text part of the request, one multi_match per nested scope
    fn compile_text(
        &self,
        schema: &IndexSnapshot,
        settings: &IndexSettings,
        request: &SearchRequest,
    ) -> Result<Option<Box<dyn QueryNode>>> {
        let Some(q) = non_blank(request.q.as_deref()) else {
            return Ok(None);
        };
        let q = q.trim();

        let requested: Vec<&String> = request
            .fields
            .iter()
            .filter(|f| !f.trim().is_empty())
            .collect();
        let fields: Vec<&String> = if requested.is_empty() {
            settings.query_default_fields.iter().collect()
        } else {
            requested
        };

        // (nested paths, fields) in first-seen order
        let mut groups: Vec<(Vec<String>, Vec<String>)> = Vec::new();
        for spec in fields {
            let spec = spec.trim();
            let name = match spec.split_once('^') {
                Some((name, boost)) => {
                    if !boost.parse::<f64>().is_ok_and(|b| b > 0.0) {
                        return Err(GatewayError::InvalidRequest(format!(
                            "invalid boost in field [{spec}]"
                        )));
                    }
                    name
                }
                None => spec,
            };
            let paths = schema.resolve(name, true)?.nested_paths();
            match groups.iter_mut().find(|(p, _)| *p == paths) {
                Some((_, members)) => members.push(spec.to_string()),
                None => groups.push((paths, vec![spec.to_string()])),
            }
        }
        if groups.is_empty() {
            groups.push((Vec::new(), Vec::new()));
        }

        let operator = request.operator.unwrap_or_default();
        let mm = request
            .mm
            .clone()
            .unwrap_or_else(|| settings.default_minimum_should_match.clone());

        let mut queries: Vec<Box<dyn QueryNode>> = groups
            .into_iter()
            .map(|(paths, fields)| {
                let query = MultiMatchQuery::new(q, fields)
                    .with_operator(operator)
                    .with_minimum_should_match(mm.clone());
                NestedQuery::wrap(&paths, Box::new(query))
            })
            .collect();

        if queries.len() == 1 {
            return Ok(queries.pop());
        }
        let combined = queries
            .into_iter()
            .fold(BoolQuery::new(), BoolQuery::should_boxed);
        Ok(Some(Box::new(combined)))
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Clamp paging parameters against the index settings
fn page(from: Option<i64>, size: Option<i64>, settings: &IndexSettings) -> (usize, usize) {
    let from = from.unwrap_or(0).max(0) as usize;
    let size = match size {
        Some(size) if size >= 0 && (size as usize) <= settings.max_size => size as usize,
        _ => settings.default_size,
    };
    (from, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::MatchOperator;
    use crate::schema::{FieldMapping, FieldType, IndexMapping};
    use serde_json::json;

    fn compiler() -> SearchCompiler {
        let config = GatewayConfig::default().with_index(
            "listings",
            IndexSettings::default()
                .with_default_sort("id ASC")
                .with_source_includes(&["id", "geo"])
                .with_query_default_fields(&["title"]),
        );
        let compiler = SearchCompiler::from_config(&config);
        compiler.mappings().publish(
            "listings",
            IndexMapping::new()
                .field("id", FieldMapping::keyword())
                .field("title", FieldMapping::text())
                .field("city", FieldMapping::keyword())
                .field("price", FieldMapping::long())
                .field("geo", FieldMapping::geo_point())
                .field(
                    "units",
                    FieldMapping::new(FieldType::Nested)
                        .property("description", FieldMapping::text()),
                ),
        );
        compiler
    }

    #[test]
    fn test_page() {
        let settings = IndexSettings::default();
        assert_eq!(page(None, None, &settings), (0, 20));
        assert_eq!(page(Some(-5), Some(-1), &settings), (0, 20));
        assert_eq!(page(Some(40), Some(200), &settings), (40, 200));
        assert_eq!(page(Some(40), Some(201), &settings), (40, 20));
        assert_eq!(page(None, Some(0), &settings), (0, 0));
    }

    #[test]
    fn test_unknown_index() {
        let err = compiler().compile(&SearchRequest::new("nope")).unwrap_err();
        assert!(matches!(err, GatewayError::IndexNotFound(_)));
    }

    #[test]
    fn test_empty_request() {
        let dsl = compiler()
            .compile(&SearchRequest::new("listings"))
            .unwrap()
            .to_dsl();
        assert_eq!(
            dsl["query"],
            json!({ "bool": { "filter": [ { "match_all": {} } ] } })
        );
        assert_eq!(
            dsl["sort"],
            json!([{ "id": { "order": "asc" } }, { "_id": { "order": "desc" } }])
        );
        assert_eq!(dsl["_source"]["includes"], json!(["id", "geo"]));
    }

    #[test]
    fn test_filter_errors_propagate() {
        let compiler = compiler();
        let request = SearchRequest::new("listings").with_filter("missing EQ 1");
        assert!(matches!(
            compiler.compile(&request),
            Err(GatewayError::InvalidField { .. })
        ));

        let request = SearchRequest::new("listings").with_filter("city EQ");
        assert!(matches!(
            compiler.compile(&request),
            Err(GatewayError::Syntax { .. })
        ));
    }

    #[test]
    fn test_fragment_limit_from_config() {
        let compiler = compiler().with_max_fragments(2);
        let request =
            SearchRequest::new("listings").with_filter("price GT 1 AND price LT 9 AND city EQ 'a'");
        assert!(matches!(
            compiler.compile(&request),
            Err(GatewayError::FragmentLimit { max: 2, .. })
        ));
    }

    #[test]
    fn test_free_text_default_fields() {
        let search = compiler()
            .compile(&SearchRequest::new("listings").with_text("  casa  ", &[]))
            .unwrap();
        let dsl = search.to_dsl();
        assert_eq!(
            dsl["query"]["bool"]["must"][0],
            json!({
                "multi_match": {
                    "query": "casa",
                    "fields": ["title"],
                    "operator": "or",
                    "minimum_should_match": "75%"
                }
            })
        );
    }

    #[test]
    fn test_free_text_nested_groups() {
        let request = SearchRequest::new("listings")
            .with_text("casa", &["title^2", "units.description"])
            .with_operator(MatchOperator::And)
            .with_minimum_should_match("1");
        let dsl = compiler().compile(&request).unwrap().to_dsl();

        let should = &dsl["query"]["bool"]["must"][0]["bool"]["should"];
        assert_eq!(should.as_array().map(Vec::len), Some(2));
        assert_eq!(should[0]["multi_match"]["fields"], json!(["title^2"]));
        assert_eq!(should[1]["nested"]["path"], json!("units"));
        assert_eq!(
            should[1]["nested"]["query"]["multi_match"]["operator"],
            json!("and")
        );
    }

    #[test]
    fn test_free_text_bad_fields() {
        let compiler = compiler();
        let request = SearchRequest::new("listings").with_text("casa", &["title^x"]);
        assert!(matches!(
            compiler.compile(&request),
            Err(GatewayError::InvalidRequest(_))
        ));
        let request = SearchRequest::new("listings").with_text("casa", &["nope"]);
        assert!(compiler.compile(&request).is_err());
    }

    #[test]
    fn test_metrics_recorded() {
        let metrics = Arc::new(GatewayMetrics::new().unwrap());
        let compiler = compiler().with_metrics(metrics.clone());

        compiler.compile(&SearchRequest::new("listings")).unwrap();
        assert!(compiler
            .compile(&SearchRequest::new("listings").with_filter("("))
            .is_err());

        assert_eq!(metrics.requests_compiled.get(), 1.0);
        assert_eq!(
            metrics
                .parse_errors
                .with_label_values(&["syntax_error"])
                .get(),
            1.0
        );
    }

    #[test]
    fn test_compile_by_id() {
        let request = SearchRequest::new("listings").with_exclude_fields(&["geo"]);
        let fields = compiler().compile_by_id(&request).unwrap();
        assert_eq!(fields.includes, vec!["id".to_string()]);
        assert!(fields.excludes.is_empty());
    }
}
