//! Filter compiler: lowers a [`FragmentList`] into backend bool queries
//!
//! Each item is routed by the logical operator joining it to its
//! predecessor. The first item borrows the operator of the second, so
//! `a AND b` puts both in `must` and `a OR b` puts both in `should`.
//! Negated items go to `must_not` under AND, and into a `should` clause
//! holding `bool { must_not }` under OR.
//!
//! Leaves below nested paths are scoped with nested queries. Sibling leaves
//! with the same outermost nested path and routing operator share one nested
//! query, and deeper paths are grouped the same way inside it, so
//! `units.kind EQ 'A' AND units.rooms.area GT 10` requires both on the same
//! `units` sub-document.

use crate::config::IndexSettings;
use crate::error::GatewayError;
use crate::query::ast::QueryNode;
use crate::query::filter::Filter;
use crate::query::fragment::{FragmentList, QueryFragment};
use crate::query::nodes::{
    BoolQuery, ExistsQuery, GeoBoundingBoxQuery, GeoDistanceQuery, GeoPolygonQuery, NestedQuery,
    RangeQuery, TermQuery, TermsQuery, WildcardQuery,
};
use crate::query::types::{LogicalOperator, RelationalOperator};
use crate::query::value::Value;
use crate::Result;

/// A compiled clause waiting to be placed in the parent bool query
enum Slot {
    Clause {
        operator: LogicalOperator,
        negated: bool,
        query: Box<dyn QueryNode>,
    },
    NestedGroup {
        operator: LogicalOperator,
        path: String,
        members: Vec<Scoped>,
    },
}

/// Leaf query still missing the nested scopes below its group's path
struct Scoped {
    paths: Vec<String>,
    query: Box<dyn QueryNode>,
}

/// Compiles parsed filter expressions for one index
pub struct FilterCompiler {
    near_distance: String,
    /// Nested paths the caller already scopes, outermost first
    scope: Vec<String>,
}

impl FilterCompiler {
    pub fn new(settings: &IndexSettings) -> Self {
        Self {
            near_distance: settings.near_distance.clone(),
            scope: Vec::new(),
        }
    }

    /// Compile relative to an enclosing nested scope, as sort filters are.
    /// Leading nested paths of a field that `paths` covers get no nested
    /// query of their own.
    pub fn with_nested_scope(mut self, paths: &[String]) -> Self {
        self.scope = paths.to_vec();
        self
    }

    /// Compile a whole expression into one bool query
    pub fn compile(&self, list: &FragmentList) -> Result<BoolQuery> {
        let items = list.items();
        let mut slots: Vec<Slot> = Vec::with_capacity(items.len());

        for (i, item) in items.iter().enumerate() {
            let operator = routing_operator(list, i);

            match &item.fragment {
                QueryFragment::List(inner) => slots.push(Slot::Clause {
                    operator,
                    negated: item.not,
                    query: Box::new(self.compile(inner)?),
                }),
                QueryFragment::Filter(filter) => {
                    let (query, intrinsic) = self.compile_leaf(filter)?;
                    let negated = item.not ^ intrinsic;
                    let paths = self.relative_paths(filter.field().nested_paths());

                    if paths.is_empty() {
                        slots.push(Slot::Clause {
                            operator,
                            negated,
                            query,
                        });
                    } else if negated {
                        slots.push(Slot::Clause {
                            operator,
                            negated,
                            query: NestedQuery::wrap(&paths, query),
                        });
                    } else {
                        add_to_group(&mut slots, operator, paths, query);
                    }
                }
            }
        }

        Ok(slots.into_iter().fold(BoolQuery::new(), place))
    }

    /// Drop the leading paths already covered by the enclosing scope
    fn relative_paths(&self, paths: Vec<String>) -> Vec<String> {
        let covered = self
            .scope
            .iter()
            .zip(&paths)
            .take_while(|(scope, path)| scope == path)
            .count();
        paths.into_iter().skip(covered).collect()
    }

    /// Compile one leaf. The flag is set when the predicate is inherently
    /// negative (NOT_EQUAL, EQUAL null) and was compiled as its positive form.
    fn compile_leaf(&self, filter: &Filter) -> Result<(Box<dyn QueryNode>, bool)> {
        use RelationalOperator::*;

        let field = filter.field().name();
        let operator = filter.operator();
        let value = filter.value();

        let compiled: (Box<dyn QueryNode>, bool) = match (operator, value) {
            (Equal, Value::Null) => (Box::new(ExistsQuery::new(field)), true),
            (NotEqual, Value::Null) => (Box::new(ExistsQuery::new(field)), false),
            (Equal, v) => (Box::new(TermQuery::new(field, v.to_dsl())), false),
            (NotEqual, v) => (Box::new(TermQuery::new(field, v.to_dsl())), true),
            (GreaterThan | GreaterOrEqual | LessThan | LessOrEqual, v) => {
                let bound = v
                    .to_range_value()
                    .ok_or_else(|| unexpected(operator, value))?;
                let query = RangeQuery::new(field);
                let query = match operator {
                    GreaterThan => query.gt(bound),
                    GreaterOrEqual => query.gte(bound),
                    LessThan => query.lt(bound),
                    _ => query.lte(bound),
                };
                (Box::new(query), false)
            }
            (Range, Value::List(bounds)) => match bounds.as_slice() {
                [from, to] => {
                    let (Some(from), Some(to)) = (from.to_range_value(), to.to_range_value())
                    else {
                        return Err(unexpected(operator, value));
                    };
                    (Box::new(RangeQuery::new(field).gte(from).lte(to)), false)
                }
                _ => return Err(unexpected(operator, value)),
            },
            (In, Value::List(items)) => (
                Box::new(TermsQuery::new(field, items.iter().map(Value::to_dsl).collect())),
                false,
            ),
            (Like, Value::String(pattern)) => {
                (Box::new(WildcardQuery::from_like(field, pattern)), false)
            }
            (Viewport, Value::Viewport(ne, sw)) => {
                (Box::new(GeoBoundingBoxQuery::new(field, *ne, *sw)), false)
            }
            (Polygon, Value::Polygon(points)) => {
                (Box::new(GeoPolygonQuery::new(field, points.clone())), false)
            }
            (Near, Value::Point(origin)) => (
                Box::new(GeoDistanceQuery::new(field, *origin, self.near_distance.clone())),
                false,
            ),
            _ => return Err(unexpected(operator, value)),
        };
        Ok(compiled)
    }
}

/// Operator deciding where item `index` of `list` goes
fn routing_operator(list: &FragmentList, index: usize) -> LogicalOperator {
    let items = list.items();
    let own = items.get(index).and_then(|item| item.logical_operator);
    let borrowed = if index == 0 {
        items.get(1).and_then(|item| item.logical_operator)
    } else {
        None
    };
    own.or(borrowed).unwrap_or(LogicalOperator::And)
}

/// Add a non-negated nested leaf to the group of its outermost path,
/// opening a new group at this position when there is none
fn add_to_group(
    slots: &mut Vec<Slot>,
    operator: LogicalOperator,
    mut paths: Vec<String>,
    query: Box<dyn QueryNode>,
) {
    let path = paths.remove(0);
    let member = Scoped { paths, query };

    let existing = slots.iter_mut().find_map(|slot| match slot {
        Slot::NestedGroup {
            operator: group_op,
            path: group_path,
            members,
        } if *group_op == operator && *group_path == path => Some(members),
        _ => None,
    });

    match existing {
        Some(members) => members.push(member),
        None => slots.push(Slot::NestedGroup {
            operator,
            path,
            members: vec![member],
        }),
    }
}

fn place(parent: BoolQuery, slot: Slot) -> BoolQuery {
    match slot {
        Slot::Clause {
            operator,
            negated,
            query,
        } => route(parent, operator, negated, query),
        Slot::NestedGroup {
            operator,
            path,
            members,
        } => route(parent, operator, false, nest(operator, path, members)),
    }
}

/// One nested query over `path`; members with deeper paths are grouped again
fn nest(operator: LogicalOperator, path: String, members: Vec<Scoped>) -> Box<dyn QueryNode> {
    let mut slots: Vec<Slot> = Vec::with_capacity(members.len());
    for Scoped { paths, query } in members {
        if paths.is_empty() {
            slots.push(Slot::Clause {
                operator,
                negated: false,
                query,
            });
        } else {
            add_to_group(&mut slots, operator, paths, query);
        }
    }

    let inner: Box<dyn QueryNode> = if slots.len() == 1 {
        match slots.remove(0) {
            Slot::Clause { query, .. } => query,
            Slot::NestedGroup { path, members, .. } => nest(operator, path, members),
        }
    } else {
        Box::new(slots.into_iter().fold(BoolQuery::new(), place))
    };
    Box::new(NestedQuery::new(path, inner))
}

fn route(
    parent: BoolQuery,
    operator: LogicalOperator,
    negated: bool,
    query: Box<dyn QueryNode>,
) -> BoolQuery {
    match (operator, negated) {
        (LogicalOperator::And, false) => parent.must_boxed(query),
        (LogicalOperator::And, true) => parent.must_not_boxed(query),
        (LogicalOperator::Or, false) => parent.should_boxed(query),
        (LogicalOperator::Or, true) => parent.should(BoolQuery::new().must_not_boxed(query)),
    }
}

fn unexpected(operator: RelationalOperator, value: &Value) -> GatewayError {
    GatewayError::invalid_value(
        operator,
        format!("cannot compile a {} value", value.shape()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::query_string::{parse_query, QueryParser};
    use crate::schema::{FieldMapping, FieldType, IndexMapping, IndexSnapshot};
    use serde_json::json;

    fn compile(input: &str) -> BoolQuery {
        let list = parse_query(input).unwrap();
        FilterCompiler::new(&IndexSettings::default())
            .compile(&list)
            .unwrap()
    }

    fn schema() -> IndexSnapshot {
        IndexSnapshot::new(
            "listings",
            IndexMapping::new()
                .field("city", FieldMapping::keyword())
                .field("geo", FieldMapping::geo_point())
                .field(
                    "units",
                    FieldMapping::new(FieldType::Nested)
                        .property("size", FieldMapping::long())
                        .property("kind", FieldMapping::keyword())
                        .property(
                            "rooms",
                            FieldMapping::new(FieldType::Nested)
                                .property("area", FieldMapping::float()),
                        ),
                ),
        )
    }

    fn compile_typed(input: &str) -> BoolQuery {
        let schema = schema();
        let list = QueryParser::new(input)
            .unwrap()
            .with_schema(&schema)
            .parse()
            .unwrap();
        FilterCompiler::new(&IndexSettings::default())
            .compile(&list)
            .unwrap()
    }

    #[test]
    fn test_and_goes_to_must() {
        let query = compile("a EQ 1 AND b EQ 2");
        assert_eq!(query.must.len(), 2);
        assert!(query.must.iter().all(|q| q.query_type() == "term"));
        assert_eq!(query.clause_count(), 2);
    }

    #[test]
    fn test_or_goes_to_should() {
        let query = compile("a EQ 1 OR b EQ 2");
        assert_eq!(query.should.len(), 2);
        assert!(query.must.is_empty());
    }

    #[test]
    fn test_negated_group() {
        let query = compile("NOT (a EQ 1 OR b EQ 2)");
        assert_eq!(query.must_not.len(), 1);
        assert_eq!(query.clause_count(), 1);

        let dsl = query.must_not[0].to_dsl();
        assert_eq!(dsl["bool"]["should"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_negation_under_or() {
        let query = compile("a EQ 1 OR NOT b EQ 2");
        assert_eq!(query.should.len(), 2);
        assert_eq!(
            query.should[1].to_dsl(),
            json!({ "bool": { "must_not": [ { "term": { "b": { "value": 2 } } } ] } })
        );
    }

    #[test]
    fn test_intrinsic_negation() {
        let query = compile("a NE 1");
        assert_eq!(query.must_not.len(), 1);
        assert_eq!(query.must_not[0].query_type(), "term");

        // NOT cancels NOT_EQUAL
        let query = compile("NOT a <> 1");
        assert_eq!(query.must.len(), 1);

        let query = compile("a EQ null");
        assert_eq!(query.must_not[0].query_type(), "exists");

        let query = compile("a NE null");
        assert_eq!(query.must[0].query_type(), "exists");
    }

    #[test]
    fn test_leaf_predicates() {
        let query = compile("price GTE 10 AND price RANGE [1, 5] AND kind IN ['a', 'b']");
        assert_eq!(
            query.must[0].to_dsl(),
            json!({ "range": { "price": { "gte": 10 } } })
        );
        assert_eq!(
            query.must[1].to_dsl(),
            json!({ "range": { "price": { "gte": 1, "lte": 5 } } })
        );
        assert_eq!(
            query.must[2].to_dsl(),
            json!({ "terms": { "kind": ["a", "b"] } })
        );

        let query = compile("name LIKE 'casa\\_%'");
        assert_eq!(
            query.must[0].to_dsl(),
            json!({ "wildcard": { "name": { "value": "casa_*" } } })
        );
    }

    #[test]
    fn test_geo_predicates() {
        let query = compile(
            "geo VIEWPORT [[-22.9, -43.1], [-23.0, -43.3]] OR geo POLYGON [[0, 0], [0, 3], [3, -3]] OR geo NEAR [42.0, -74.0]",
        );
        let types: Vec<_> = query.should.iter().map(|q| q.query_type()).collect();
        assert_eq!(types, vec!["geo_bounding_box", "geo_polygon", "geo_distance"]);
        assert_eq!(
            query.should[2].to_dsl()["geo_distance"]["distance"],
            json!("1km")
        );
    }

    #[test]
    fn test_near_distance_from_settings() {
        let list = parse_query("geo NEAR [1, 2]").unwrap();
        let settings = IndexSettings::default().with_near_distance("500m");
        let query = FilterCompiler::new(&settings).compile(&list).unwrap();
        assert_eq!(
            query.must[0].to_dsl()["geo_distance"]["distance"],
            json!("500m")
        );
    }

    #[test]
    fn test_nested_siblings_share_scope() {
        let query = compile_typed("units.size EQ 2 AND units.kind EQ 'A' AND city EQ 'Rio'");
        assert_eq!(query.must.len(), 2);

        let nested = query.must[0].to_dsl();
        assert_eq!(nested["nested"]["path"], json!("units"));
        assert_eq!(
            nested["nested"]["query"]["bool"]["must"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );
        assert_eq!(query.must[1].query_type(), "term");
    }

    #[test]
    fn test_nested_single_leaf_unwrapped_inner() {
        let query = compile_typed("units.size EQ 2");
        assert_eq!(
            query.must[0].to_dsl(),
            json!({
                "nested": {
                    "path": "units",
                    "query": { "term": { "units.size": { "value": 2 } } }
                }
            })
        );
    }

    #[test]
    fn test_negated_nested_leaf_wrapped_alone() {
        let query = compile_typed("units.size EQ 2 AND NOT units.kind EQ 'A'");
        assert_eq!(query.must.len(), 1);
        assert_eq!(query.must_not.len(), 1);
        assert_eq!(query.must_not[0].query_type(), "nested");
    }

    #[test]
    fn test_multi_level_nesting() {
        let query = compile_typed("units.rooms.area GT 10.5");
        let dsl = query.must[0].to_dsl();
        assert_eq!(dsl["nested"]["path"], json!("units"));
        assert_eq!(dsl["nested"]["query"]["nested"]["path"], json!("units.rooms"));
    }

    #[test]
    fn test_mixed_depths_share_outer_scope() {
        let query = compile_typed("units.kind EQ 'A' AND units.rooms.area GT 10 AND city EQ 'Rio'");
        assert_eq!(query.must.len(), 2);
        assert_eq!(
            query.must[0].to_dsl(),
            json!({
                "nested": {
                    "path": "units",
                    "query": {
                        "bool": {
                            "must": [
                                { "term": { "units.kind": { "value": "A" } } },
                                {
                                    "nested": {
                                        "path": "units.rooms",
                                        "query": { "range": { "units.rooms.area": { "gt": 10 } } }
                                    }
                                }
                            ]
                        }
                    }
                }
            })
        );
        assert_eq!(query.must[1].query_type(), "term");
    }

    #[test]
    fn test_deeper_siblings_share_inner_scope() {
        let query = compile_typed("units.rooms.area GT 1 AND units.rooms.area LT 5");
        assert_eq!(query.must.len(), 1);

        let inner = &query.must[0].to_dsl()["nested"]["query"];
        assert_eq!(inner["nested"]["path"], json!("units.rooms"));
        assert_eq!(
            inner["nested"]["query"]["bool"]["must"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn test_nested_scope_strips_covered_paths() {
        let schema = schema();
        let list = QueryParser::new("units.kind EQ 'A' AND units.rooms.area GT 1 AND city EQ 'Rio'")
            .unwrap()
            .with_schema(&schema)
            .parse()
            .unwrap();
        let query = FilterCompiler::new(&IndexSettings::default())
            .with_nested_scope(&["units".to_string()])
            .compile(&list)
            .unwrap();

        assert_eq!(query.must.len(), 3);
        assert_eq!(
            query.must[0].to_dsl(),
            json!({ "term": { "units.kind": { "value": "A" } } })
        );
        assert_eq!(query.must[1].to_dsl()["nested"]["path"], json!("units.rooms"));
        assert_eq!(query.must[2].query_type(), "term");
    }

    #[test]
    fn test_mixed_operators_route_textually() {
        let query = compile("a EQ 1 AND b EQ 2 OR c EQ 3");
        assert_eq!(query.must.len(), 2);
        assert_eq!(query.should.len(), 1);
    }
}
