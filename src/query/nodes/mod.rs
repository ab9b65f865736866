//! Concrete query node implementations
//!
//! This module provides implementations of the `QueryNode` trait for the
//! backend primitives the compilers emit.

mod bool_query;
mod exists_query;
mod geo_query;
mod multi_match_query;
mod nested_query;
mod range_query;
mod term_query;
mod terms_query;
mod wildcard_query;

pub use bool_query::BoolQuery;
pub use exists_query::ExistsQuery;
pub use geo_query::{GeoBoundingBoxQuery, GeoDistanceQuery, GeoPolygonQuery};
pub use multi_match_query::MultiMatchQuery;
pub use nested_query::NestedQuery;
pub use range_query::RangeQuery;
pub use term_query::TermQuery;
pub use terms_query::TermsQuery;
pub use wildcard_query::WildcardQuery;
