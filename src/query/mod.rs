//! Filter, sort and facet DSL
//!
//! This module holds both sides of the gateway's query handling:
//! - The parsed model: fields, values, filters, fragment trees, sorts, facets
//! - The text grammars producing that model (`query_string`)
//! - The compiled backend primitives (`ast`, `nodes`)
//!
//! # Example
//!
//! ```json
//! {
//!   "query": {
//!     "bool": {
//!       "filter": [
//!         { "range": { "price": { "gte": 10, "lte": 20 } } }
//!       ]
//!     }
//!   }
//! }
//! ```

pub mod ast;
pub mod facet;
pub mod field;
pub mod filter;
pub mod fragment;
pub mod nodes;
pub mod query_string;
pub mod sort;
pub mod types;
pub mod value;

pub use ast::{MatchAllQuery, QueryNode};
pub use facet::Facets;
pub use field::Field;
pub use filter::Filter;
pub use fragment::{FragmentItem, FragmentList, QueryFragment, MAX_FRAGMENTS};
pub use sort::{Sort, SortItem, SortKind};
pub use types::*;
pub use value::{GeoPoint, Value};
