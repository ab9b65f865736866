//! Compilers from the parsed DSL to backend request parts
//!
//! - `filter`: fragment trees to bool / nested / leaf queries
//! - `sort`: sort text to sort clauses, with default fallback and tiebreak
//! - `facet`: facet lists to terms aggregations
//! - `source`: include/exclude field lists, with cached per-index defaults
//! - `search`: the whole request, run against one snapshot of the index

pub mod facet;
pub mod filter;
pub mod search;
pub mod sort;
pub mod source;

pub use facet::{Aggregation, FacetCompiler};
pub use filter::FilterCompiler;
pub use search::SearchCompiler;
pub use sort::{NestedSort, SortClause, SortCompiler};
pub use source::{SourceFieldCompiler, SourceFields};
