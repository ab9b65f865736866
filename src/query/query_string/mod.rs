//! Text grammars of the gateway: filters, sorts and facet lists
//!
//! Supports syntax like:
//! - `city EQ 'Rio' AND (price RANGE [10, 20] OR NOT featured = true)`
//! - `name LIKE 'casa%' AND address.geo VIEWPORT [[-22.9, -43.1], [-23.0, -43.3]]`
//! - `price DESC, address.geo NEAR [-22.9, -43.2], units.size ASC sortFilter: units.kind EQ 'A'`
//! - `city, units.kind`
//!
//! All three share one lexer and the token-level helpers of
//! [`QueryParser`]. Passing an [`IndexSnapshot`](crate::schema::IndexSnapshot)
//! turns on field validation; without one every field is accepted untyped.

pub mod facet_parser;
pub mod lexer;
pub mod parser;
pub mod sort_parser;

pub use facet_parser::{parse_facets, FacetParser};
pub use lexer::{Lexer, Token};
pub use parser::{parse_query, QueryParser};
pub use sort_parser::{parse_sort, SortParser};
