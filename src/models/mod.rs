pub mod request;
pub mod search;

pub use request::SearchRequest;
pub use search::CompiledSearch;
