//! Schema view and field validation
//!
//! This module defines what the gateway knows about each index:
//! - Field types as reported by the backend mapping
//! - Index mappings (field name to type tree)
//! - Snapshots with a precomputed field cache, swapped atomically on refresh
//! - The refresh task applying mapping and settings change events

mod field_type;
mod mapping;
pub mod refresh;
mod registry;

pub use field_type::FieldType;
pub use mapping::{FieldMapping, IndexMapping};
pub use refresh::{spawn_refresh_task, RefreshEvent, RefreshHandle};
pub use registry::{IndexSnapshot, MappingRegistry, META_FIELDS, WILDCARD};
