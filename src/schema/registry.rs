//! Per-index mapping snapshots and field resolution
//!
//! [`MappingRegistry`] holds one immutable [`IndexSnapshot`] per index behind
//! an `ArcSwap`. Readers load the current map without locking and keep
//! whatever snapshot they loaded for the rest of the request; a refresh
//! builds a complete new snapshot first and then swaps the map pointer.

use super::field_type::FieldType;
use super::mapping::IndexMapping;
use crate::error::GatewayError;
use crate::query::field::Field;
use crate::Result;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Meta fields accepted on every index without a mapping lookup
pub const META_FIELDS: [&str; 3] = ["_id", "_score", "_index"];

/// Source-field wildcard
pub const WILDCARD: &str = "*";

/// Immutable view of one index mapping plus its precomputed field cache
#[derive(Debug)]
pub struct IndexSnapshot {
    index: String,
    mapping: IndexMapping,
    /// Full dotted name to resolved field with per-segment types
    fields: HashMap<String, Field>,
    generation: u64,
}

impl IndexSnapshot {
    /// Build a snapshot and its field cache
    pub fn new(index: &str, mapping: IndexMapping) -> Self {
        Self::with_generation(index, mapping, 0)
    }

    fn with_generation(index: &str, mapping: IndexMapping, generation: u64) -> Self {
        let fields = mapping
            .flatten()
            .into_iter()
            .filter_map(|(name, _)| {
                let types = mapping.segment_types(&name)?;
                let field = Field::typed(&name, types);
                Some((name, field))
            })
            .collect();

        Self {
            index: index.to_string(),
            mapping,
            fields,
            generation,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn mapping(&self) -> &IndexMapping {
        &self.mapping
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of cached field paths
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Mapping type of a dotted path
    pub fn lookup(&self, path: &str) -> Option<FieldType> {
        self.fields.get(path).and_then(Field::field_type)
    }

    /// Resolve a dotted field name
    ///
    /// `*` is only accepted with `allow_wildcard`; meta fields always pass.
    pub fn resolve(&self, name: &str, allow_wildcard: bool) -> Result<Field> {
        if name == WILDCARD {
            return if allow_wildcard {
                Ok(Field::new(WILDCARD))
            } else {
                Err(GatewayError::invalid_field(name, &self.index))
            };
        }
        if META_FIELDS.contains(&name) {
            return Ok(Field::new(name));
        }
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::invalid_field(name, &self.index))
    }
}

type SnapshotMap = HashMap<String, Arc<IndexSnapshot>>;

/// Registry of mapping snapshots for every known index
pub struct MappingRegistry {
    inner: ArcSwap<SnapshotMap>,
    generation: AtomicU64,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of a single index
    pub fn snapshot(&self, index: &str) -> Result<Arc<IndexSnapshot>> {
        self.inner
            .load()
            .get(index)
            .cloned()
            .ok_or_else(|| GatewayError::IndexNotFound(index.to_string()))
    }

    /// Fail unless the index has a known mapping
    pub fn check_index(&self, index: &str) -> Result<()> {
        if self.inner.load().contains_key(index) {
            Ok(())
        } else {
            Err(GatewayError::IndexNotFound(index.to_string()))
        }
    }

    /// Resolve a field against the current snapshot of `index`
    pub fn resolve(&self, index: &str, name: &str, allow_wildcard: bool) -> Result<Field> {
        self.snapshot(index)?.resolve(name, allow_wildcard)
    }

    /// Replace the mapping of `index` with a freshly built snapshot
    pub fn publish(&self, index: &str, mapping: IndexMapping) -> Arc<IndexSnapshot> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(IndexSnapshot::with_generation(index, mapping, generation));
        debug!(
            index = %index,
            fields = snapshot.field_count(),
            generation,
            "built mapping snapshot"
        );

        self.inner.rcu(|current| {
            let mut next = SnapshotMap::clone(current);
            next.insert(index.to_string(), snapshot.clone());
            next
        });
        info!(index = %index, generation, "published mapping snapshot");
        snapshot
    }

    /// Forget an index. Returns whether it was known.
    pub fn remove(&self, index: &str) -> bool {
        let previous = self.inner.rcu(|current| {
            let mut next = SnapshotMap::clone(current);
            next.remove(index);
            next
        });
        let removed = previous.contains_key(index);
        if removed {
            self.generation.fetch_add(1, Ordering::SeqCst);
            info!(index = %index, "removed mapping snapshot");
        }
        removed
    }

    /// Known index names, sorted
    pub fn indices(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.load().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of changes applied so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldMapping;

    fn mapping() -> IndexMapping {
        IndexMapping::new()
            .field("id", FieldMapping::keyword())
            .field(
                "units",
                FieldMapping::new(FieldType::Nested).property("size", FieldMapping::long()),
            )
    }

    #[test]
    fn test_snapshot_resolve() {
        let snapshot = IndexSnapshot::new("listings", mapping());
        assert_eq!(snapshot.field_count(), 3);

        let field = snapshot.resolve("units.size", false).unwrap();
        assert_eq!(field.field_type(), Some(FieldType::Long));
        assert_eq!(field.nested_path(), Some("units".to_string()));

        assert_eq!(snapshot.lookup("units"), Some(FieldType::Nested));
        assert_eq!(snapshot.lookup("nope"), None);
    }

    #[test]
    fn test_meta_fields_and_wildcard() {
        let snapshot = IndexSnapshot::new("listings", mapping());
        assert!(snapshot.resolve("_id", false).is_ok());
        assert!(snapshot.resolve("_score", false).is_ok());
        assert!(snapshot.resolve("*", true).is_ok());

        let err = snapshot.resolve("*", false).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidField { ref field, .. } if field == "*"));
    }

    #[test]
    fn test_invalid_field_names_index() {
        let snapshot = IndexSnapshot::new("listings", mapping());
        let err = snapshot.resolve("units.missing", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field [units.missing] not found for index [listings]"
        );
    }

    #[test]
    fn test_registry_publish_and_check() {
        let registry = MappingRegistry::new();
        assert!(matches!(
            registry.check_index("listings"),
            Err(GatewayError::IndexNotFound(_))
        ));

        registry.publish("listings", mapping());
        assert!(registry.check_index("listings").is_ok());
        assert!(registry.resolve("listings", "id", false).is_ok());
        assert!(registry.resolve("other", "id", false).is_err());
        assert_eq!(registry.indices(), vec!["listings"]);
    }

    #[test]
    fn test_readers_keep_old_snapshot() {
        let registry = MappingRegistry::new();
        registry.publish("listings", mapping());
        let held = registry.snapshot("listings").unwrap();

        registry.publish(
            "listings",
            IndexMapping::new().field("title", FieldMapping::text()),
        );

        assert!(held.resolve("id", false).is_ok());
        let current = registry.snapshot("listings").unwrap();
        assert!(current.resolve("id", false).is_err());
        assert!(current.generation() > held.generation());
    }

    #[test]
    fn test_remove() {
        let registry = MappingRegistry::new();
        registry.publish("listings", mapping());
        assert!(registry.remove("listings"));
        assert!(!registry.remove("listings"));
        assert!(registry.snapshot("listings").is_err());
    }
}
