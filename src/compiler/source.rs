//! Source-field compiler
//!
//! Decides which document fields the backend returns. Requested lists
//! replace the index defaults; excludes are subtracted from includes, and an
//! empty include list means "everything except the excludes".

use crate::config::IndexSettings;
use crate::schema::IndexSnapshot;
use crate::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Effective `_source` include and exclude lists
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFields {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl SourceFields {
    pub fn new(includes: Vec<String>, excludes: Vec<String>) -> Self {
        Self { includes, excludes }
    }

    /// Exclude-only mode: every field but the excludes is returned
    pub fn is_exclude_only(&self) -> bool {
        self.includes.is_empty()
    }
}

/// Cached defaults and the snapshot generation they were computed from
struct CachedDefaults {
    generation: u64,
    fields: Arc<SourceFields>,
}

/// Source-field compiler with a per-index cache of validated defaults
///
/// Lazily computed defaults only replace an entry from an older snapshot,
/// and never seed an index invalidated after their snapshot was taken.
#[derive(Default)]
pub struct SourceFieldCompiler {
    defaults: DashMap<String, CachedDefaults>,
    /// Oldest generation allowed to seed an invalidated index
    floors: DashMap<String, u64>,
}

impl SourceFieldCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validated default fields of the snapshot's index, computed on first use
    pub fn defaults(&self, schema: &IndexSnapshot, settings: &IndexSettings) -> Arc<SourceFields> {
        let index = schema.index();
        let generation = schema.generation();
        if let Some(cached) = self.defaults.get(index) {
            if cached.generation == generation {
                return cached.fields.clone();
            }
        }

        let fields = self.compute(schema, settings);
        let floor = self.floors.get(index).map(|floor| *floor).unwrap_or(0);
        match self.defaults.entry(index.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().generation < generation {
                    entry.insert(CachedDefaults {
                        generation,
                        fields: fields.clone(),
                    });
                }
            }
            Entry::Vacant(entry) => {
                if generation >= floor {
                    entry.insert(CachedDefaults {
                        generation,
                        fields: fields.clone(),
                    });
                } else {
                    debug!(index = %index, generation, floor, "stale snapshot, defaults not cached");
                }
            }
        }
        fields
    }

    /// Recompute and cache the defaults of the snapshot's index
    pub fn refresh(&self, schema: &IndexSnapshot, settings: &IndexSettings) -> Arc<SourceFields> {
        let fields = self.compute(schema, settings);
        self.floors
            .remove_if(schema.index(), |_, floor| *floor <= schema.generation());
        self.defaults.insert(
            schema.index().to_string(),
            CachedDefaults {
                generation: schema.generation(),
                fields: fields.clone(),
            },
        );
        fields
    }

    /// Validate the configured defaults. Names the mapping does not know are
    /// dropped with a warning.
    fn compute(&self, schema: &IndexSnapshot, settings: &IndexSettings) -> Arc<SourceFields> {
        let keep_known = |names: &[String]| -> Vec<String> {
            dedup(names)
                .into_iter()
                .filter(|name| match schema.resolve(name, true) {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(index = %schema.index(), error = %e, "dropping default source field");
                        false
                    }
                })
                .collect()
        };

        let fields = Arc::new(SourceFields::new(
            keep_known(&settings.source_includes),
            keep_known(&settings.source_excludes),
        ));
        debug!(
            index = %schema.index(),
            generation = schema.generation(),
            includes = fields.includes.len(),
            excludes = fields.excludes.len(),
            "computed default source fields"
        );
        fields
    }

    /// Drop the cached defaults of an index
    ///
    /// Snapshots older than `generation` can no longer seed the cache.
    pub fn invalidate(&self, index: &str, generation: u64) {
        self.defaults.remove(index);
        self.floors.insert(index.to_string(), generation);
    }

    pub fn is_cached(&self, index: &str) -> bool {
        self.defaults.contains_key(index)
    }

    /// Effective source fields for one request
    pub fn compile(
        &self,
        schema: &IndexSnapshot,
        settings: &IndexSettings,
        includes: &[String],
        excludes: &[String],
    ) -> Result<SourceFields> {
        let defaults = self.defaults(schema, settings);

        let includes = if requested(includes) {
            validated(schema, includes)?
        } else {
            defaults.includes.clone()
        };
        let excludes = if requested(excludes) {
            validated(schema, excludes)?
        } else {
            defaults.excludes.clone()
        };

        if includes.is_empty() {
            return Ok(SourceFields::new(Vec::new(), excludes));
        }

        let effective_includes = includes
            .iter()
            .filter(|name| !excludes.contains(name))
            .cloned()
            .collect();
        let effective_excludes = excludes
            .into_iter()
            .filter(|name| !includes.contains(name))
            .collect();
        Ok(SourceFields::new(effective_includes, effective_excludes))
    }
}

fn requested(names: &[String]) -> bool {
    names.iter().any(|name| !name.trim().is_empty())
}

/// Trimmed, non-empty names in first-seen order
fn dedup(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

fn validated(schema: &IndexSnapshot, names: &[String]) -> Result<Vec<String>> {
    let names = dedup(names);
    for name in &names {
        schema.resolve(name, true)?;
    }
    Ok(names)
}
