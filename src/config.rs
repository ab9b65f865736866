use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::GatewayError;
use crate::query::fragment::MAX_FRAGMENTS;
use crate::Result;

/// Per-index settings read while compiling a request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Sort applied when a request has none or its sort is invalid.
    /// Empty means no configured default.
    pub default_sort: String,
    /// Suppress sorting for every request on this index
    pub sort_disabled: bool,
    pub default_size: usize,
    pub max_size: usize,
    pub default_facet_size: usize,
    /// Source fields returned when a request names none
    pub source_includes: Vec<String>,
    pub source_excludes: Vec<String>,
    /// Fields searched by free-text `q` when a request names none
    pub query_default_fields: Vec<String>,
    pub default_minimum_should_match: String,
    /// Radius used by NEAR filters
    pub near_distance: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            default_sort: String::new(),
            sort_disabled: false,
            default_size: 20,
            max_size: 200,
            default_facet_size: 20,
            source_includes: Vec::new(),
            source_excludes: Vec::new(),
            query_default_fields: Vec::new(),
            default_minimum_should_match: "75%".to_string(),
            near_distance: "1km".to_string(),
        }
    }
}

impl IndexSettings {
    pub fn with_default_sort(mut self, sort: impl Into<String>) -> Self {
        self.default_sort = sort.into();
        self
    }

    pub fn with_sort_disabled(mut self, disabled: bool) -> Self {
        self.sort_disabled = disabled;
        self
    }

    pub fn with_page_sizes(mut self, default_size: usize, max_size: usize) -> Self {
        self.default_size = default_size;
        self.max_size = max_size;
        self
    }

    pub fn with_default_facet_size(mut self, size: usize) -> Self {
        self.default_facet_size = size;
        self
    }

    pub fn with_source_includes(mut self, fields: &[&str]) -> Self {
        self.source_includes = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_source_excludes(mut self, fields: &[&str]) -> Self {
        self.source_excludes = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_query_default_fields(mut self, fields: &[&str]) -> Self {
        self.query_default_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_near_distance(mut self, distance: impl Into<String>) -> Self {
        self.near_distance = distance.into();
        self
    }

    /// Reject settings no request could satisfy
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(GatewayError::Config("max_size must be positive".to_string()));
        }
        if self.default_size > self.max_size {
            return Err(GatewayError::Config(format!(
                "default_size {} exceeds max_size {}",
                self.default_size, self.max_size
            )));
        }
        if self.near_distance.trim().is_empty() {
            return Err(GatewayError::Config("near_distance cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Gateway configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Item limit for a single filter expression
    pub max_fragments: usize,
    /// Settings per index name
    pub indices: HashMap<String, IndexSettings>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_fragments: MAX_FRAGMENTS,
            indices: HashMap::new(),
        }
    }
}

impl GatewayConfig {
    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_index(mut self, index: impl Into<String>, settings: IndexSettings) -> Self {
        self.indices.insert(index.into(), settings);
        self
    }

    pub fn with_max_fragments(mut self, max: usize) -> Self {
        self.max_fragments = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_fragments == 0 {
            return Err(GatewayError::Config(
                "max_fragments must be positive".to_string(),
            ));
        }
        for (index, settings) in &self.indices {
            settings
                .validate()
                .map_err(|e| GatewayError::Config(format!("index [{index}]: {e}")))?;
        }
        Ok(())
    }
}

/// Atomically swapped per-index settings
pub struct SettingsRegistry {
    inner: ArcSwap<HashMap<String, Arc<IndexSettings>>>,
    defaults: Arc<IndexSettings>,
}

impl SettingsRegistry {
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(HashMap::new()),
            defaults: Arc::new(IndexSettings::default()),
        }
    }

    /// Registry seeded with every index of `config`
    pub fn from_config(config: &GatewayConfig) -> Self {
        let map = config
            .indices
            .iter()
            .map(|(index, settings)| (index.clone(), Arc::new(settings.clone())))
            .collect();
        Self {
            inner: ArcSwap::from_pointee(map),
            defaults: Arc::new(IndexSettings::default()),
        }
    }

    /// Settings of `index`, or the defaults when it has none
    pub fn get(&self, index: &str) -> Arc<IndexSettings> {
        self.inner
            .load()
            .get(index)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }

    pub fn contains(&self, index: &str) -> bool {
        self.inner.load().contains_key(index)
    }

    /// Replace the settings of one index
    pub fn update(&self, index: &str, settings: IndexSettings) -> Arc<IndexSettings> {
        let settings = Arc::new(settings);
        self.inner.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(index.to_string(), settings.clone());
            next
        });
        settings
    }

    pub fn remove(&self, index: &str) {
        self.inner.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.remove(index);
            next
        });
    }
}

impl Default for SettingsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
