//! Index mapping definitions
//!
//! A read view of the backend's field-name to type mapping for one index.
//! The gateway never mutates a mapping in place: a new mapping arrives as a
//! whole and replaces the previous snapshot (see [`super::registry`]).

use super::field_type::FieldType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Field mapping configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Field data type. Missing type with properties means a plain object.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    /// Child field mappings (for object and nested types)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, FieldMapping>>,
}

impl FieldMapping {
    /// Create a new field mapping with the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            properties: None,
        }
    }

    pub fn text() -> Self {
        Self::new(FieldType::Text)
    }

    pub fn keyword() -> Self {
        Self::new(FieldType::Keyword)
    }

    pub fn long() -> Self {
        Self::new(FieldType::Long)
    }

    pub fn float() -> Self {
        Self::new(FieldType::Float)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn date() -> Self {
        Self::new(FieldType::Date)
    }

    pub fn geo_point() -> Self {
        Self::new(FieldType::GeoPoint)
    }

    /// Create an object mapping holding the given children
    pub fn object(properties: HashMap<String, FieldMapping>) -> Self {
        Self::new(FieldType::Object).with_properties(properties)
    }

    /// Create a nested mapping holding the given children
    pub fn nested(properties: HashMap<String, FieldMapping>) -> Self {
        Self::new(FieldType::Nested).with_properties(properties)
    }

    /// Add a single child property
    pub fn property(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.properties
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), mapping);
        self
    }

    /// Set child field properties
    pub fn with_properties(mut self, properties: HashMap<String, FieldMapping>) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Index mapping (schema) definition
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMapping {
    /// Field mappings
    #[serde(default)]
    pub properties: HashMap<String, FieldMapping>,
}

impl IndexMapping {
    /// Create a new empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field mapping
    pub fn field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.properties.insert(name.into(), mapping);
        self
    }

    /// Get a field mapping by path (supports dot notation)
    pub fn get_field(&self, path: &str) -> Option<&FieldMapping> {
        let mut props = Some(&self.properties);
        let mut found = None;
        for part in path.split('.') {
            let field = props?.get(part)?;
            found = Some(field);
            props = field.properties.as_ref();
        }
        found
    }

    /// Type of every segment along `path`, outermost first
    ///
    /// Returns `None` as soon as a segment is not mapped.
    pub fn segment_types(&self, path: &str) -> Option<Vec<FieldType>> {
        let mut props = Some(&self.properties);
        let mut types = Vec::new();
        for part in path.split('.') {
            let field = props?.get(part)?;
            types.push(field.field_type);
            props = field.properties.as_ref();
        }
        Some(types)
    }

    /// Check if a field exists
    pub fn has_field(&self, path: &str) -> bool {
        self.get_field(path).is_some()
    }

    /// Get all field names (flattened with dot notation) with their types
    pub fn flatten(&self) -> Vec<(String, FieldType)> {
        let mut names = Vec::new();
        collect_fields(&self.properties, "", &mut names);
        names
    }

    /// Get all field names (flattened with dot notation)
    pub fn field_names(&self) -> Vec<String> {
        self.flatten().into_iter().map(|(name, _)| name).collect()
    }
}

fn collect_fields(
    props: &HashMap<String, FieldMapping>,
    prefix: &str,
    names: &mut Vec<(String, FieldType)>,
) {
    for (name, mapping) in props {
        let full_name = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        names.push((full_name.clone(), mapping.field_type));

        if let Some(ref children) = mapping.properties {
            collect_fields(children, &full_name, names);
        }
    }
}
