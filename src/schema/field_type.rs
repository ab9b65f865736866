//! Field type definitions
//!
//! Mirrors the type names reported by the backend mapping API. Only the
//! families the DSL cares about are distinguished; anything else resolves
//! to [`FieldType::Other`] and is treated as an opaque leaf.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Field data type as reported by an index mapping
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Analyzed full-text field
    Text,
    /// Exact match keyword field
    Keyword,
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    HalfFloat,
    ScaledFloat,
    Boolean,
    /// Stored as epoch millis; accepts strings or numbers in queries
    Date,
    /// Latitude/longitude pair
    GeoPoint,
    /// List of independently indexed sub-documents
    ///
    /// Queries, sorts and aggregations below a nested field must be scoped
    /// to a single sub-document at a time.
    Nested,
    /// Plain object; its properties are flattened into the parent document
    #[default]
    Object,
    /// Any mapping type the gateway has no special handling for
    #[serde(other)]
    Other,
}

impl FieldType {
    /// Numeric families accept only number literals
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Long
                | FieldType::Integer
                | FieldType::Short
                | FieldType::Byte
                | FieldType::Double
                | FieldType::Float
                | FieldType::HalfFloat
                | FieldType::ScaledFloat
        )
    }

    /// String families (text and keyword)
    pub fn is_string(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Keyword)
    }

    pub fn is_geo(&self) -> bool {
        matches!(self, FieldType::GeoPoint)
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, FieldType::Nested)
    }

    /// Container types hold properties instead of values
    pub fn is_container(&self) -> bool {
        matches!(self, FieldType::Nested | FieldType::Object)
    }

    /// Check if this field type supports sorting
    pub fn supports_sorting(&self) -> bool {
        !matches!(self, FieldType::Text) && !self.is_container()
    }

    /// Check if this field type supports terms aggregations
    pub fn supports_aggregation(&self) -> bool {
        !matches!(self, FieldType::Text | FieldType::GeoPoint) && !self.is_container()
    }

    /// Mapping type name
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Long => "long",
            FieldType::Integer => "integer",
            FieldType::Short => "short",
            FieldType::Byte => "byte",
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::HalfFloat => "half_float",
            FieldType::ScaledFloat => "scaled_float",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::GeoPoint => "geo_point",
            FieldType::Nested => "nested",
            FieldType::Object => "object",
            FieldType::Other => "other",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_families() {
        assert!(FieldType::Long.is_numeric());
        assert!(FieldType::ScaledFloat.is_numeric());
        assert!(!FieldType::Keyword.is_numeric());
        assert!(FieldType::Text.is_string());
        assert!(FieldType::Keyword.is_string());
        assert!(FieldType::GeoPoint.is_geo());
        assert!(FieldType::Nested.is_container());
        assert!(FieldType::Object.is_container());
    }

    #[test]
    fn test_capabilities() {
        assert!(FieldType::Keyword.supports_sorting());
        assert!(!FieldType::Text.supports_sorting());
        assert!(FieldType::GeoPoint.supports_sorting());
        assert!(!FieldType::GeoPoint.supports_aggregation());
        assert!(!FieldType::Nested.supports_aggregation());
    }

    #[test]
    fn test_deserialize_type_names() {
        let t: FieldType = serde_json::from_str("\"geo_point\"").unwrap();
        assert_eq!(t, FieldType::GeoPoint);
        let t: FieldType = serde_json::from_str("\"half_float\"").unwrap();
        assert_eq!(t, FieldType::HalfFloat);
        let t: FieldType = serde_json::from_str("\"ip\"").unwrap();
        assert_eq!(t, FieldType::Other);
        assert_eq!(FieldType::GeoPoint.to_string(), "geo_point");
    }
}
