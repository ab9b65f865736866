//! Dotted field references

use crate::schema::FieldType;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Name of the synthetic relevance score field
pub const SCORE_FIELD: &str = "_score";

/// Name of the document id meta field
pub const ID_FIELD: &str = "_id";

/// A dotted field path, optionally annotated with the mapping type of each
/// segment
///
/// Equality and hashing only look at the path segments.
#[derive(Clone, Debug)]
pub struct Field {
    names: Vec<String>,
    types: Option<Vec<FieldType>>,
    not: bool,
}

impl Field {
    /// Create a field without type information
    pub fn new(name: &str) -> Self {
        Self {
            names: name.split('.').map(str::to_string).collect(),
            types: None,
            not: false,
        }
    }

    /// Create a field annotated with one type per path segment
    pub fn typed(name: &str, types: Vec<FieldType>) -> Self {
        let mut field = Self::new(name);
        if types.len() == field.names.len() {
            field.types = Some(types);
        }
        field
    }

    /// Set the negation flag
    pub fn with_not(mut self, not: bool) -> Self {
        self.not = not;
        self
    }

    pub fn is_not(&self) -> bool {
        self.not
    }

    /// Path segments
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Full dotted name
    pub fn name(&self) -> String {
        self.names.join(".")
    }

    /// Every dotted prefix of the path, ending with the full name
    pub fn prefixes(&self) -> Vec<String> {
        (1..=self.names.len())
            .map(|n| self.names[..n].join("."))
            .collect()
    }

    /// Type of the last segment, when known
    pub fn field_type(&self) -> Option<FieldType> {
        self.types.as_ref().and_then(|t| t.last().copied())
    }

    pub fn is_typed(&self) -> bool {
        self.types.is_some()
    }

    /// Paths of the nested ancestors of this field, outermost first
    ///
    /// The field itself is not included even when it is mapped as nested.
    pub fn nested_paths(&self) -> Vec<String> {
        let Some(types) = &self.types else {
            return Vec::new();
        };
        types
            .iter()
            .enumerate()
            .take(types.len().saturating_sub(1))
            .filter(|(_, t)| t.is_nested())
            .map(|(i, _)| self.names[..=i].join("."))
            .collect()
    }

    /// Innermost nested ancestor path
    pub fn nested_path(&self) -> Option<String> {
        self.nested_paths().pop()
    }

    pub fn is_score(&self) -> bool {
        self.names.len() == 1 && self.names[0] == SCORE_FIELD
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for Field {}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.names.hash(state);
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_and_display() {
        let field = Field::new("address.geo.location");
        assert_eq!(field.names().len(), 3);
        assert_eq!(field.to_string(), "address.geo.location");
        assert_eq!(
            field.prefixes(),
            vec!["address", "address.geo", "address.geo.location"]
        );
    }

    #[test]
    fn test_equality_ignores_types_and_not() {
        let plain = Field::new("a.b");
        let typed = Field::typed("a.b", vec![FieldType::Nested, FieldType::Keyword]).with_not(true);
        assert_eq!(plain, typed);

        let mut set = HashSet::new();
        set.insert(plain);
        assert!(set.contains(&typed));
    }

    #[test]
    fn test_nested_paths() {
        let field = Field::typed(
            "units.rooms.size",
            vec![FieldType::Nested, FieldType::Nested, FieldType::Long],
        );
        assert_eq!(field.nested_paths(), vec!["units", "units.rooms"]);
        assert_eq!(field.nested_path(), Some("units.rooms".to_string()));

        let container = Field::typed("units", vec![FieldType::Nested]);
        assert!(container.nested_paths().is_empty());

        assert!(Field::new("units.rooms").nested_paths().is_empty());
    }

    #[test]
    fn test_score_field() {
        assert!(Field::new("_score").is_score());
        assert!(!Field::new("score").is_score());
    }
}
