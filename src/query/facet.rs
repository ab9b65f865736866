//! Facet request model

use crate::query::field::Field;
use std::fmt;

/// Ordered, de-duplicated list of fields to aggregate on
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Facets {
    fields: Vec<Field>,
}

impl Facets {
    pub fn new(fields: Vec<Field>) -> Self {
        let mut unique: Vec<Field> = Vec::with_capacity(fields.len());
        for field in fields {
            if !unique.contains(&field) {
                unique.push(field);
            }
        }
        Self { fields: unique }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Facets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.fields.iter().map(Field::name).collect();
        f.write_str(&names.join(", "))
    }
}
