//! Sort model

use crate::query::field::Field;
use crate::query::fragment::FragmentList;
use crate::query::types::SortOrder;
use crate::query::value::GeoPoint;
use std::collections::HashSet;
use std::fmt;

/// What a sort item orders by
#[derive(Clone, Debug, PartialEq)]
pub enum SortKind {
    /// Plain field value
    Field,
    /// Relevance score
    Score,
    /// Distance from a point
    Distance(GeoPoint),
}

/// One entry of a [`Sort`]
#[derive(Clone, Debug, PartialEq)]
pub struct SortItem {
    pub field: Field,
    pub order: SortOrder,
    pub kind: SortKind,
    /// Scope filter applied to nested sub-documents
    pub filter: Option<FragmentList>,
}

impl SortItem {
    pub fn field(field: Field, order: SortOrder) -> Self {
        Self {
            field,
            order,
            kind: SortKind::Field,
            filter: None,
        }
    }

    /// Score sort, always descending
    pub fn score(field: Field) -> Self {
        Self {
            field,
            order: SortOrder::Desc,
            kind: SortKind::Score,
            filter: None,
        }
    }

    pub fn distance(field: Field, point: GeoPoint, order: SortOrder) -> Self {
        Self {
            field,
            order,
            kind: SortKind::Distance(point),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: FragmentList) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl fmt::Display for SortItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SortKind::Distance(point) => write!(f, "{} NEAR {} {}", self.field, point, self.order)?,
            _ => write!(f, "{} {}", self.field, self.order)?,
        }
        if let Some(filter) = &self.filter {
            write!(f, " sortFilter: {filter}")?;
        }
        Ok(())
    }
}

/// Ordered sort items, at most one per field
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sort {
    items: Vec<SortItem>,
}

impl Sort {
    /// Build a sort, keeping only the first item for each field
    pub fn new(items: Vec<SortItem>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.field.clone()))
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[SortItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}
