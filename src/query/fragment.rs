//! Filter expression tree
//!
//! An expression is a [`FragmentList`]: an ordered sequence of
//! [`FragmentItem`]s, each wrapping either a leaf [`Filter`] or another list.
//! Every item after the first carries the logical operator joining it to its
//! predecessor, and any item may carry a NOT flag. NOT is kept on the item
//! it wraps and never pushed into the children.

use crate::error::GatewayError;
use crate::query::filter::Filter;
use crate::query::types::LogicalOperator;
use crate::Result;
use std::collections::BTreeSet;
use std::fmt;

/// Hard cap on the number of items in one parsed expression
pub const MAX_FRAGMENTS: usize = 1024;

/// A node of the expression tree
#[derive(Clone, Debug, PartialEq)]
pub enum QueryFragment {
    Filter(Filter),
    List(FragmentList),
}

impl QueryFragment {
    /// Number of items in this subtree, counting nested groups themselves
    pub fn size(&self) -> usize {
        match self {
            QueryFragment::Filter(_) => 1,
            QueryFragment::List(list) => 1 + list.size(),
        }
    }
}

impl fmt::Display for QueryFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryFragment::Filter(filter) => write!(f, "{filter}"),
            QueryFragment::List(list) => write!(f, "{list}"),
        }
    }
}

/// One element of a [`FragmentList`]
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentItem {
    pub logical_operator: Option<LogicalOperator>,
    pub not: bool,
    pub fragment: QueryFragment,
}

impl FragmentItem {
    /// First item of a list: no logical operator
    pub fn first(fragment: QueryFragment) -> Self {
        Self {
            logical_operator: None,
            not: false,
            fragment,
        }
    }

    /// Item joined to its predecessor by `operator`
    pub fn joined(operator: LogicalOperator, fragment: QueryFragment) -> Self {
        Self {
            logical_operator: Some(operator),
            not: false,
            fragment,
        }
    }

    pub fn negated(mut self, not: bool) -> Self {
        self.not = not;
        self
    }
}

impl fmt::Display for FragmentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = self.logical_operator {
            write!(f, "{op} ")?;
        }
        if self.not {
            f.write_str("NOT ")?;
        }
        write!(f, "{}", self.fragment)
    }
}

/// A non-empty ordered group of fragments
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentList {
    items: Vec<FragmentItem>,
}

impl FragmentList {
    /// Build a list bounded by [`MAX_FRAGMENTS`]
    pub fn new(items: Vec<FragmentItem>) -> Result<Self> {
        Self::with_limit(items, MAX_FRAGMENTS)
    }

    /// Build a list bounded by `max` items
    ///
    /// A list whose only item is an un-negated list collapses into that
    /// inner list.
    pub fn with_limit(mut items: Vec<FragmentItem>, max: usize) -> Result<Self> {
        if items.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "a fragment list cannot be empty".to_string(),
            ));
        }
        if items.len() > max {
            return Err(GatewayError::FragmentLimit {
                count: items.len(),
                max,
            });
        }
        if items[0].logical_operator.is_some() {
            return Err(GatewayError::InvalidRequest(
                "The first item cannot have a logical operator prefix".to_string(),
            ));
        }
        if let Some(pos) = items
            .iter()
            .skip(1)
            .position(|item| item.logical_operator.is_none())
        {
            return Err(GatewayError::InvalidRequest(format!(
                "item {} is missing a logical operator",
                pos + 1
            )));
        }

        if let [FragmentItem {
            not: false,
            fragment: QueryFragment::List(_),
            ..
        }] = items.as_slice()
        {
            if let Some(FragmentItem {
                fragment: QueryFragment::List(inner),
                ..
            }) = items.pop()
            {
                return Ok(inner);
            }
        }

        Ok(Self { items })
    }

    pub fn items(&self) -> &[FragmentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of items below this list
    pub fn size(&self) -> usize {
        self.items.iter().map(|item| item.fragment.size()).sum()
    }

    /// Every field referenced by the tree
    ///
    /// With `include_root_fields` each dotted prefix of a field is reported
    /// too (`a.b.c` yields `a`, `a.b` and `a.b.c`).
    pub fn field_names(&self, include_root_fields: bool) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_field_names(include_root_fields, &mut names);
        names
    }

    fn collect_field_names(&self, include_root_fields: bool, names: &mut BTreeSet<String>) {
        for item in &self.items {
            match &item.fragment {
                QueryFragment::Filter(filter) => {
                    if include_root_fields {
                        names.extend(filter.field().prefixes());
                    } else {
                        names.insert(filter.field().name());
                    }
                }
                QueryFragment::List(list) => list.collect_field_names(include_root_fields, names),
            }
        }
    }
}

impl fmt::Display for FragmentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::field::Field;
    use crate::query::types::RelationalOperator;
    use crate::query::value::Value;

    fn leaf(name: &str, value: i64) -> QueryFragment {
        QueryFragment::Filter(
            Filter::new(Field::new(name), RelationalOperator::Equal, Value::from(value)).unwrap(),
        )
    }

    fn flat(n: usize) -> Vec<FragmentItem> {
        (0..n)
            .map(|i| {
                if i == 0 {
                    FragmentItem::first(leaf("a", i as i64))
                } else {
                    FragmentItem::joined(LogicalOperator::And, leaf("a", i as i64))
                }
            })
            .collect()
    }

    #[test]
    fn test_display() {
        let list = FragmentList::new(vec![
            FragmentItem::first(leaf("a", 1)),
            FragmentItem::joined(LogicalOperator::Or, leaf("b", 2)).negated(true),
        ])
        .unwrap();
        assert_eq!(list.to_string(), "(a EQUAL 1 OR NOT b EQUAL 2)");
    }

    #[test]
    fn test_fragment_limit() {
        assert!(FragmentList::new(flat(MAX_FRAGMENTS)).is_ok());
        let err = FragmentList::new(flat(MAX_FRAGMENTS + 1)).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::FragmentLimit { count, max } if count == MAX_FRAGMENTS + 1 && max == MAX_FRAGMENTS
        ));
    }

    #[test]
    fn test_first_item_without_operator() {
        let err = FragmentList::new(vec![FragmentItem::joined(
            LogicalOperator::And,
            leaf("a", 1),
        )])
        .unwrap_err();
        assert!(err.to_string().contains("first item cannot have a logical operator"));

        let err = FragmentList::new(vec![
            FragmentItem::first(leaf("a", 1)),
            FragmentItem::first(leaf("b", 1)),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("missing a logical operator"));
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(FragmentList::new(Vec::new()).is_err());
    }

    #[test]
    fn test_collapse_single_inner_list() {
        let inner = FragmentList::new(flat(2)).unwrap();
        let outer =
            FragmentList::new(vec![FragmentItem::first(QueryFragment::List(inner.clone()))])
                .unwrap();
        assert_eq!(outer, inner);

        let negated = FragmentList::new(vec![
            FragmentItem::first(QueryFragment::List(inner.clone())).negated(true)
        ])
        .unwrap();
        assert_ne!(negated, inner);
        assert_eq!(negated.len(), 1);
    }

    #[test]
    fn test_field_names() {
        let list = FragmentList::new(vec![
            FragmentItem::first(leaf("a.b.c", 1)),
            FragmentItem::joined(LogicalOperator::And, leaf("d", 2)),
        ])
        .unwrap();
        let names: Vec<_> = list.field_names(false).into_iter().collect();
        assert_eq!(names, vec!["a.b.c", "d"]);
        let names: Vec<_> = list.field_names(true).into_iter().collect();
        assert_eq!(names, vec!["a", "a.b", "a.b.c", "d"]);
    }
}
