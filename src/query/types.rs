//! Core types for the query system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relational operator joining a field to a value in a filter
///
/// Each operator renders as its canonical name, and the parser accepts that
/// name back along with the short and symbolic aliases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationalOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Like,
    Range,
    In,
    Viewport,
    Polygon,
    Near,
}

impl RelationalOperator {
    pub const ALL: [RelationalOperator; 12] = [
        RelationalOperator::Equal,
        RelationalOperator::NotEqual,
        RelationalOperator::GreaterThan,
        RelationalOperator::GreaterOrEqual,
        RelationalOperator::LessThan,
        RelationalOperator::LessOrEqual,
        RelationalOperator::Like,
        RelationalOperator::Range,
        RelationalOperator::In,
        RelationalOperator::Viewport,
        RelationalOperator::Polygon,
        RelationalOperator::Near,
    ];

    /// Canonical display token
    pub fn name(&self) -> &'static str {
        match self {
            RelationalOperator::Equal => "EQUAL",
            RelationalOperator::NotEqual => "NOT_EQUAL",
            RelationalOperator::GreaterThan => "GREATER_THAN",
            RelationalOperator::GreaterOrEqual => "GREATER_OR_EQUAL",
            RelationalOperator::LessThan => "LESS_THAN",
            RelationalOperator::LessOrEqual => "LESS_OR_EQUAL",
            RelationalOperator::Like => "LIKE",
            RelationalOperator::Range => "RANGE",
            RelationalOperator::In => "IN",
            RelationalOperator::Viewport => "VIEWPORT",
            RelationalOperator::Polygon => "POLYGON",
            RelationalOperator::Near => "NEAR",
        }
    }

    /// Short word alias, if the operator has one
    fn short_name(&self) -> Option<&'static str> {
        match self {
            RelationalOperator::Equal => Some("EQ"),
            RelationalOperator::NotEqual => Some("NE"),
            RelationalOperator::GreaterThan => Some("GT"),
            RelationalOperator::GreaterOrEqual => Some("GTE"),
            RelationalOperator::LessThan => Some("LT"),
            RelationalOperator::LessOrEqual => Some("LTE"),
            _ => None,
        }
    }

    /// Resolve a word token (case-insensitive)
    pub fn from_word(word: &str) -> Option<Self> {
        let upper = word.to_uppercase();
        Self::ALL
            .into_iter()
            .find(|op| op.name() == upper || op.short_name() == Some(upper.as_str()))
    }

    /// Resolve a symbolic token
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" | ":" => Some(RelationalOperator::Equal),
            "<>" | "!=" => Some(RelationalOperator::NotEqual),
            ">" => Some(RelationalOperator::GreaterThan),
            ">=" => Some(RelationalOperator::GreaterOrEqual),
            "<" => Some(RelationalOperator::LessThan),
            "<=" => Some(RelationalOperator::LessOrEqual),
            _ => None,
        }
    }

    /// Operators that only apply to geo_point fields
    pub fn is_geo(&self) -> bool {
        matches!(
            self,
            RelationalOperator::Viewport | RelationalOperator::Polygon | RelationalOperator::Near
        )
    }

    /// Single-bound comparisons
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            RelationalOperator::GreaterThan
                | RelationalOperator::GreaterOrEqual
                | RelationalOperator::LessThan
                | RelationalOperator::LessOrEqual
        )
    }
}

impl fmt::Display for RelationalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a fragment joins to its preceding sibling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_uppercase().as_str() {
            "AND" => Some(LogicalOperator::And),
            "OR" => Some(LogicalOperator::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("AND"),
            LogicalOperator::Or => f.write_str("OR"),
        }
    }
}

/// Sort direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_uppercase().as_str() {
            "ASC" => Some(SortOrder::Asc),
            "DESC" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("ASC"),
            SortOrder::Desc => f.write_str("DESC"),
        }
    }
}

/// Operator for combining terms in a multi_match query
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOperator {
    /// All terms must match (AND)
    And,
    /// At least one term must match (OR)
    #[default]
    Or,
}

impl MatchOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOperator::And => "and",
            MatchOperator::Or => "or",
        }
    }
}

/// Value type for range bounds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeValue {
    /// 64-bit integer
    Long(i64),
    /// 64-bit floating point
    Double(f64),
    /// String (for dates, keywords)
    String(String),
}

impl From<RangeValue> for serde_json::Value {
    fn from(value: RangeValue) -> Self {
        match value {
            RangeValue::Long(v) => serde_json::Value::from(v),
            RangeValue::Double(v) => serde_json::Value::from(v),
            RangeValue::String(s) => serde_json::Value::String(s),
        }
    }
}

/// Range bounds for range queries
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    /// Greater than or equal to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<RangeValue>,
    /// Greater than
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<RangeValue>,
    /// Less than or equal to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<RangeValue>,
    /// Less than
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<RangeValue>,
}

impl RangeBounds {
    pub fn is_unbounded(&self) -> bool {
        self.gte.is_none() && self.gt.is_none() && self.lte.is_none() && self.lt.is_none()
    }

    /// Render as a backend bounds object, omitting unset bounds
    pub fn to_dsl(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (key, bound) in [
            ("gte", &self.gte),
            ("gt", &self.gt),
            ("lte", &self.lte),
            ("lt", &self.lt),
        ] {
            if let Some(value) = bound {
                map.insert(key.to_string(), value.clone().into());
            }
        }
        serde_json::Value::Object(map)
    }
}
