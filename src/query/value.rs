//! Typed literal values

use crate::query::types::RangeValue;
use serde_json::{json, Number};
use std::fmt;

/// A latitude/longitude pair
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a point, rejecting coordinates outside the valid ranges
    pub fn new(lat: f64, lon: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!("latitude {lat:?} is outside [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(format!("longitude {lon:?} is outside [-180, 180]"));
        }
        Ok(Self { lat, lon })
    }

    pub fn to_dsl(&self) -> serde_json::Value {
        json!({ "lat": self.lat, "lon": self.lon })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?}]", self.lat, self.lon)
    }
}

/// A literal value on the right-hand side of a filter
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    /// Single geo point
    Point(GeoPoint),
    /// Bounding box given as north-east corner then south-west corner
    Viewport(GeoPoint, GeoPoint),
    /// Closed shape of at least three points
    Polygon(Vec<GeoPoint>),
}

impl Value {
    /// Short description of the value's tag, used in error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Point(_) => "geo point",
            Value::Viewport(..) => "viewport",
            Value::Polygon(_) => "polygon",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Number(_) | Value::String(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Interpret a two-number list as a geo point
    pub fn to_point(&self) -> Result<GeoPoint, String> {
        match self {
            Value::Point(point) => Ok(*point),
            Value::List(items) if items.len() == 2 => {
                match (items[0].as_f64(), items[1].as_f64()) {
                    (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
                    _ => Err(format!("geo point must hold two numbers, got {self}")),
                }
            }
            other => Err(format!(
                "expected a geo point [lat, lon], got {}",
                other.shape()
            )),
        }
    }

    /// Backend representation of a scalar or list value
    pub fn to_dsl(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => items.iter().map(Value::to_dsl).collect(),
            Value::Point(p) => p.to_dsl(),
            Value::Viewport(ne, sw) => json!([ne.to_dsl(), sw.to_dsl()]),
            Value::Polygon(points) => points.iter().map(GeoPoint::to_dsl).collect(),
        }
    }

    /// Range bound representation, for numbers and strings
    pub fn to_range_value(&self) -> Option<RangeValue> {
        match self {
            Value::Number(n) => n
                .as_i64()
                .map(RangeValue::Long)
                .or_else(|| n.as_f64().map(RangeValue::Double)),
            Value::String(s) => Some(RangeValue::String(s.clone())),
            _ => None,
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            _ => write!(f, "{ch}")?,
        }
    }
    f.write_str("\"")
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write_quoted(f, s),
            Value::List(items) => write_list(f, items),
            Value::Point(p) => write!(f, "{p}"),
            Value::Viewport(ne, sw) => write_list(f, &[*ne, *sw]),
            Value::Polygon(points) => write_list(f, points),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
