//! Leaf predicates
//!
//! A [`Filter`] joins a [`Field`], a [`RelationalOperator`] and a [`Value`].
//! Construction checks that the value has a shape the operator accepts and,
//! when the field carries mapping types, that the value fits the field. A
//! `Filter` that exists is always valid, so compilation never has to reject
//! one.

use crate::error::GatewayError;
use crate::query::field::Field;
use crate::query::types::RelationalOperator;
use crate::query::value::{GeoPoint, Value};
use crate::schema::FieldType;
use crate::Result;
use std::fmt;

/// A leaf predicate: field, operator and value
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    field: Field,
    operator: RelationalOperator,
    value: Value,
}

impl Filter {
    /// Build a validated filter
    pub fn new(field: Field, operator: RelationalOperator, value: Value) -> Result<Self> {
        let value = shape_value(operator, value)?;
        check_field_type(&field, operator, &value)?;
        Ok(Self {
            field,
            operator,
            value,
        })
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn operator(&self) -> RelationalOperator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

fn mismatch(operator: RelationalOperator, expected: &str, value: &Value) -> GatewayError {
    GatewayError::invalid_value(
        operator,
        format!("expected {expected}, got {}", value.shape()),
    )
}

/// Check the value tag against the operator, converting raw lists into geo
/// literals where the operator calls for one
pub(crate) fn shape_value(operator: RelationalOperator, value: Value) -> Result<Value> {
    use RelationalOperator::*;

    match operator {
        Equal | NotEqual => {
            if value.is_scalar() || value == Value::Null {
                Ok(value)
            } else {
                Err(mismatch(operator, "a scalar or null", &value))
            }
        }
        GreaterThan | GreaterOrEqual | LessThan | LessOrEqual => match value {
            Value::Number(_) | Value::String(_) => Ok(value),
            other => Err(mismatch(operator, "a number or string", &other)),
        },
        Like => match value {
            Value::String(_) => Ok(value),
            other => Err(mismatch(operator, "a string", &other)),
        },
        Range => shape_range(value),
        In => match value {
            Value::List(ref items) if !items.is_empty() && items.iter().all(Value::is_scalar) => {
                Ok(value)
            }
            other => Err(mismatch(operator, "a non-empty list of scalars", &other)),
        },
        Near => match value {
            Value::List(_) | Value::Point(_) => value
                .to_point()
                .map(Value::Point)
                .map_err(|msg| GatewayError::invalid_value(operator, msg)),
            other => Err(mismatch(operator, "a geo point [lat, lon]", &other)),
        },
        Viewport => shape_viewport(value),
        Polygon => shape_polygon(value),
    }
}

fn shape_range(value: Value) -> Result<Value> {
    let op = RelationalOperator::Range;
    let Value::List(ref items) = value else {
        return Err(mismatch(op, "a list of 2 bounds", &value));
    };
    if items.len() != 2 {
        return Err(GatewayError::invalid_value(
            op,
            format!("expected exactly 2 bounds, got {}", items.len()),
        ));
    }
    if let Some(bad) = items
        .iter()
        .find(|v| !matches!(v, Value::Number(_) | Value::String(_)))
    {
        return Err(mismatch(op, "numeric or string bounds", bad));
    }
    if let (Some(from), Some(to)) = (items[0].as_f64(), items[1].as_f64()) {
        if from > to {
            return Err(GatewayError::invalid_value(
                op,
                format!("lower bound {} is greater than upper bound {}", items[0], items[1]),
            ));
        }
    }
    Ok(value)
}

fn points(operator: RelationalOperator, items: &[Value]) -> Result<Vec<GeoPoint>> {
    items
        .iter()
        .map(|item| {
            item.to_point()
                .map_err(|msg| GatewayError::invalid_value(operator, msg))
        })
        .collect()
}

fn shape_viewport(value: Value) -> Result<Value> {
    let op = RelationalOperator::Viewport;
    let (ne, sw) = match value {
        Value::Viewport(ne, sw) => (ne, sw),
        Value::List(ref items) if items.len() == 2 => {
            let corners = points(op, items)?;
            (corners[0], corners[1])
        }
        Value::List(ref items) => {
            return Err(GatewayError::invalid_value(
                op,
                format!("expected 2 corner points, got {}", items.len()),
            ))
        }
        other => return Err(mismatch(op, "2 corner points", &other)),
    };
    if ne.lat < sw.lat {
        return Err(GatewayError::invalid_value(
            op,
            format!("north-east corner {ne} lies south of south-west corner {sw}"),
        ));
    }
    Ok(Value::Viewport(ne, sw))
}

fn shape_polygon(value: Value) -> Result<Value> {
    let op = RelationalOperator::Polygon;
    let shape = match value {
        Value::Polygon(shape) => shape,
        Value::List(ref items) => points(op, items)?,
        other => return Err(mismatch(op, "a list of at least 3 points", &other)),
    };
    if shape.len() < 3 {
        return Err(GatewayError::invalid_value(
            op,
            format!("a polygon needs at least 3 points, got {}", shape.len()),
        ));
    }
    Ok(Value::Polygon(shape))
}

fn scalars(value: &Value) -> Vec<&Value> {
    match value {
        Value::List(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn check_field_type(field: &Field, operator: RelationalOperator, value: &Value) -> Result<()> {
    let Some(field_type) = field.field_type() else {
        return Ok(());
    };

    let reject = |message: String| Err(GatewayError::invalid_value(operator, message));

    if operator.is_geo() {
        if !field_type.is_geo() {
            return reject(format!(
                "[{field}] is a {field_type} field, {operator} needs a geo_point field"
            ));
        }
        return Ok(());
    }
    if *value == Value::Null {
        return Ok(());
    }
    if field_type.is_geo() {
        return reject(format!(
            "geo_point field [{field}] only supports VIEWPORT, POLYGON, NEAR or null checks"
        ));
    }
    if field_type.is_container() {
        return reject(format!(
            "{field_type} field [{field}] only supports null checks"
        ));
    }
    if operator == RelationalOperator::Like && !field_type.is_string() {
        return reject(format!("LIKE needs a text or keyword field, [{field}] is {field_type}"));
    }

    for scalar in scalars(value) {
        let fits = match field_type {
            t if t.is_numeric() => matches!(scalar, Value::Number(_)),
            FieldType::Boolean => matches!(scalar, Value::Bool(_)),
            FieldType::Date => matches!(scalar, Value::Number(_) | Value::String(_)),
            _ => true,
        };
        if !fits {
            return reject(format!(
                "{field_type} field [{field}] does not accept {} {scalar}",
                scalar.shape()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: Vec<Value>) -> Value {
        Value::List(items)
    }

    fn pair(a: i64, b: i64) -> Value {
        list(vec![Value::from(a), Value::from(b)])
    }

    #[test]
    fn test_display() {
        let filter = Filter::new(
            Field::new("field2"),
            RelationalOperator::Equal,
            Value::from("ALPHA"),
        )
        .unwrap();
        assert_eq!(filter.to_string(), "field2 EQUAL \"ALPHA\"");
    }

    #[test]
    fn test_equal_shapes() {
        let field = Field::new("a");
        assert!(Filter::new(field.clone(), RelationalOperator::Equal, Value::Null).is_ok());
        assert!(Filter::new(field.clone(), RelationalOperator::NotEqual, Value::from(1)).is_ok());
        let err = Filter::new(field, RelationalOperator::Equal, pair(1, 2)).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidValue { ref operator, .. } if operator == "EQUAL"));
    }

    #[test]
    fn test_like_requires_string() {
        let field = Field::new("a");
        assert!(Filter::new(field.clone(), RelationalOperator::Like, Value::from("ab%")).is_ok());
        assert!(Filter::new(field, RelationalOperator::Like, Value::from(3)).is_err());
    }

    #[test]
    fn test_range_shapes() {
        let field = Field::new("price");
        assert!(Filter::new(field.clone(), RelationalOperator::Range, pair(1, 5)).is_ok());
        assert!(Filter::new(field.clone(), RelationalOperator::Range, pair(5, 1)).is_err());
        assert!(Filter::new(
            field.clone(),
            RelationalOperator::Range,
            list(vec![Value::from(1)])
        )
        .is_err());
        assert!(Filter::new(field, RelationalOperator::Range, Value::from(1)).is_err());
    }

    #[test]
    fn test_polygon_needs_three_points() {
        let field = Field::new("geo");
        let two = list(vec![pair(0, 0), pair(0, 3)]);
        assert!(Filter::new(field.clone(), RelationalOperator::Polygon, two).is_err());

        let three = list(vec![pair(0, 0), pair(0, 3), pair(3, -3)]);
        let filter = Filter::new(field, RelationalOperator::Polygon, three).unwrap();
        assert!(matches!(filter.value(), Value::Polygon(points) if points.len() == 3));
    }

    #[test]
    fn test_viewport_and_near() {
        let field = Field::new("geo");
        let viewport = list(vec![pair(42, -74), pair(-40, -72)]);
        let filter = Filter::new(field.clone(), RelationalOperator::Viewport, viewport).unwrap();
        assert_eq!(
            filter.to_string(),
            "geo VIEWPORT [[42.0, -74.0], [-40.0, -72.0]]"
        );

        let flipped = list(vec![pair(-40, -72), pair(42, -74)]);
        assert!(Filter::new(field.clone(), RelationalOperator::Viewport, flipped).is_err());

        let out_of_bounds = list(vec![pair(95, 0), pair(0, 0)]);
        assert!(Filter::new(field.clone(), RelationalOperator::Viewport, out_of_bounds).is_err());

        assert!(Filter::new(field.clone(), RelationalOperator::Near, pair(10, 20)).is_ok());
        assert!(Filter::new(field, RelationalOperator::Near, Value::from(1)).is_err());
    }

    #[test]
    fn test_in_shapes() {
        let field = Field::new("id");
        assert!(Filter::new(field.clone(), RelationalOperator::In, pair(1, 2)).is_ok());
        assert!(Filter::new(field.clone(), RelationalOperator::In, list(vec![])).is_err());
        assert!(Filter::new(field, RelationalOperator::In, list(vec![Value::Null])).is_err());
    }

    #[test]
    fn test_typed_field_checks() {
        let numeric = Field::typed("numeric", vec![FieldType::Long]);
        assert!(Filter::new(numeric.clone(), RelationalOperator::Equal, Value::from(10)).is_ok());
        assert!(Filter::new(numeric.clone(), RelationalOperator::Equal, Value::Null).is_ok());
        assert!(Filter::new(numeric.clone(), RelationalOperator::Equal, Value::from("a")).is_err());
        assert!(Filter::new(numeric, RelationalOperator::Like, Value::from("a%")).is_err());

        let flag = Field::typed("is_even", vec![FieldType::Boolean]);
        assert!(Filter::new(flag.clone(), RelationalOperator::Equal, Value::from(true)).is_ok());
        assert!(Filter::new(flag, RelationalOperator::Equal, Value::from(1)).is_err());

        let keyword = Field::typed("name", vec![FieldType::Keyword]);
        assert!(Filter::new(keyword, RelationalOperator::Near, pair(1, 1)).is_err());

        let geo = Field::typed("geo", vec![FieldType::GeoPoint]);
        assert!(Filter::new(geo.clone(), RelationalOperator::Equal, Value::from("x")).is_err());
        assert!(Filter::new(geo, RelationalOperator::NotEqual, Value::Null).is_ok());

        let object = Field::typed("object", vec![FieldType::Object]);
        assert!(Filter::new(object.clone(), RelationalOperator::Equal, Value::Null).is_ok());
        assert!(Filter::new(object, RelationalOperator::Equal, Value::from(1)).is_err());
    }
}
