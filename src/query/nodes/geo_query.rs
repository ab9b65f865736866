//! Geo queries over geo_point fields: bounding box, polygon and distance

use crate::query::ast::QueryNode;
use crate::query::value::GeoPoint;
use serde_json::{json, Value};

/// Matches points inside the box spanned by a north-east and a south-west
/// corner
#[derive(Clone, Debug, PartialEq)]
pub struct GeoBoundingBoxQuery {
    pub field: String,
    pub top_right: GeoPoint,
    pub bottom_left: GeoPoint,
}

impl GeoBoundingBoxQuery {
    pub fn new(field: impl Into<String>, top_right: GeoPoint, bottom_left: GeoPoint) -> Self {
        Self {
            field: field.into(),
            top_right,
            bottom_left,
        }
    }
}

impl QueryNode for GeoBoundingBoxQuery {
    fn query_type(&self) -> &'static str {
        "geo_bounding_box"
    }

    fn to_dsl(&self) -> Value {
        json!({
            "geo_bounding_box": {
                self.field.as_str(): {
                    "top_right": self.top_right.to_dsl(),
                    "bottom_left": self.bottom_left.to_dsl()
                }
            }
        })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

/// Matches points inside a closed polygon
#[derive(Clone, Debug, PartialEq)]
pub struct GeoPolygonQuery {
    pub field: String,
    pub points: Vec<GeoPoint>,
}

impl GeoPolygonQuery {
    pub fn new(field: impl Into<String>, points: Vec<GeoPoint>) -> Self {
        Self {
            field: field.into(),
            points,
        }
    }
}

impl QueryNode for GeoPolygonQuery {
    fn query_type(&self) -> &'static str {
        "geo_polygon"
    }

    fn to_dsl(&self) -> Value {
        let points: Vec<Value> = self.points.iter().map(GeoPoint::to_dsl).collect();
        json!({ "geo_polygon": { self.field.as_str(): { "points": points } } })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

/// Matches points within `distance` of `origin`
#[derive(Clone, Debug, PartialEq)]
pub struct GeoDistanceQuery {
    pub field: String,
    pub origin: GeoPoint,
    /// Backend distance string, e.g. `1km`
    pub distance: String,
}

impl GeoDistanceQuery {
    pub fn new(field: impl Into<String>, origin: GeoPoint, distance: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            origin,
            distance: distance.into(),
        }
    }
}

impl QueryNode for GeoDistanceQuery {
    fn query_type(&self) -> &'static str {
        "geo_distance"
    }

    fn to_dsl(&self) -> Value {
        json!({
            "geo_distance": {
                "distance": self.distance,
                self.field.as_str(): self.origin.to_dsl()
            }
        })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_bounding_box() {
        let query = GeoBoundingBoxQuery::new("geo", point(-22.9, -43.1), point(-23.0, -43.3));
        assert_eq!(
            query.to_dsl(),
            json!({
                "geo_bounding_box": {
                    "geo": {
                        "top_right": { "lat": -22.9, "lon": -43.1 },
                        "bottom_left": { "lat": -23.0, "lon": -43.3 }
                    }
                }
            })
        );
    }

    #[test]
    fn test_polygon() {
        let query = GeoPolygonQuery::new("geo", vec![point(0.0, 0.0), point(0.0, 3.0), point(3.0, -3.0)]);
        assert_eq!(query.query_type(), "geo_polygon");
        assert_eq!(
            query.to_dsl()["geo_polygon"]["geo"]["points"]
                .as_array()
                .map(Vec::len),
            Some(3)
        );
    }

    #[test]
    fn test_distance() {
        let query = GeoDistanceQuery::new("geo", point(42.0, -74.0), "1km");
        assert_eq!(
            query.to_dsl(),
            json!({
                "geo_distance": {
                    "distance": "1km",
                    "geo": { "lat": 42.0, "lon": -74.0 }
                }
            })
        );
    }
}
