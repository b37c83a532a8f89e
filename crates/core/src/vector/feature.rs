//! Features and feature collections

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::vector::schema::FeatureType;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value; `None` for non-numeric values and nulls
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: HashMap<String, AttributeValue>,
    pub id: Option<String>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// Features sharing one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    schema: FeatureType,
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(schema: FeatureType) -> Self {
        Self {
            schema,
            features: Vec::new(),
        }
    }

    pub fn with_features(schema: FeatureType, features: Vec<Feature>) -> Self {
        Self { schema, features }
    }

    pub fn schema(&self) -> &FeatureType {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut FeatureType {
        &mut self.schema
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Numeric values of `field`, skipping nulls and non-numeric values
    pub fn numeric_values(&self, field: &str) -> Vec<f64> {
        self.features
            .iter()
            .filter_map(|f| f.get_property(field).and_then(AttributeValue::as_f64))
            .filter(|v| v.is_finite())
            .collect()
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{FieldType, GeometryType};
    use geo_types::point;

    #[test]
    fn test_numeric_values_skip_nulls() {
        let schema = FeatureType::new("pts", GeometryType::Point).with_field("v", FieldType::Real);
        let mut fc = FeatureCollection::new(schema);
        fc.push(Feature::new(point!(x: 0.0, y: 0.0).into()).with_property("v", AttributeValue::Float(1.5)));
        fc.push(Feature::new(point!(x: 1.0, y: 0.0).into()).with_property("v", AttributeValue::Null));
        fc.push(Feature::new(point!(x: 2.0, y: 0.0).into()).with_property("v", AttributeValue::Int(3)));
        assert_eq!(fc.numeric_values("v"), vec![1.5, 3.0]);
        assert!(fc.numeric_values("missing").is_empty());
    }
}
