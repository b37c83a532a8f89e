//! Vector data structures
//!
//! A [`FeatureCollection`] always carries its [`FeatureType`], so a writer
//! never has to guess geometry binding, attribute types or CRS.

mod feature;
mod schema;

pub use feature::{AttributeValue, Feature, FeatureCollection};
pub use schema::{
    FeatureType, FieldDescriptor, FieldType, GeometryType, ShapeType, DEFAULT_GEOMETRY_NAME,
};
