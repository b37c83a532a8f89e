//! Feature type (schema) descriptions

use geo_types::Geometry;
use serde::{Deserialize, Serialize};

use crate::crs::CRS;

/// Name of the geometry attribute, following the shapefile convention.
pub const DEFAULT_GEOMETRY_NAME: &str = "the_geom";

/// Attribute storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Boolean,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }
}

/// One non-geometry attribute of a feature type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Geometry binding of a feature type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryType {
    /// Geometry type of a concrete geometry. `Rect` and `Triangle` report as
    /// polygons, `Line` as a line string.
    pub fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) => Self::Point,
            Geometry::MultiPoint(_) => Self::MultiPoint,
            Geometry::Line(_) | Geometry::LineString(_) => Self::LineString,
            Geometry::MultiLineString(_) => Self::MultiLineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => Self::Polygon,
            Geometry::MultiPolygon(_) => Self::MultiPolygon,
            Geometry::GeometryCollection(_) => Self::GeometryCollection,
        }
    }

    /// Collapse single and multi variants into a simple shape type
    pub fn shape_type(self) -> ShapeType {
        match self {
            Self::Point | Self::MultiPoint => ShapeType::Point,
            Self::LineString | Self::MultiLineString => ShapeType::LineString,
            Self::Polygon | Self::MultiPolygon => ShapeType::Polygon,
            Self::GeometryCollection => ShapeType::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::MultiPoint => "MultiPoint",
            Self::LineString => "LineString",
            Self::MultiLineString => "MultiLineString",
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        }
    }
}

/// Simple shape classification used for symbolization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Point,
    LineString,
    Polygon,
    Unknown,
}

/// Schema of a feature collection: name, geometry binding, attributes and CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureType {
    name: String,
    geometry_name: String,
    geometry_type: GeometryType,
    fields: Vec<FieldDescriptor>,
    crs: Option<CRS>,
}

impl FeatureType {
    pub fn new(name: impl Into<String>, geometry_type: GeometryType) -> Self {
        Self {
            name: name.into(),
            geometry_name: DEFAULT_GEOMETRY_NAME.to_string(),
            geometry_type,
            fields: Vec::new(),
            crs: None,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDescriptor::new(name, field_type));
        self
    }

    pub fn with_crs(mut self, crs: CRS) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn geometry_name(&self) -> &str {
        &self.geometry_name
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    pub fn shape_type(&self) -> ShapeType {
        self.geometry_type.shape_type()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Vec<FieldDescriptor> {
        &mut self.fields
    }

    /// Position of an attribute, excluding the geometry
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }
}
