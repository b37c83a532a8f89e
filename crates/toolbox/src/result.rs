//! What a process hands back: typed result values and per-output metadata.

use std::fmt;

use geo_types::{Geometry, LineString, Polygon, Rect};
use geotoolbox_core::{Coverage, FeatureCollection, CRS};
use indexmap::IndexMap;

/// Named results of a successful run, in output order
pub type ResultMap = IndexMap<String, ResultValue>;

/// Terminal outcome of a process execution.
#[derive(Debug)]
pub enum ExecutionOutcome {
    Success(ResultMap),
    Cancelled,
    Failed(String),
}

/// A single result value. Each variant has exactly one publishing path.
#[derive(Debug, Clone)]
pub enum ResultValue {
    Features(FeatureCollection),
    Geometry(GeometryValue),
    BoundingBox(BoundingBox),
    Raster(Coverage),
    Scalar(f64),
    Statistic(Statistic),
    /// Anything else, carried in its display form
    Opaque(String),
}

impl ResultValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Features(_) => "features",
            Self::Geometry(_) => "geometry",
            Self::BoundingBox(_) => "bounding box",
            Self::Raster(_) => "raster",
            Self::Scalar(_) => "scalar",
            Self::Statistic(_) => "statistic",
            Self::Opaque(_) => "value",
        }
    }
}

/// A standalone geometry, optionally carrying its own CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryValue {
    geometry: Geometry<f64>,
    linear_ring: bool,
    crs: Option<CRS>,
}

impl GeometryValue {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            linear_ring: false,
            crs: None,
        }
    }

    /// A closed ring; published as the polygon it bounds
    pub fn linear_ring(ring: LineString<f64>) -> Self {
        Self {
            geometry: Geometry::LineString(ring),
            linear_ring: true,
            crs: None,
        }
    }

    pub fn with_crs(mut self, crs: CRS) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn is_linear_ring(&self) -> bool {
        self.linear_ring
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// The geometry to publish, with rings closed into polygons
    pub fn into_parts(self) -> (Geometry<f64>, Option<CRS>) {
        let geometry = match self.geometry {
            Geometry::LineString(ring) if self.linear_ring => {
                Geometry::Polygon(Polygon::new(ring, Vec::new()))
            }
            other => other,
        };
        (geometry, self.crs)
    }
}

/// An axis-aligned envelope, optionally carrying its own CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    rect: Rect<f64>,
    crs: Option<CRS>,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            rect: Rect::new((min_x, min_y), (max_x, max_y)),
            crs: None,
        }
    }

    pub fn with_crs(mut self, crs: CRS) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn rect(&self) -> Rect<f64> {
        self.rect
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn into_geometry_value(self) -> GeometryValue {
        let value = GeometryValue::new(self.rect.to_polygon());
        match self.crs {
            Some(crs) => value.with_crs(crs),
            None => value,
        }
    }
}

/// One cell of a statistic table.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => f.write_str(&crate::report::format_number(*v)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for StatValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<usize> for StatValue {
    fn from(v: usize) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for StatValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for StatValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Structured statistic such as a global autocorrelation index.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistic {
    pub title: String,
    pub rows: IndexMap<String, StatValue>,
}

impl Statistic {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: IndexMap::new(),
        }
    }

    pub fn with(mut self, label: impl Into<String>, value: impl Into<StatValue>) -> Self {
        self.rows.insert(label.into(), value.into());
        self
    }
}

/// Declarative tags attached to a process output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputMetadata {
    tags: IndexMap<String, String>,
}

impl OutputMetadata {
    pub const STYLES: &'static str = "styles";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Shorthand for a `styles` tag
    pub fn styled(tag: impl Into<String>) -> Self {
        Self::new().with_tag(Self::STYLES, tag)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn style_tag(&self) -> Option<&str> {
        self.get(Self::STYLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, line_string};

    #[test]
    fn ring_closes_into_polygon() {
        let ring = line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 3.0)];
        let value = GeometryValue::linear_ring(ring);
        assert!(value.is_linear_ring());
        let (geometry, crs) = value.into_parts();
        assert!(crs.is_none());
        match geometry {
            Geometry::Polygon(p) => {
                assert!(p.exterior().is_closed());
                assert_eq!(p.exterior().0.first(), Some(&coord! { x: 0.0, y: 0.0 }));
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn plain_line_stays_a_line() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)];
        let (geometry, _) = GeometryValue::new(line).into_parts();
        assert!(matches!(geometry, Geometry::LineString(_)));
    }

    #[test]
    fn bounding_box_keeps_its_crs() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 5.0).with_crs(CRS::from_epsg(32719));
        let (geometry, crs) = bbox.into_geometry_value().into_parts();
        assert!(matches!(geometry, Geometry::Polygon(_)));
        assert_eq!(crs.and_then(|c| c.epsg()), Some(32719));
    }

    #[test]
    fn style_tag_lookup() {
        let meta = OutputMetadata::styled("Quantile.density").with_tag("help", "sampled points");
        assert_eq!(meta.style_tag(), Some("Quantile.density"));
        assert_eq!(meta.get("help"), Some("sampled points"));
        assert_eq!(OutputMetadata::new().style_tag(), None);
    }
}
