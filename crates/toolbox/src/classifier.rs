//! Routes each named result to exactly one publishing path.

use geotoolbox_core::{Feature, FeatureCollection, FeatureType, GeometryType, CRS};

use crate::error::Result;
use crate::publish::{publish_raster, publish_vector, PublishContext, Publication};
use crate::report::{ReportRenderer, ReportValue};
use crate::request::{Inputs, OutputDestination};
use crate::result::{GeometryValue, OutputMetadata, ResultValue};

/// Where a classified output went.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Published(Publication),
    /// Report fragment to append to the run report
    Reported(String),
}

pub struct ResultClassifier<'a> {
    ctx: PublishContext<'a>,
    renderer: &'a dyn ReportRenderer,
    title: &'a str,
    inputs: &'a Inputs,
}

impl<'a> ResultClassifier<'a> {
    pub fn new(
        ctx: PublishContext<'a>,
        renderer: &'a dyn ReportRenderer,
        title: &'a str,
        inputs: &'a Inputs,
    ) -> Self {
        Self {
            ctx,
            renderer,
            title,
            inputs,
        }
    }

    /// Dispatch one result. Spatial results need a destination; a missing
    /// one is a publish error for this output only.
    pub fn classify(
        &self,
        name: &str,
        value: ResultValue,
        meta: &OutputMetadata,
        destination: Option<&OutputDestination>,
    ) -> Result<Classified> {
        let missing = OutputDestination::default();
        let destination = destination.unwrap_or(&missing);

        match value {
            ResultValue::Features(collection) => self.vector(name, collection, destination, meta),
            ResultValue::Geometry(geometry) => {
                let collection = wrap_geometry(geometry, self.title, &self.ctx.map.crs());
                self.vector(name, collection, destination, meta)
            }
            ResultValue::BoundingBox(bbox) => {
                let collection =
                    wrap_geometry(bbox.into_geometry_value(), self.title, &self.ctx.map.crs());
                self.vector(name, collection, destination, meta)
            }
            ResultValue::Raster(coverage) => {
                publish_raster(&self.ctx, name, coverage, destination, meta).map(Classified::Published)
            }
            ResultValue::Scalar(v) => Ok(self.report(&ReportValue::Scalar(v))),
            ResultValue::Statistic(stat) => Ok(self.report(&ReportValue::Statistic(&stat))),
            ResultValue::Opaque(text) => Ok(self.report(&ReportValue::Text(&text))),
        }
    }

    fn vector(
        &self,
        name: &str,
        collection: FeatureCollection,
        destination: &OutputDestination,
        meta: &OutputMetadata,
    ) -> Result<Classified> {
        publish_vector(&self.ctx, name, collection, destination, meta, self.inputs)
            .map(Classified::Published)
    }

    fn report(&self, value: &ReportValue<'_>) -> Classified {
        Classified::Reported(self.renderer.render(self.title, value))
    }
}

/// Wrap a standalone geometry into a one-feature collection named `layer`.
///
/// The schema has only the geometry attribute. A CRS carried by the
/// geometry wins over `default_crs`.
pub fn wrap_geometry(value: GeometryValue, layer: &str, default_crs: &CRS) -> FeatureCollection {
    let (geometry, crs) = value.into_parts();
    let schema = FeatureType::new(layer, GeometryType::of(&geometry))
        .with_crs(crs.unwrap_or_else(|| default_crs.clone()));
    FeatureCollection::with_features(schema, vec![Feature::new(geometry)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{line_string, point};

    #[test]
    fn wrapped_geometry_uses_map_crs() {
        let fc = wrap_geometry(
            GeometryValue::new(point!(x: 1.0, y: 2.0)),
            "Mean Center",
            &CRS::from_epsg(5186),
        );
        assert_eq!(fc.len(), 1);
        assert_eq!(fc.schema().name(), "Mean Center");
        assert_eq!(fc.schema().geometry_type(), GeometryType::Point);
        assert!(fc.schema().fields().is_empty());
        assert_eq!(fc.schema().crs().and_then(|c| c.epsg()), Some(5186));
    }

    #[test]
    fn own_crs_wins() {
        let value = GeometryValue::new(point!(x: 1.0, y: 2.0)).with_crs(CRS::from_epsg(4326));
        let fc = wrap_geometry(value, "p", &CRS::from_epsg(5186));
        assert_eq!(fc.schema().crs().and_then(|c| c.epsg()), Some(4326));
    }

    #[test]
    fn ring_is_wrapped_as_polygon() {
        let ring = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)];
        let fc = wrap_geometry(GeometryValue::linear_ring(ring), "hull", &CRS::wgs84());
        assert_eq!(fc.schema().geometry_type(), GeometryType::Polygon);
    }
}
