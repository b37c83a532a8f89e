//! Export boundary: persist outputs and reopen them.
//!
//! The reopened value is what the rest of the pipeline sees, so any
//! renaming or CRS normalization the format applies is visible downstream.

use std::path::{Path, PathBuf};

use geotoolbox_core::io::{read_features, read_geotiff, truncate_field_names, write_features, write_geotiff};
use geotoolbox_core::{Coverage, FeatureCollection, CRS};
use tracing::debug;

use crate::error::Result;

/// A vector output after export, reopened from disk.
#[derive(Debug, Clone)]
pub struct PersistedVector {
    pub path: PathBuf,
    pub collection: FeatureCollection,
}

/// A raster output after export.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRaster {
    pub path: PathBuf,
    pub band_count: usize,
    pub rows: usize,
    pub cols: usize,
    pub crs: Option<CRS>,
}

pub trait Exporter: Send + Sync {
    /// Persist a collection and reopen it.
    fn export_vector(&self, collection: FeatureCollection, path: &Path) -> Result<PersistedVector>;

    fn export_raster(&self, coverage: &Coverage, path: &Path) -> Result<PersistedRaster>;
}

/// Writes JSON feature documents and GeoTIFF coverages.
#[derive(Debug, Clone, Default)]
pub struct FileExporter {
    field_name_limit: Option<usize>,
}

impl FileExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Truncate attribute names DBF-style before writing
    pub fn with_field_name_limit(mut self, limit: usize) -> Self {
        self.field_name_limit = Some(limit.max(1));
        self
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(geotoolbox_core::Error::from)?;
        }
    }
    Ok(())
}

impl Exporter for FileExporter {
    fn export_vector(&self, collection: FeatureCollection, path: &Path) -> Result<PersistedVector> {
        ensure_parent(path)?;
        let collection = match self.field_name_limit {
            Some(limit) => truncate_field_names(collection, limit),
            None => collection,
        };
        write_features(&collection, path)?;

        let reopened = read_features(path)?;
        debug!(path = %path.display(), features = reopened.len(), "vector output persisted");
        Ok(PersistedVector {
            path: path.to_path_buf(),
            collection: reopened,
        })
    }

    fn export_raster(&self, coverage: &Coverage, path: &Path) -> Result<PersistedRaster> {
        ensure_parent(path)?;
        write_geotiff(coverage, path)?;

        let reopened = read_geotiff(path)?;
        debug!(path = %path.display(), bands = reopened.band_count(), "raster output persisted");
        Ok(PersistedRaster {
            path: path.to_path_buf(),
            band_count: reopened.band_count(),
            rows: reopened.rows(),
            cols: reopened.cols(),
            crs: reopened.crs().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, Geometry};
    use geotoolbox_core::{AttributeValue, Feature, FeatureType, FieldType, GeometryType, Raster};

    fn sample() -> FeatureCollection {
        let schema = FeatureType::new("sample", GeometryType::Point)
            .with_field("population_density", FieldType::Real)
            .with_crs(CRS::from_epsg(4326));
        let feature = Feature::new(Geometry::Point(point!(x: 1.0, y: 2.0)))
            .with_property("population_density", AttributeValue::Float(12.5));
        FeatureCollection::with_features(schema, vec![feature])
    }

    #[test]
    fn vector_round_trip_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        let persisted = FileExporter::new().export_vector(sample(), &path).unwrap();
        assert!(path.exists());
        assert_eq!(persisted.collection.len(), 1);
        assert_eq!(persisted.collection.schema().crs().and_then(|c| c.epsg()), Some(4326));
    }

    #[test]
    fn reopened_schema_carries_truncated_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let persisted = FileExporter::new()
            .with_field_name_limit(10)
            .export_vector(sample(), &path)
            .unwrap();
        let schema = persisted.collection.schema();
        assert!(schema.has_field("population"));
        assert!(!schema.has_field("population_density"));
    }

    #[test]
    fn raster_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.tif");
        let band = Raster::filled(3, 4, 1.5);
        let coverage = Coverage::single_band("dem", band).with_crs(CRS::from_epsg(32719));
        let persisted = FileExporter::new().export_raster(&coverage, &path).unwrap();
        assert_eq!(persisted.band_count, 1);
        assert_eq!((persisted.rows, persisted.cols), (3, 4));
        assert_eq!(persisted.crs.and_then(|c| c.epsg()), Some(32719));
    }
}
