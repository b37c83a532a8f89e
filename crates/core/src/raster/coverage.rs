//! Georeferenced multi-band coverage

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};

/// A georeferenced grid made of one or more equally sized bands.
///
/// `minimum` / `maximum` are *declared* properties: they are only present
/// when the producer computed or supplied them, mirroring how a grid carries
/// its statistics as metadata rather than recomputing them on every read.
#[derive(Debug, Clone)]
pub struct Coverage {
    name: String,
    bands: Vec<Raster>,
    transform: GeoTransform,
    crs: Option<CRS>,
    minimum: Option<f64>,
    maximum: Option<f64>,
}

impl Coverage {
    /// Create a coverage from its bands. All bands must share one shape.
    pub fn new(name: impl Into<String>, bands: Vec<Raster>) -> Result<Self> {
        let first = bands.first().ok_or(Error::EmptyCoverage)?;
        let (er, ec) = first.shape();
        if let Some(bad) = bands.iter().find(|b| b.shape() != (er, ec)) {
            let (ar, ac) = bad.shape();
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
        Ok(Self {
            name: name.into(),
            bands,
            transform: GeoTransform::default(),
            crs: None,
            minimum: None,
            maximum: None,
        })
    }

    pub fn single_band(name: impl Into<String>, band: Raster) -> Self {
        Self {
            name: name.into(),
            bands: vec![band],
            transform: GeoTransform::default(),
            crs: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_crs(mut self, crs: CRS) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Declare the value range without scanning the data.
    pub fn with_declared_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// Scan the first band and declare its range.
    pub fn with_computed_statistics(mut self) -> Self {
        let stats = self.bands[0].statistics();
        self.minimum = stats.min;
        self.maximum = stats.max;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bands(&self) -> &[Raster] {
        &self.bands
    }

    pub fn band(&self, index: usize) -> Option<&Raster> {
        self.bands.get(index)
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn rows(&self) -> usize {
        self.bands[0].rows()
    }

    pub fn cols(&self) -> usize {
        self.bands[0].cols()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// No-data marker of the first band
    pub fn nodata(&self) -> Option<f64> {
        self.bands[0].nodata()
    }

    /// Declared (minimum, maximum) if both are present
    pub fn declared_range(&self) -> Option<(f64, f64)> {
        self.minimum.zip(self.maximum)
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }
}
