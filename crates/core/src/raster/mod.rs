//! Raster data structures

mod coverage;
mod geotransform;
mod grid;

pub use coverage::Coverage;
pub use geotransform::GeoTransform;
pub use grid::{BandStatistics, Raster};
