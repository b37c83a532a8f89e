//! # GeoToolbox Core
//!
//! Data types shared by the toolbox pipeline and its collaborators.
//!
//! This crate provides:
//! - `CRS`: coordinate reference system identity
//! - `Raster` / `Coverage`: band grids with georeferencing and declared statistics
//! - `FeatureType` / `FeatureCollection`: schema-carrying vector data on `geo-types`
//! - Native I/O for GeoTIFF coverages and JSON feature documents

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{BandStatistics, Coverage, GeoTransform, Raster};
pub use vector::{
    AttributeValue, Feature, FeatureCollection, FeatureType, FieldDescriptor, FieldType,
    GeometryType, ShapeType,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{Coverage, GeoTransform, Raster};
    pub use crate::vector::{
        AttributeValue, Feature, FeatureCollection, FeatureType, FieldType, GeometryType,
    };
}
