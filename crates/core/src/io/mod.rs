//! I/O operations for reading and writing geospatial data

mod features;
mod geotiff;

pub use features::{read_features, truncate_field_names, write_features};
pub use geotiff::{read_geotiff, write_geotiff};
