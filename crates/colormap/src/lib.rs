//! # GeoToolbox Colormap
//!
//! Named ColorBrewer-style palettes on top of a multi-stop interpolation
//! engine, plus the [`ColorMap`] ramp type used by raster layer styles.
//!
//! ## Usage
//!
//! ```ignore
//! use geotoolbox_colormap::{ColorMap, ColorMapEntry, Palette};
//!
//! let colors = Palette::YlOrRd.colors(9);
//! let mut ramp = ColorMap::ramp();
//! ramp.push(ColorMapEntry::new(0.0, colors[0]));
//! ```

mod ramp;
mod scheme;

pub use ramp::{ColorMap, ColorMapEntry, ColorMapKind};
pub use scheme::{evaluate, ColorStop, Palette, Rgb};
