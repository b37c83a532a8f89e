//! Color maps: ordered (quantity, color) entries for raster symbolization.

use serde::{Deserialize, Serialize};

use crate::scheme::Rgb;

/// How values between entries are colored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMapKind {
    /// Linear interpolation between neighbouring entries
    Ramp,
    /// Each entry colors values up to its quantity
    Intervals,
    /// Only exact quantities are colored
    Values,
}

/// One entry of a [`ColorMap`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMapEntry {
    pub quantity: f64,
    pub color: Rgb,
    /// Opacity in [0.0, 1.0]
    pub opacity: f32,
    pub label: Option<String>,
}

impl ColorMapEntry {
    pub fn new(quantity: f64, color: Rgb) -> Self {
        Self {
            quantity,
            color,
            opacity: 1.0,
            label: None,
        }
    }

    /// Fully transparent white entry labelled "No Data"
    pub fn nodata(quantity: f64) -> Self {
        Self {
            quantity,
            color: Rgb::WHITE,
            opacity: 0.0,
            label: Some("No Data".to_string()),
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity <= 0.0
    }
}

/// An ordered list of color map entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMap {
    pub kind: ColorMapKind,
    pub entries: Vec<ColorMapEntry>,
}

impl ColorMap {
    pub fn ramp() -> Self {
        Self {
            kind: ColorMapKind::Ramp,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ColorMapEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Quantities of the opaque entries, in order
    pub fn quantities(&self) -> Vec<f64> {
        self.entries
            .iter()
            .filter(|e| !e.is_transparent())
            .map(|e| e.quantity)
            .collect()
    }
}
