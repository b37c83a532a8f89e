//! Style inference for vector outputs.
//!
//! [`resolve_style`] maps an output's `styles` tag, the persisted schema and
//! the request's input bindings to a [`StyleRule`]. It is pure: no I/O, no
//! workspace access, and it never fails. Anything it cannot interpret
//! yields the single-symbol rule.

pub mod breaks;
pub mod tag;

use geotoolbox_colormap::Palette;
use geotoolbox_core::{FeatureCollection, FeatureType, ShapeType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::request::Inputs;
use tag::{parse_style_tag, StyleTag, TagRenderer};

pub use breaks::class_breaks;

/// Cluster/outlier type field written by local Moran's I
pub const LISA_FIELD: &str = "COType";
/// Z-score field written by Getis-Ord Gi*
pub const Z_SCORE_FIELD: &str = "GiZScore";

const Z_SCORE_CLASSES: usize = 7;

/// How numeric values are split into classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationFunction {
    EqualInterval,
    Quantile,
    StandardDeviation,
    JenksNaturalBreaks,
    None,
}

impl ClassificationFunction {
    pub fn name(self) -> &'static str {
        match self {
            Self::EqualInterval => "Equal Interval",
            Self::Quantile => "Quantile",
            Self::StandardDeviation => "Standard Deviation",
            Self::JenksNaturalBreaks => "Natural Breaks (Jenks)",
            Self::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Fill or stroke color varies by class
    Color,
    /// Marker size varies by class
    GraduatedSymbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Renderer {
    SingleSymbol,
    /// Categorical cluster/outlier map
    Lisa,
    /// Regression residuals
    Ols,
    /// Hot spot z-scores
    ZScore,
    Graduated,
}

/// A resolved symbolization rule.
///
/// `breaks` stays empty until the vector publisher computes it from the
/// persisted features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    pub renderer: Renderer,
    pub field: Option<String>,
    pub classification: ClassificationFunction,
    pub break_count: usize,
    pub palette: Option<Palette>,
    pub symbol_kind: SymbolKind,
    pub opacity: f32,
    pub breaks: Vec<f64>,
}

impl StyleRule {
    pub fn single_symbol(opacity: f32) -> Self {
        Self {
            renderer: Renderer::SingleSymbol,
            field: None,
            classification: ClassificationFunction::None,
            break_count: 0,
            palette: None,
            symbol_kind: SymbolKind::Color,
            opacity,
            breaks: Vec::new(),
        }
    }

    pub fn lisa(opacity: f32) -> Self {
        Self {
            renderer: Renderer::Lisa,
            field: Some(LISA_FIELD.to_string()),
            ..Self::single_symbol(opacity)
        }
    }

    pub fn ols(field: impl Into<String>, opacity: f32) -> Self {
        Self {
            renderer: Renderer::Ols,
            field: Some(field.into()),
            classification: ClassificationFunction::StandardDeviation,
            break_count: 5,
            palette: Some(Palette::Spectral),
            ..Self::single_symbol(opacity)
        }
    }

    pub fn z_score(opacity: f32) -> Self {
        Self {
            renderer: Renderer::ZScore,
            field: Some(Z_SCORE_FIELD.to_string()),
            classification: ClassificationFunction::StandardDeviation,
            break_count: Z_SCORE_CLASSES,
            palette: Some(Palette::Spectral),
            ..Self::single_symbol(opacity)
        }
    }

    /// Graduated rule on a numeric field. Points get graduated markers,
    /// everything else a color ramp.
    pub fn graduated(
        field: impl Into<String>,
        classification: ClassificationFunction,
        shape: ShapeType,
        defaults: &StyleDefaults,
    ) -> Self {
        let symbol_kind = match shape {
            ShapeType::Point => SymbolKind::GraduatedSymbol,
            _ => SymbolKind::Color,
        };
        Self {
            renderer: Renderer::Graduated,
            field: Some(field.into()),
            classification,
            break_count: defaults.classes,
            palette: Some(defaults.palette),
            symbol_kind,
            opacity: defaults.opacity,
            breaks: Vec::new(),
        }
    }

    pub fn is_single_symbol(&self) -> bool {
        self.renderer == Renderer::SingleSymbol
    }

    pub fn is_classified(&self) -> bool {
        self.classification != ClassificationFunction::None && self.field.is_some()
    }

    /// Fill `breaks` from the values of the rule's field.
    pub fn with_breaks_from(mut self, features: &FeatureCollection) -> Self {
        if let (true, Some(field)) = (self.is_classified(), self.field.as_deref()) {
            let values = features.numeric_values(field);
            self.breaks = class_breaks(self.classification, &values, self.break_count);
        }
        self
    }
}

/// Opacity, palette and class count used by inferred rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleDefaults {
    pub opacity: f32,
    pub palette: Palette,
    pub classes: usize,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            opacity: 0.8,
            palette: Palette::Blues,
            classes: 5,
        }
    }
}

/// Resolve a style with the default opacity, palette and class count.
pub fn resolve_style(tag: Option<&str>, schema: &FeatureType, inputs: &Inputs) -> StyleRule {
    resolve_style_with(tag, schema, inputs, &StyleDefaults::default())
}

pub fn resolve_style_with(
    tag: Option<&str>,
    schema: &FeatureType,
    inputs: &Inputs,
    defaults: &StyleDefaults,
) -> StyleRule {
    let default_rule = StyleRule::single_symbol(defaults.opacity);

    let Some(tag) = tag else {
        if schema.has_field(LISA_FIELD) {
            return StyleRule::lisa(defaults.opacity);
        }
        if schema.has_field(Z_SCORE_FIELD) {
            return StyleRule::z_score(defaults.opacity);
        }
        return default_rule;
    };

    match parse_style_tag(tag) {
        Some(StyleTag {
            renderer: TagRenderer::Lisa,
            ..
        }) => StyleRule::lisa(defaults.opacity),
        Some(StyleTag {
            renderer: TagRenderer::Ols,
            field: Some(field),
        }) => StyleRule::ols(field, defaults.opacity),
        Some(StyleTag {
            renderer: TagRenderer::Classify(function),
            field: Some(field_ref),
        }) => match resolve_numeric_field(&field_ref, schema, inputs) {
            Some(field) => StyleRule::graduated(field, function, schema.shape_type(), defaults),
            None => {
                debug!(tag, "style field is missing or not numeric");
                default_rule
            }
        },
        _ => {
            debug!(tag, "unrecognized style tag");
            default_rule
        }
    }
}

/// A field reference names a schema attribute directly, or an input whose
/// bound value names one.
fn resolve_numeric_field(field_ref: &str, schema: &FeatureType, inputs: &Inputs) -> Option<String> {
    let name = if schema.has_field(field_ref) {
        field_ref.to_string()
    } else {
        inputs.get(field_ref)?.to_string()
    };
    schema
        .field(&name)
        .filter(|f| f.field_type.is_numeric())
        .map(|f| f.name.clone())
}
