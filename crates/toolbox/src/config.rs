//! Toolbox settings.
//!
//! Settings can be loaded from a JSON file; `GEOTOOLBOX_*` environment
//! variables override file values.
//!
//! ```json
//! {
//!   "add_layer_automatically": true,
//!   "use_default_style": true,
//!   "feature_opacity": 0.8,
//!   "graduated_palette": "Blues",
//!   "graduated_classes": 5,
//!   "raster_classes": 8
//! }
//! ```

use std::path::Path;

use geotoolbox_colormap::Palette;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolboxError};
use crate::style::StyleDefaults;

fn default_true() -> bool {
    true
}

fn default_opacity() -> f32 {
    0.8
}

fn default_palette() -> Palette {
    Palette::Blues
}

fn default_graduated_classes() -> usize {
    5
}

fn default_raster_classes() -> usize {
    8
}

/// Workspace and styling toggles shared by every run of an invoker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolboxSettings {
    /// Attach published outputs to the workspace
    #[serde(default = "default_true")]
    pub add_layer_automatically: bool,

    /// Infer a style from output metadata; otherwise every vector layer gets
    /// the single-symbol rule
    #[serde(default = "default_true")]
    pub use_default_style: bool,

    #[serde(default = "default_opacity")]
    pub feature_opacity: f32,

    #[serde(default = "default_palette")]
    pub graduated_palette: Palette,

    #[serde(default = "default_graduated_classes")]
    pub graduated_classes: usize,

    #[serde(default = "default_raster_classes")]
    pub raster_classes: usize,
}

impl Default for ToolboxSettings {
    fn default() -> Self {
        Self {
            add_layer_automatically: true,
            use_default_style: true,
            feature_opacity: default_opacity(),
            graduated_palette: default_palette(),
            graduated_classes: default_graduated_classes(),
            raster_classes: default_raster_classes(),
        }
    }
}

impl ToolboxSettings {
    /// Load settings from a JSON file, then apply environment overrides.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ToolboxError::Settings(format!("{}: {}", path.display(), e)))?;
        let mut settings = Self::from_json(&contents)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let settings: Self =
            serde_json::from_str(contents).map_err(|e| ToolboxError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.feature_opacity) {
            return Err(ToolboxError::Settings(format!(
                "feature_opacity must be in [0, 1], got {}",
                self.feature_opacity
            )));
        }
        if self.graduated_classes < 2 || self.raster_classes < 2 {
            return Err(ToolboxError::Settings(
                "class counts must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("GEOTOOLBOX_ADD_LAYER_AUTOMATICALLY") {
            if let Ok(b) = v.parse() {
                self.add_layer_automatically = b;
            }
        }
        if let Ok(v) = std::env::var("GEOTOOLBOX_USE_DEFAULT_STYLE") {
            if let Ok(b) = v.parse() {
                self.use_default_style = b;
            }
        }
        if let Ok(v) = std::env::var("GEOTOOLBOX_GRADUATED_PALETTE") {
            if let Some(p) = Palette::from_name(&v) {
                self.graduated_palette = p;
            }
        }
    }

    pub fn with_add_layer_automatically(mut self, enabled: bool) -> Self {
        self.add_layer_automatically = enabled;
        self
    }

    pub fn with_use_default_style(mut self, enabled: bool) -> Self {
        self.use_default_style = enabled;
        self
    }

    pub fn with_feature_opacity(mut self, opacity: f32) -> Self {
        self.feature_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_graduated_palette(mut self, palette: Palette) -> Self {
        self.graduated_palette = palette;
        self
    }

    pub fn with_graduated_classes(mut self, classes: usize) -> Self {
        self.graduated_classes = classes;
        self
    }

    pub fn with_raster_classes(mut self, classes: usize) -> Self {
        self.raster_classes = classes;
        self
    }

    /// Defaults handed to the style engine
    pub fn style_defaults(&self) -> StyleDefaults {
        StyleDefaults {
            opacity: self.feature_opacity,
            palette: self.graduated_palette,
            classes: self.graduated_classes,
        }
    }
}
