//! Workspace boundary: where published artifacts end up.

use std::collections::HashMap;
use std::path::PathBuf;

use geotoolbox_core::{FeatureType, CRS};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Result, ToolboxError};
use crate::publish::raster::CoverageStyle;
use crate::style::StyleRule;

/// Active map context.
pub trait MapContext: Send + Sync {
    /// CRS of the active map
    fn crs(&self) -> CRS;
}

impl MapContext for CRS {
    fn crs(&self) -> CRS {
        self.clone()
    }
}

/// Persisted description of a published output.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactInfo {
    Vector {
        schema: FeatureType,
        feature_count: usize,
    },
    Raster {
        band_count: usize,
        rows: usize,
        cols: usize,
        crs: Option<CRS>,
    },
}

/// Symbolization attached with an artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactStyle {
    Feature(StyleRule),
    Coverage(CoverageStyle),
}

/// An exported output ready to be attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedArtifact {
    pub path: PathBuf,
    pub info: ArtifactInfo,
    pub style: ArtifactStyle,
}

impl PublishedArtifact {
    pub fn is_vector(&self) -> bool {
        matches!(self.info, ArtifactInfo::Vector { .. })
    }

    pub fn feature_style(&self) -> Option<&StyleRule> {
        match &self.style {
            ArtifactStyle::Feature(rule) => Some(rule),
            ArtifactStyle::Coverage(_) => None,
        }
    }

    pub fn coverage_style(&self) -> Option<&CoverageStyle> {
        match &self.style {
            ArtifactStyle::Coverage(style) => Some(style),
            ArtifactStyle::Feature(_) => None,
        }
    }
}

/// Takes ownership of published artifacts.
pub trait WorkspaceAttach: Send + Sync {
    fn attach(&self, artifact: PublishedArtifact, display_name: &str) -> Result<()>;
}

/// Unique identifier for a layer in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// An attached artifact with display state.
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub artifact: PublishedArtifact,
    pub visible: bool,
}

/// In-memory workspace. Mutations are serialized behind a mutex so
/// concurrent runs can attach safely.
pub struct LayerCatalog {
    inner: Mutex<CatalogState>,
}

struct CatalogState {
    layers: HashMap<LayerId, Layer>,
    /// Display order (front to back)
    layer_order: Vec<LayerId>,
    active_layer: Option<LayerId>,
    next_id: u64,
}

impl Default for LayerCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerCatalog {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CatalogState {
                layers: HashMap::new(),
                layer_order: Vec::new(),
                active_layer: None,
                next_id: 1,
            }),
        }
    }

    /// Add a layer and return its id. It becomes the active layer.
    pub fn add(&self, name: impl Into<String>, artifact: PublishedArtifact) -> LayerId {
        let mut state = self.inner.lock();
        let id = LayerId(state.next_id);
        state.next_id += 1;
        state.layer_order.push(id);
        state.active_layer = Some(id);
        state.layers.insert(
            id,
            Layer {
                id,
                name: name.into(),
                artifact,
                visible: true,
            },
        );
        id
    }

    pub fn get(&self, id: LayerId) -> Option<Layer> {
        self.inner.lock().layers.get(&id).cloned()
    }

    pub fn active(&self) -> Option<Layer> {
        let state = self.inner.lock();
        state.active_layer.and_then(|id| state.layers.get(&id).cloned())
    }

    pub fn remove(&self, id: LayerId) {
        let mut state = self.inner.lock();
        state.layers.remove(&id);
        state.layer_order.retain(|&i| i != id);
        if state.active_layer == Some(id) {
            state.active_layer = state.layer_order.last().copied();
        }
    }

    /// Layers in display order
    pub fn layers(&self) -> Vec<Layer> {
        let state = self.inner.lock();
        state
            .layer_order
            .iter()
            .filter_map(|id| state.layers.get(id).cloned())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.layers().into_iter().map(|l| l.name).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().layers.is_empty()
    }
}

impl WorkspaceAttach for LayerCatalog {
    fn attach(&self, artifact: PublishedArtifact, display_name: &str) -> Result<()> {
        if display_name.trim().is_empty() {
            return Err(ToolboxError::Attachment {
                name: display_name.to_string(),
                reason: "layer name is empty".to_string(),
            });
        }
        let id = self.add(display_name, artifact);
        debug!(layer = id.0, name = display_name, "layer attached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(path: &str) -> PublishedArtifact {
        PublishedArtifact {
            path: PathBuf::from(path),
            info: ArtifactInfo::Raster {
                band_count: 1,
                rows: 2,
                cols: 2,
                crs: None,
            },
            style: ArtifactStyle::Coverage(CoverageStyle::Default),
        }
    }

    #[test]
    fn attach_keeps_display_order() {
        let catalog = LayerCatalog::new();
        catalog.attach(artifact("a.tif"), "first").unwrap();
        catalog.attach(artifact("b.tif"), "second").unwrap();
        assert_eq!(catalog.names(), vec!["first", "second"]);
        assert_eq!(catalog.active().map(|l| l.name), Some("second".to_string()));
    }

    #[test]
    fn remove_moves_active_layer_back() {
        let catalog = LayerCatalog::new();
        let a = catalog.add("first", artifact("a.tif"));
        let b = catalog.add("second", artifact("b.tif"));
        catalog.remove(b);
        assert_eq!(catalog.active().map(|l| l.id), Some(a));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(b).is_none());
    }

    #[test]
    fn empty_name_is_rejected() {
        let catalog = LayerCatalog::new();
        let err = catalog.attach(artifact("a.tif"), "  ").unwrap_err();
        assert!(matches!(err, ToolboxError::Attachment { .. }));
        assert!(catalog.is_empty());
    }

    #[test]
    fn crs_is_a_map_context() {
        let map: &dyn MapContext = &CRS::from_epsg(3857);
        assert_eq!(map.crs().epsg(), Some(3857));
    }
}
