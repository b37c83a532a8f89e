//! Recording fakes shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use geo_types::point;
use geotoolbox::export::{Exporter, FileExporter, PersistedRaster, PersistedVector};
use geotoolbox::progress::CancellationToken;
use geotoolbox::registry::InMemoryRegistry;
use geotoolbox::workspace::{PublishedArtifact, WorkspaceAttach};
use geotoolbox::{ProcessInvoker, Result, ToolboxError};
use geotoolbox_core::{
    AttributeValue, Coverage, Feature, FeatureCollection, FeatureType, FieldType, GeometryType, CRS,
};
use parking_lot::Mutex;

/// Workspace that records every attach call.
#[derive(Default)]
pub struct RecordingWorkspace {
    attached: Mutex<Vec<(String, PublishedArtifact)>>,
    reject: bool,
    cancel_on_attach: Option<CancellationToken>,
}

impl RecordingWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workspace that refuses every artifact
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// Workspace that flips `token` after the first successful attach
    pub fn cancelling(token: CancellationToken) -> Self {
        Self {
            cancel_on_attach: Some(token),
            ..Self::default()
        }
    }

    pub fn attached(&self) -> Vec<(String, PublishedArtifact)> {
        self.attached.lock().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.attached.lock().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.attached.lock().len()
    }
}

impl WorkspaceAttach for RecordingWorkspace {
    fn attach(&self, artifact: PublishedArtifact, display_name: &str) -> Result<()> {
        if self.reject {
            return Err(ToolboxError::Attachment {
                name: display_name.to_string(),
                reason: "workspace is read-only".to_string(),
            });
        }
        self.attached.lock().push((display_name.to_string(), artifact));
        if let Some(token) = &self.cancel_on_attach {
            token.cancel();
        }
        Ok(())
    }
}

/// File exporter that counts calls and can be told to fail.
#[derive(Default)]
pub struct RecordingExporter {
    inner: FileExporter,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl Exporter for RecordingExporter {
    fn export_vector(&self, collection: FeatureCollection, path: &Path) -> Result<PersistedVector> {
        self.calls.lock().push(format!("vector:{}", path.display()));
        if self.fail {
            return Err(geotoolbox_core::Error::Other("disk full".to_string()).into());
        }
        self.inner.export_vector(collection, path)
    }

    fn export_raster(&self, coverage: &Coverage, path: &Path) -> Result<PersistedRaster> {
        self.calls.lock().push(format!("raster:{}", path.display()));
        if self.fail {
            return Err(geotoolbox_core::Error::Other("disk full".to_string()).into());
        }
        self.inner.export_raster(coverage, path)
    }
}

pub fn map_crs() -> CRS {
    CRS::from_epsg(5186)
}

pub fn invoker(
    registry: InMemoryRegistry,
    workspace: Arc<RecordingWorkspace>,
    exporter: Arc<RecordingExporter>,
) -> ProcessInvoker {
    ProcessInvoker::new(Arc::new(registry), workspace, Arc::new(map_crs())).with_exporter(exporter)
}

/// Points with a numeric `density` attribute and no CRS
pub fn density_points() -> FeatureCollection {
    let schema = FeatureType::new("sampled", GeometryType::Point).with_field("density", FieldType::Real);
    let features = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]
        .iter()
        .enumerate()
        .map(|(i, d)| {
            Feature::new(point!(x: i as f64, y: 0.0).into())
                .with_property("density", AttributeValue::Float(*d))
        })
        .collect();
    FeatureCollection::with_features(schema, features)
}
