//! Output publishers: export, style, attach.

pub mod raster;
pub mod vector;

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::ToolboxSettings;
use crate::error::{Result, ToolboxError};
use crate::export::Exporter;
use crate::progress::ProgressSink;
use crate::request::OutputDestination;
use crate::workspace::{MapContext, PublishedArtifact, WorkspaceAttach};

pub use raster::publish_raster;
pub use vector::publish_vector;

/// Collaborators shared by the publishers during one run.
#[derive(Clone, Copy)]
pub struct PublishContext<'a> {
    pub exporter: &'a dyn Exporter,
    pub workspace: &'a dyn WorkspaceAttach,
    pub map: &'a dyn MapContext,
    pub settings: &'a ToolboxSettings,
    pub progress: &'a dyn ProgressSink,
}

/// Summary of one published output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub output: String,
    pub display_name: String,
    pub path: PathBuf,
    /// Whether the workspace accepted the artifact
    pub attached: bool,
}

pub(crate) fn destination_path<'d>(output: &str, destination: &'d OutputDestination) -> Result<&'d Path> {
    destination
        .path()
        .ok_or_else(|| ToolboxError::publish(output, "no destination path"))
}

pub(crate) fn display_name(output: &str, destination: &OutputDestination) -> String {
    destination.display_name().unwrap_or_else(|| output.to_string())
}

/// Hand an artifact to the workspace. Failures are logged, never fatal:
/// the artifact stays on disk.
pub(crate) fn attach(ctx: &PublishContext<'_>, artifact: PublishedArtifact, name: &str) -> bool {
    if !ctx.settings.add_layer_automatically {
        return false;
    }
    ctx.progress.set_task("Adding layer");
    match ctx.workspace.attach(artifact, name) {
        Ok(()) => true,
        Err(e) => {
            warn!(layer = name, "{}", e);
            false
        }
    }
}
