//! Vector publishing through the export boundary, styled from the reopened schema.

use geotoolbox_core::FeatureCollection;
use tracing::warn;

use super::{attach, destination_path, display_name, PublishContext, Publication};
use crate::error::{Result, ToolboxError};
use crate::request::{Inputs, OutputDestination};
use crate::result::OutputMetadata;
use crate::style::{resolve_style_with, StyleRule};
use crate::workspace::{ArtifactInfo, ArtifactStyle, PublishedArtifact};

/// Publish a feature collection.
///
/// A collection without a CRS gets the active map CRS. The collection is
/// exported and reopened; the reopened schema drives style resolution and
/// class breaks. Attachment is best-effort.
pub fn publish_vector(
    ctx: &PublishContext<'_>,
    output: &str,
    mut collection: FeatureCollection,
    destination: &OutputDestination,
    meta: &OutputMetadata,
    inputs: &Inputs,
) -> Result<Publication> {
    let path = destination_path(output, destination)?;

    if collection.schema().crs().is_none() {
        let crs = ctx.map.crs();
        warn!(output, crs = %crs, "output has no CRS, using the map CRS");
        collection.schema_mut().set_crs(Some(crs));
    }

    ctx.progress.set_task("Writing result");
    let persisted = ctx
        .exporter
        .export_vector(collection, path)
        .map_err(|e| ToolboxError::publish(output, e))?;

    let name = display_name(output, destination);
    let mut publication = Publication {
        output: output.to_string(),
        display_name: name.clone(),
        path: persisted.path.clone(),
        attached: false,
    };
    if !ctx.settings.add_layer_automatically {
        return Ok(publication);
    }

    let features = &persisted.collection;
    let schema = features.schema();
    let rule = if ctx.settings.use_default_style {
        resolve_style_with(meta.style_tag(), schema, inputs, &ctx.settings.style_defaults())
    } else {
        StyleRule::single_symbol(ctx.settings.feature_opacity)
    }
    .with_breaks_from(features);

    let artifact = PublishedArtifact {
        path: persisted.path.clone(),
        info: ArtifactInfo::Vector {
            schema: schema.clone(),
            feature_count: features.len(),
        },
        style: ArtifactStyle::Feature(rule),
    };
    publication.attached = attach(ctx, artifact, &name);
    Ok(publication)
}
