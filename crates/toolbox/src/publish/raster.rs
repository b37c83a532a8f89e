//! Raster publishing with a classified color ramp when the grid declares
//! its value range.

use geotoolbox_colormap::{ColorMap, ColorMapEntry, Palette};
use geotoolbox_core::Coverage;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::{attach, destination_path, display_name, PublishContext, Publication};
use crate::error::{Result, ToolboxError};
use crate::report::format_number;
use crate::request::OutputDestination;
use crate::result::OutputMetadata;
use crate::workspace::{ArtifactInfo, ArtifactStyle, PublishedArtifact};

/// Palettes a classified raster ramp is drawn from
pub const RAMP_PALETTES: [Palette; 6] = [
    Palette::RdYlGn,
    Palette::YlOrRd,
    Palette::YlOrBr,
    Palette::Oranges,
    Palette::YlGnBu,
    Palette::Spectral,
];

/// Metadata tag that pins the ramp palette instead of a random pick
pub const PALETTE_TAG: &str = "palette";

/// Symbolization of a raster output.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageStyle {
    /// Classified color ramp over the declared value range
    Ramp { palette: Palette, color_map: ColorMap },
    /// Rendering left to the workspace
    Default,
}

/// `classes + 1` equally spaced breaks from `min` to `max`
pub fn ramp_breaks(min: f64, max: f64, classes: usize) -> Vec<f64> {
    let classes = classes.max(1);
    let interval = (max - min) / classes as f64;
    (0..=classes).map(|i| min + i as f64 * interval).collect()
}

/// Build a classified ramp. A transparent "No Data" entry goes first when
/// `nodata` sorts below the first break and last when it sorts above the
/// last one; a nodata value inside the range gets no entry.
pub fn build_coverage_ramp(
    min: f64,
    max: f64,
    nodata: Option<f64>,
    palette: Palette,
    classes: usize,
) -> ColorMap {
    let breaks = ramp_breaks(min, max, classes);
    let colors = palette.colors(breaks.len());

    let mut color_map = ColorMap::ramp();
    for (quantity, color) in breaks.iter().zip(colors) {
        let mut entry = ColorMapEntry::new(*quantity, color);
        entry.label = Some(format_number(*quantity));
        color_map.push(entry);
    }

    if let (Some(nodata), Some(first), Some(last)) = (nodata, breaks.first(), breaks.last()) {
        if nodata < *first {
            color_map.entries.insert(0, ColorMapEntry::nodata(nodata));
        } else if nodata > *last {
            color_map.push(ColorMapEntry::nodata(nodata));
        }
    }
    color_map
}

/// Ramp style for single-band coverages with a declared range, default
/// style otherwise.
pub fn coverage_style<R: Rng + ?Sized>(
    coverage: &Coverage,
    classes: usize,
    palette: Option<Palette>,
    rng: &mut R,
) -> CoverageStyle {
    let Some((min, max)) = coverage.declared_range() else {
        return CoverageStyle::Default;
    };
    if coverage.band_count() != 1 {
        return CoverageStyle::Default;
    }

    let palette = palette
        .or_else(|| RAMP_PALETTES.choose(rng).copied())
        .unwrap_or(Palette::Spectral);
    CoverageStyle::Ramp {
        palette,
        color_map: build_coverage_ramp(min, max, coverage.nodata(), palette, classes),
    }
}

/// Publish a coverage: export it, derive its ramp and attach it.
pub fn publish_raster(
    ctx: &PublishContext<'_>,
    output: &str,
    coverage: Coverage,
    destination: &OutputDestination,
    meta: &OutputMetadata,
) -> Result<Publication> {
    let path = destination_path(output, destination)?;

    ctx.progress.set_task("Writing result");
    let persisted = ctx
        .exporter
        .export_raster(&coverage, path)
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

    let pinned = meta.get(PALETTE_TAG).and_then(Palette::from_name);
    let style = coverage_style(&coverage, ctx.settings.raster_classes, pinned, &mut rand::thread_rng());
    if let CoverageStyle::Ramp { palette, .. } = &style {
        debug!(output, palette = palette.name(), "classified raster ramp");
    }

    let artifact = PublishedArtifact {
        path: persisted.path.clone(),
        info: ArtifactInfo::Raster {
            band_count: persisted.band_count,
            rows: persisted.rows,
            cols: persisted.cols,
            crs: persisted.crs,
        },
        style: ArtifactStyle::Coverage(style),
    };
    publication.attached = attach(ctx, artifact, &name);
    Ok(publication)
}
