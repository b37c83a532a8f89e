//! Built-in raster processes exposed by the command line.

use geotoolbox::registry::{FnProcess, InMemoryRegistry, OutputDef, OutputKind, ParamDef, ParamKind};
use geotoolbox::{
    BoundingBox, ExecutionOutcome, Inputs, OutputMetadata, ParamValue, ProgressSink, ResultMap,
    ResultValue, Statistic,
};
use geotoolbox_core::{
    AttributeValue, Coverage, Feature, FeatureCollection, FeatureType, FieldType, GeometryType,
    Raster,
};

/// Registry with every built-in process
pub fn builtin_registry() -> InMemoryRegistry {
    InMemoryRegistry::new()
        .with(
            "raster.describe",
            FnProcess::new("Describe raster", describe)
                .with_input(ParamDef::required("raster", ParamKind::Coverage))
                .with_output(OutputDef::new("cells", OutputKind::Report)),
        )
        .with(
            "raster.extent",
            FnProcess::new("Raster extent", extent)
                .with_input(ParamDef::required("raster", ParamKind::Coverage))
                .with_output(OutputDef::new("extent", OutputKind::Vector)),
        )
        .with(
            "raster.rescale",
            FnProcess::new("Rescale raster", rescale)
                .with_input(ParamDef::required("raster", ParamKind::Coverage))
                .with_input(ParamDef::optional("min", ParamKind::Number))
                .with_input(ParamDef::optional("max", ParamKind::Number))
                .with_output(OutputDef::new("rescaled", OutputKind::Raster)),
        )
        .with(
            "raster.sample_points",
            FnProcess::new("Sample raster to points", sample_points)
                .with_input(ParamDef::required("raster", ParamKind::Coverage))
                .with_input(ParamDef::optional("step", ParamKind::Number))
                .with_output(OutputDef::new("samples", OutputKind::Vector))
                .with_metadata("samples", OutputMetadata::styled("Quantile.value")),
        )
}

fn coverage_input(inputs: &Inputs) -> Result<&Coverage, String> {
    match inputs.get("raster") {
        Some(ParamValue::Coverage(coverage)) => Ok(coverage),
        Some(other) => Err(format!("raster: expected coverage, got {}", other.kind_name())),
        None => Err("raster: missing".to_string()),
    }
}

fn number_input(inputs: &Inputs, name: &str, default: f64) -> f64 {
    inputs.get(name).and_then(ParamValue::as_f64).unwrap_or(default)
}

/// Per-band statistics plus the total cell count
fn describe(inputs: &Inputs, progress: &dyn ProgressSink) -> ExecutionOutcome {
    let coverage = match coverage_input(inputs) {
        Ok(c) => c,
        Err(e) => return ExecutionOutcome::Failed(e),
    };

    let mut results = ResultMap::new();
    let per_band = 100 / coverage.band_count().max(1) as u32;
    for (i, band) in coverage.bands().iter().enumerate() {
        if progress.is_cancelled() {
            return ExecutionOutcome::Cancelled;
        }
        let stats = band.statistics();
        let mut stat = Statistic::new(format!("Band {}", i + 1))
            .with("Valid cells", stats.valid_count)
            .with("NoData cells", stats.nodata_count);
        if let (Some(min), Some(max), Some(mean)) = (stats.min, stats.max, stats.mean) {
            stat = stat.with("Minimum", min).with("Maximum", max).with("Mean", mean);
        }
        results.insert(format!("band_{}", i + 1), ResultValue::Statistic(stat));
        progress.advance(per_band);
    }
    results.insert(
        "cells".to_string(),
        ResultValue::Scalar((coverage.rows() * coverage.cols()) as f64),
    );
    ExecutionOutcome::Success(results)
}

fn extent(inputs: &Inputs, _progress: &dyn ProgressSink) -> ExecutionOutcome {
    let coverage = match coverage_input(inputs) {
        Ok(c) => c,
        Err(e) => return ExecutionOutcome::Failed(e),
    };
    let (min_x, min_y, max_x, max_y) = coverage.bounds();
    let mut bbox = BoundingBox::new(min_x, min_y, max_x, max_y);
    if let Some(crs) = coverage.crs() {
        bbox = bbox.with_crs(crs.clone());
    }

    let mut results = ResultMap::new();
    results.insert("extent".to_string(), ResultValue::BoundingBox(bbox));
    ExecutionOutcome::Success(results)
}

/// Linear stretch of every band into `[min, max]`; the output declares
/// that range so it gets a color ramp.
fn rescale(inputs: &Inputs, progress: &dyn ProgressSink) -> ExecutionOutcome {
    let coverage = match coverage_input(inputs) {
        Ok(c) => c,
        Err(e) => return ExecutionOutcome::Failed(e),
    };
    let lo = number_input(inputs, "min", 0.0);
    let hi = number_input(inputs, "max", 100.0);
    if hi <= lo {
        return ExecutionOutcome::Failed(format!("max ({}) must be greater than min ({})", hi, lo));
    }

    let per_band = 100 / coverage.band_count().max(1) as u32;
    let mut bands = Vec::with_capacity(coverage.band_count());
    for band in coverage.bands() {
        if progress.is_cancelled() {
            return ExecutionOutcome::Cancelled;
        }
        bands.push(stretch(band, lo, hi));
        progress.advance(per_band);
    }

    let mut rescaled = match Coverage::new(format!("{}_rescaled", coverage.name()), bands) {
        Ok(c) => c
            .with_transform(*coverage.transform())
            .with_declared_range(lo, hi),
        Err(e) => return ExecutionOutcome::Failed(e.to_string()),
    };
    if let Some(crs) = coverage.crs() {
        rescaled = rescaled.with_crs(crs.clone());
    }

    let mut results = ResultMap::new();
    results.insert("rescaled".to_string(), ResultValue::Raster(rescaled));
    ExecutionOutcome::Success(results)
}

fn stretch(band: &Raster, lo: f64, hi: f64) -> Raster {
    let stats = band.statistics();
    let (min, max) = match (stats.min, stats.max) {
        (Some(min), Some(max)) => (min, max),
        _ => return band.clone(),
    };
    let span = max - min;
    let data = band.data().mapv(|v| {
        if band.is_nodata(v) {
            v
        } else if span == 0.0 {
            lo
        } else {
            lo + (v - min) / span * (hi - lo)
        }
    });
    let mut out = Raster::from_array(data);
    out.set_nodata(band.nodata());
    out
}

/// One point per `step` cells of the first band, carrying the cell value
fn sample_points(inputs: &Inputs, progress: &dyn ProgressSink) -> ExecutionOutcome {
    let coverage = match coverage_input(inputs) {
        Ok(c) => c,
        Err(e) => return ExecutionOutcome::Failed(e),
    };
    let step = number_input(inputs, "step", 1.0).max(1.0) as usize;
    let Some(band) = coverage.band(0) else {
        return ExecutionOutcome::Failed("raster has no bands".to_string());
    };

    let mut schema = FeatureType::new("samples", GeometryType::Point).with_field("value", FieldType::Real);
    if let Some(crs) = coverage.crs() {
        schema = schema.with_crs(crs.clone());
    }
    let mut samples = FeatureCollection::new(schema);

    let rows: Vec<usize> = (0..band.rows()).step_by(step).collect();
    let mut reported = 0;
    for (done, &row) in rows.iter().enumerate() {
        if progress.is_cancelled() {
            return ExecutionOutcome::Cancelled;
        }
        for col in (0..band.cols()).step_by(step) {
            let value = band.data()[[row, col]];
            if band.is_nodata(value) {
                continue;
            }
            let (x, y) = coverage.transform().pixel_to_geo(col, row);
            samples.push(
                Feature::new(geo_point(x, y)).with_property("value", AttributeValue::Float(value)),
            );
        }
        let target = ((done + 1) * 100 / rows.len()) as u32;
        progress.advance(target - reported);
        reported = target;
    }

    let mut results = ResultMap::new();
    results.insert("samples".to_string(), ResultValue::Features(samples));
    ExecutionOutcome::Success(results)
}

fn geo_point(x: f64, y: f64) -> geo_types::Geometry<f64> {
    geo_types::Geometry::Point(geo_types::Point::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geotoolbox::progress::{NullProgress, ProgressCounter};
    use geotoolbox::registry::ProcessRegistry;
    use geotoolbox_core::GeoTransform;

    fn inputs_with(coverage: Coverage) -> Inputs {
        let mut inputs = Inputs::new();
        inputs.insert("raster".to_string(), ParamValue::Coverage(coverage));
        inputs
    }

    fn ramp() -> Coverage {
        let band = Raster::from_vec(vec![0.0, 5.0, 10.0, -1.0], 2, 2)
            .unwrap()
            .with_nodata(-1.0);
        Coverage::single_band("ramp", band).with_transform(GeoTransform::new(100.0, 200.0, 10.0, -10.0))
    }

    #[test]
    fn registry_lists_builtins_in_order() {
        let registry = builtin_registry();
        let ids: Vec<String> = registry.entries().into_iter().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec!["raster.describe", "raster.extent", "raster.rescale", "raster.sample_points"]
        );
        let sampler = registry.resolve("raster.sample_points").unwrap();
        assert_eq!(sampler.output_metadata("samples").style_tag(), Some("Quantile.value"));
    }

    #[test]
    fn rescale_keeps_nodata_and_declares_range() {
        let mut inputs = inputs_with(ramp());
        inputs.insert("max".to_string(), ParamValue::Real(1.0));
        let progress = ProgressCounter::new();
        let ExecutionOutcome::Success(results) = rescale(&inputs, &progress) else {
            panic!("rescale failed");
        };
        let Some(ResultValue::Raster(out)) = results.get("rescaled") else {
            panic!("missing raster");
        };
        assert_eq!(out.declared_range(), Some((0.0, 1.0)));
        let band = out.band(0).unwrap();
        assert_relative_eq!(band.get(0, 1).unwrap(), 0.5);
        assert_eq!(band.get(1, 1).unwrap(), -1.0);
        assert_eq!(progress.worked(), 100);
    }

    #[test]
    fn rescale_rejects_inverted_range() {
        let mut inputs = inputs_with(ramp());
        inputs.insert("min".to_string(), ParamValue::Integer(10));
        inputs.insert("max".to_string(), ParamValue::Integer(1));
        assert!(matches!(rescale(&inputs, &NullProgress), ExecutionOutcome::Failed(_)));
    }

    #[test]
    fn samples_skip_nodata_cells() {
        let progress = ProgressCounter::new();
        let ExecutionOutcome::Success(results) = sample_points(&inputs_with(ramp()), &progress) else {
            panic!("sampling failed");
        };
        let Some(ResultValue::Features(samples)) = results.get("samples") else {
            panic!("missing features");
        };
        assert_eq!(samples.len(), 3);
        assert_eq!(samples.numeric_values("value"), vec![0.0, 5.0, 10.0]);
        assert_eq!(progress.worked(), 100);
    }

    #[test]
    fn extent_matches_transform() {
        let ExecutionOutcome::Success(results) = extent(&inputs_with(ramp()), &NullProgress) else {
            panic!("extent failed");
        };
        let Some(ResultValue::BoundingBox(bbox)) = results.get("extent") else {
            panic!("missing bbox");
        };
        let rect = bbox.rect();
        assert_eq!((rect.min().x, rect.min().y), (100.0, 180.0));
        assert_eq!((rect.max().x, rect.max().y), (120.0, 200.0));
    }

    #[test]
    fn describe_reports_each_band() {
        let ExecutionOutcome::Success(results) = describe(&inputs_with(ramp()), &NullProgress) else {
            panic!("describe failed");
        };
        let names: Vec<&String> = results.keys().collect();
        assert_eq!(names, vec!["band_1", "cells"]);
        assert!(matches!(results.get("cells"), Some(ResultValue::Scalar(n)) if *n == 4.0));
    }
}
