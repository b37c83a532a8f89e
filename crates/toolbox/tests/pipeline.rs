//! End-to-end runs through the invoker with recording collaborators.

mod common;

use std::sync::Arc;

use common::{density_points, invoker, map_crs, RecordingExporter, RecordingWorkspace};
use geo_types::point;
use geotoolbox::invoker::TOTAL_UNITS;
use geotoolbox::progress::{CancellationToken, ProgressCounter};
use geotoolbox::registry::{FnProcess, InMemoryRegistry};
use geotoolbox::result::{BoundingBox, GeometryValue, Statistic};
use geotoolbox::{
    ExecutionOutcome, OutputDestination, OutputMetadata, ProcessRequest, ResultMap, ResultValue,
    RunOptions, RunOutcome, ToolboxSettings,
};
use geotoolbox_core::io::read_features;
use geotoolbox_core::{GeometryType, CRS};
use pretty_assertions::assert_eq;

fn results(entries: Vec<(&str, ResultValue)>) -> ExecutionOutcome {
    let mut map = ResultMap::new();
    for (name, value) in entries {
        map.insert(name.to_string(), value);
    }
    ExecutionOutcome::Success(map)
}

#[test]
fn cancelled_after_algorithm_publishes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let token = CancellationToken::new();
    let inner = token.clone();
    let process = FnProcess::new("Sample", move |_, _| {
        inner.cancel();
        results(vec![("points", ResultValue::Features(density_points()))])
    });
    let workspace = Arc::new(RecordingWorkspace::new());
    let exporter = Arc::new(RecordingExporter::new());
    let inv = invoker(InMemoryRegistry::new().with("sample", process), workspace.clone(), exporter.clone());

    let request = ProcessRequest::new("sample")
        .with_output("points", OutputDestination::to_path(dir.path().join("points.json")));
    let report = inv.execute(&request, &ProgressCounter::with_token(token), &RunOptions::default());

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert_eq!(workspace.count(), 0);
    assert!(exporter.calls().is_empty());
}

#[test]
fn cancellation_between_outputs_keeps_earlier_layers() {
    let dir = tempfile::tempdir().unwrap();
    let token = CancellationToken::new();
    let process = FnProcess::new("Sample", |_, _| {
        results(vec![
            ("first", ResultValue::Features(density_points())),
            ("second", ResultValue::Features(density_points())),
        ])
    });
    let workspace = Arc::new(RecordingWorkspace::cancelling(token.clone()));
    let exporter = Arc::new(RecordingExporter::new());
    let inv = invoker(InMemoryRegistry::new().with("sample", process), workspace.clone(), exporter.clone());

    let request = ProcessRequest::new("sample")
        .with_output("first", OutputDestination::to_path(dir.path().join("first.json")))
        .with_output("second", OutputDestination::to_path(dir.path().join("second.json")));
    let report = inv.execute(&request, &ProgressCounter::with_token(token), &RunOptions::default());

    assert!(report.outcome.is_cancelled());
    assert_eq!(workspace.names(), vec!["first"]);
    assert_eq!(exporter.calls().len(), 1);
    assert!(!dir.path().join("second.json").exists());
}

#[test]
fn vector_without_crs_is_persisted_with_map_crs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sampled.json");
    let process = FnProcess::new("Sample", |_, _| {
        results(vec![("points", ResultValue::Features(density_points()))])
    });
    let workspace = Arc::new(RecordingWorkspace::new());
    let inv = invoker(
        InMemoryRegistry::new().with("sample", process),
        workspace.clone(),
        Arc::new(RecordingExporter::new()),
    );

    let request = ProcessRequest::new("sample").with_output("points", OutputDestination::to_path(&path));
    let report = inv.execute(&request, &ProgressCounter::new(), &RunOptions::default());
    assert!(report.outcome.is_success());

    let reopened = read_features(&path).unwrap();
    assert_eq!(reopened.schema().crs(), Some(&map_crs()));
    assert_eq!(workspace.names(), vec!["sampled"]);
}

#[test]
fn algorithm_failure_attaches_nothing_and_reports_nothing() {
    let process = FnProcess::new("Broken", |_, _| ExecutionOutcome::Failed("singular matrix".to_string()));
    let workspace = Arc::new(RecordingWorkspace::new());
    let inv = invoker(
        InMemoryRegistry::new().with("broken", process),
        workspace.clone(),
        Arc::new(RecordingExporter::new()),
    );

    let report = inv.execute(&ProcessRequest::new("broken"), &ProgressCounter::new(), &RunOptions::default());
    match &report.outcome {
        RunOutcome::Failed { cause } => assert!(cause.contains("singular matrix")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(report.report, "");
    assert_eq!(workspace.count(), 0);
}

#[test]
fn panicking_algorithm_is_a_failure() {
    let process = FnProcess::new("Broken", |_, _| -> ExecutionOutcome {
        let values: Vec<f64> = Vec::new();
        results(vec![("n", ResultValue::Scalar(values[3]))])
    });
    let workspace = Arc::new(RecordingWorkspace::new());
    let inv = invoker(
        InMemoryRegistry::new().with("broken", process),
        workspace.clone(),
        Arc::new(RecordingExporter::new()),
    );
    let report = inv.execute(&ProcessRequest::new("broken"), &ProgressCounter::new(), &RunOptions::default());
    assert!(report.outcome.is_failed());
    assert!(report.report.is_empty());
    assert_eq!(workspace.count(), 0);
}

#[test]
fn publish_failure_is_contained_to_its_output() {
    let dir = tempfile::tempdir().unwrap();
    let process = FnProcess::new("Mixed", |_, _| {
        results(vec![
            ("lost", ResultValue::Features(density_points())),
            ("kept", ResultValue::Features(density_points())),
            ("mean", ResultValue::Scalar(5.5)),
        ])
    });
    let workspace = Arc::new(RecordingWorkspace::new());
    let inv = invoker(
        InMemoryRegistry::new().with("mixed", process),
        workspace.clone(),
        Arc::new(RecordingExporter::new()),
    );

    // "lost" has no destination
    let request = ProcessRequest::new("mixed")
        .with_output("kept", OutputDestination::to_path(dir.path().join("kept.json")));
    let report = inv.execute(&request, &ProgressCounter::new(), &RunOptions::default());

    assert!(report.outcome.is_success());
    assert_eq!(report.outcome.published().len(), 1);
    assert_eq!(workspace.names(), vec!["kept"]);
    assert!(report.report.contains("<h2>5.5</h2>"));
}

#[test]
fn only_output_failing_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let process = FnProcess::new("Sample", |_, _| {
        results(vec![("points", ResultValue::Features(density_points()))])
    });
    let workspace = Arc::new(RecordingWorkspace::new());
    let inv = invoker(
        InMemoryRegistry::new().with("sample", process),
        workspace.clone(),
        Arc::new(RecordingExporter::failing()),
    );
    let request = ProcessRequest::new("sample")
        .with_output("points", OutputDestination::to_path(dir.path().join("points.json")));
    let report = inv.execute(&request, &ProgressCounter::new(), &RunOptions::default());

    match &report.outcome {
        RunOutcome::Failed { cause } => assert!(cause.contains("disk full")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(workspace.count(), 0);
}

#[test]
fn rejected_attachment_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.json");
    let process = FnProcess::new("Sample", |_, _| {
        results(vec![("points", ResultValue::Features(density_points()))])
    });
    let inv = invoker(
        InMemoryRegistry::new().with("sample", process),
        Arc::new(RecordingWorkspace::rejecting()),
        Arc::new(RecordingExporter::new()),
    );
    let request = ProcessRequest::new("sample").with_output("points", OutputDestination::to_path(&path));
    let report = inv.execute(&request, &ProgressCounter::new(), &RunOptions::default());

    assert!(report.outcome.is_success());
    let published = report.outcome.published();
    assert_eq!(published.len(), 1);
    assert!(!published[0].attached);
    assert!(path.exists());
}

#[test]
fn add_layer_toggle_off_persists_without_attaching() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.json");
    let process = FnProcess::new("Sample", |_, _| {
        results(vec![("points", ResultValue::Features(density_points()))])
    });
    let workspace = Arc::new(RecordingWorkspace::new());
    let inv = invoker(
        InMemoryRegistry::new().with("sample", process),
        workspace.clone(),
        Arc::new(RecordingExporter::new()),
    )
    .with_settings(ToolboxSettings::default().with_add_layer_automatically(false));

    let request = ProcessRequest::new("sample").with_output("points", OutputDestination::to_path(&path));
    let report = inv.execute(&request, &ProgressCounter::new(), &RunOptions::default());

    assert!(report.outcome.is_success());
    assert!(path.exists());
    assert_eq!(workspace.count(), 0);
}

#[test]
fn geometry_and_bounding_box_become_single_feature_layers() {
    let dir = tempfile::tempdir().unwrap();
    let process = FnProcess::new("Mean Center", |_, _| {
        results(vec![
            ("center", ResultValue::Geometry(GeometryValue::new(point!(x: 3.0, y: 4.0)))),
            (
                "extent",
                ResultValue::BoundingBox(BoundingBox::new(0.0, 0.0, 6.0, 8.0).with_crs(CRS::from_epsg(4326))),
            ),
        ])
    });
    let workspace = Arc::new(RecordingWorkspace::new());
    let inv = invoker(
        InMemoryRegistry::new().with("center", process),
        workspace.clone(),
        Arc::new(RecordingExporter::new()),
    );
    let request = ProcessRequest::new("center")
        .with_output("center", OutputDestination::to_path(dir.path().join("center.json")))
        .with_output(
            "extent",
            OutputDestination::to_path(dir.path().join("extent.json")).with_display_name("Extent"),
        );
    let report = inv.execute(&request, &ProgressCounter::new(), &RunOptions::default());
    assert!(report.outcome.is_success());

    let center = read_features(dir.path().join("center.json")).unwrap();
    assert_eq!(center.len(), 1);
    assert_eq!(center.schema().name(), "Mean Center");
    assert_eq!(center.schema().geometry_type(), GeometryType::Point);
    assert_eq!(center.schema().crs(), Some(&map_crs()));

    let extent = read_features(dir.path().join("extent.json")).unwrap();
    assert_eq!(extent.schema().geometry_type(), GeometryType::Polygon);
    assert_eq!(extent.schema().crs().and_then(|c| c.epsg()), Some(4326));

    assert_eq!(workspace.names(), vec!["center", "Extent"]);
}

#[test]
fn report_fragments_follow_output_order() {
    let process = FnProcess::new("Moran", |_, _| {
        results(vec![
            (
                "index",
                ResultValue::Statistic(Statistic::new("Global Moran's I").with("Observed", 0.25)),
            ),
            ("z", ResultValue::Scalar(2.0)),
            ("note", ResultValue::Opaque("weights: queen".to_string())),
        ])
    });
    let inv = invoker(
        InMemoryRegistry::new().with("moran", process),
        Arc::new(RecordingWorkspace::new()),
        Arc::new(RecordingExporter::new()),
    );
    let report = inv.execute(&ProcessRequest::new("moran"), &ProgressCounter::new(), &RunOptions::default());

    let table = report.report.find("<table>").unwrap();
    let heading = report.report.find("<h2>2</h2>").unwrap();
    let pre = report.report.find("<pre>weights: queen</pre>").unwrap();
    assert!(table < heading && heading < pre);
    assert_eq!(report.report.matches("<h1>Moran</h1>").count(), 3);
}

#[test]
fn progress_always_totals_one_hundred() {
    for outputs in [1usize, 3, 7] {
        let process = FnProcess::new("Many", move |_, progress| {
            progress.advance(40);
            let mut map = ResultMap::new();
            for i in 0..outputs {
                map.insert(format!("v{}", i), ResultValue::Scalar(i as f64));
            }
            ExecutionOutcome::Success(map)
        });
        let inv = invoker(
            InMemoryRegistry::new().with("many", process),
            Arc::new(RecordingWorkspace::new()),
            Arc::new(RecordingExporter::new()),
        );
        let progress = ProgressCounter::new();
        inv.execute(&ProcessRequest::new("many"), &progress, &RunOptions::default());
        assert_eq!(progress.worked(), TOTAL_UNITS, "{} outputs", outputs);
    }
}

#[test]
fn task_names_reach_the_progress_sink() {
    let dir = tempfile::tempdir().unwrap();
    let process = FnProcess::new("Sample", |_, _| {
        results(vec![("points", ResultValue::Features(density_points()))])
    })
    .with_metadata("points", OutputMetadata::styled("Q.density"));
    let inv = invoker(
        InMemoryRegistry::new().with("sample", process),
        Arc::new(RecordingWorkspace::new()),
        Arc::new(RecordingExporter::new()),
    );
    let request = ProcessRequest::new("sample")
        .with_output("points", OutputDestination::to_path(dir.path().join("p.json")));
    let progress = ProgressCounter::new();
    inv.execute(&request, &progress, &RunOptions::default());
    assert_eq!(
        progress.tasks(),
        vec!["Executing Sample", "Writing result", "Adding layer"]
    );
}
