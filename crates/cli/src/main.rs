//! GeoToolbox CLI - run geoprocessing processes and publish their results

mod processes;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use geotoolbox::executor::LogLevel;
use geotoolbox::publish::raster::CoverageStyle;
use geotoolbox::registry::{OutputKind, ProcessRegistry};
use geotoolbox::report::{HtmlReportRenderer, ReportRenderer, TextReportRenderer};
use geotoolbox::workspace::{ArtifactInfo, ArtifactStyle, LayerCatalog};
use geotoolbox::{
    OutputDestination, ParamValue, ProcessInvoker, ProcessRequest, RunEvent, RunOptions,
    RunOutcome, RunReport, ToolboxSettings, Verbosity,
};
use geotoolbox_core::io::{read_features, read_geotiff};
use geotoolbox_core::CRS;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "geotoolbox")]
#[command(author, version, about = "Run geoprocessing processes and publish their results", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available processes
    List,
    /// Run a process, export its spatial outputs and print its report
    Run {
        /// Process identifier, e.g. raster.rescale
        process: String,
        /// Input binding NAME=VALUE; .tif and .json values are read from disk
        #[arg(short, long = "input", value_parser = parse_binding)]
        inputs: Vec<(String, String)>,
        /// Destination override OUTPUT=PATH
        #[arg(short, long = "output", value_parser = parse_binding)]
        outputs: Vec<(String, String)>,
        /// Directory for outputs without an explicit destination
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
        /// JSON settings file
        #[arg(long)]
        settings: Option<PathBuf>,
        /// CRS of the map outputs are reconciled to, e.g. EPSG:5186
        #[arg(long, default_value = "EPSG:4326")]
        map_crs: CRS,
        /// Render the report as HTML instead of plain text
        #[arg(long)]
        html: bool,
        /// Cancel the run after this many seconds
        #[arg(long, value_parser = parse_timeout)]
        timeout: Option<f64>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn progress_bar() -> Result<ProgressBar> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos:>3}% {msg}")?
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn parse_binding(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_timeout(s: &str) -> std::result::Result<f64, String> {
    let secs: f64 = s.parse().map_err(|_| format!("'{}' is not a number of seconds", s))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("timeout must be a finite, non-negative number of seconds, got {}", s));
    }
    Ok(secs)
}

fn has_extension(raw: &str, extensions: &[&str]) -> bool {
    Path::new(raw)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Turn a command-line value into an input binding
fn parse_value(raw: &str) -> Result<ParamValue> {
    if has_extension(raw, &["tif", "tiff"]) {
        let coverage = read_geotiff(raw)
            .with_context(|| format!("Failed to read raster {}", raw))?
            .with_computed_statistics();
        info!("Input: {} x {} ({} band(s))", coverage.cols(), coverage.rows(), coverage.band_count());
        return Ok(ParamValue::Coverage(coverage));
    }
    if has_extension(raw, &["json", "geojson"]) {
        let features = read_features(raw).with_context(|| format!("Failed to read features {}", raw))?;
        info!("Input: {} feature(s)", features.len());
        return Ok(ParamValue::Features(features));
    }
    Ok(match raw {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        _ => {
            if let Ok(v) = raw.parse::<i64>() {
                ParamValue::Integer(v)
            } else if let Ok(v) = raw.parse::<f64>() {
                ParamValue::Real(v)
            } else {
                ParamValue::Text(raw.to_string())
            }
        }
    })
}

fn default_extension(kind: OutputKind) -> &'static str {
    match kind {
        OutputKind::Raster => "tif",
        _ => "json",
    }
}

fn build_request(
    registry: &dyn ProcessRegistry,
    process: &str,
    inputs: Vec<(String, String)>,
    outputs: Vec<(String, String)>,
    out_dir: &Path,
) -> Result<ProcessRequest> {
    let declared = registry
        .resolve(process)
        .ok_or_else(|| anyhow!("Unknown process: {}. Try `geotoolbox list`.", process))?;

    let mut request = ProcessRequest::new(process);
    for (name, raw) in inputs {
        request = request.with_input(name, parse_value(&raw)?);
    }
    for def in declared.outputs() {
        if def.kind.needs_destination() && !outputs.iter().any(|(n, _)| n == def.name) {
            let path = out_dir.join(format!("{}.{}", def.name, default_extension(def.kind)));
            request = request.with_output(def.name, OutputDestination::to_path(path));
        }
    }
    for (name, path) in outputs {
        request = request.with_output(name, OutputDestination::to_path(path));
    }
    Ok(request)
}

/// Drive the progress bar from a background run until it finishes.
fn watch(invoker: &Arc<ProcessInvoker>, request: ProcessRequest, options: RunOptions, timeout: Option<f64>) -> Result<RunReport> {
    let deadline = match timeout {
        Some(secs) => {
            let after = Duration::try_from_secs_f64(secs).context("invalid --timeout")?;
            Some(Instant::now() + after)
        }
        None => None,
    };
    let pb = progress_bar()?;
    let (handle, rx) = invoker.spawn(request, options);

    let report = loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(RunEvent::Progress { worked, total }) => {
                pb.set_length(u64::from(total));
                pb.set_position(u64::from(worked));
            }
            Ok(RunEvent::Log(entry)) => match entry.level {
                LogLevel::Info => pb.set_message(entry.message),
                LogLevel::Success => pb.println(format!("✓ {}", entry.message)),
                LogLevel::Warning => pb.println(format!("! {}", entry.message)),
                LogLevel::Error => pb.println(format!("✗ {}", entry.message)),
            },
            Ok(RunEvent::Finished(report)) => break report,
            Err(RecvTimeoutError::Timeout) => {
                if deadline.is_some_and(|d| Instant::now() >= d) && !handle.token().is_cancelled() {
                    pb.set_message("Cancelling...");
                    handle.cancel();
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                pb.abandon();
                bail!("run ended without a final report");
            }
        }
    };
    pb.finish_and_clear();
    handle.join().map_err(|_| anyhow!("run thread panicked"))?;
    Ok(report)
}

fn print_layers(catalog: &LayerCatalog) {
    if catalog.is_empty() {
        return;
    }
    println!("\nLayers:");
    for layer in catalog.layers() {
        let info = match &layer.artifact.info {
            ArtifactInfo::Vector { feature_count, .. } => format!("{} feature(s)", feature_count),
            ArtifactInfo::Raster { band_count, rows, cols, .. } => {
                format!("{} x {}, {} band(s)", cols, rows, band_count)
            }
        };
        let style = match &layer.artifact.style {
            ArtifactStyle::Feature(rule) if rule.is_classified() => format!(
                "{:?} on {} ({} classes)",
                rule.classification,
                rule.field.as_deref().unwrap_or("?"),
                rule.break_count
            ),
            ArtifactStyle::Feature(rule) => format!("{:?}", rule.renderer),
            ArtifactStyle::Coverage(CoverageStyle::Ramp { palette, color_map }) => {
                format!("{} ramp, {} entries", palette.name(), color_map.len())
            }
            ArtifactStyle::Coverage(CoverageStyle::Default) => "default".to_string(),
        };
        println!("  {} [{}] {}", layer.name, info, layer.artifact.path.display());
        println!("    style: {}", style);
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let registry = processes::builtin_registry();

    match cli.command {
        Commands::List => {
            for (id, title) in registry.entries() {
                println!("{:<24} {}", id, title);
            }
        }

        Commands::Run {
            process,
            inputs,
            outputs,
            out_dir,
            settings,
            map_crs,
            html,
            timeout,
        } => {
            let settings = match settings {
                Some(path) => ToolboxSettings::from_json_file(&path)
                    .with_context(|| format!("Failed to load settings {}", path.display()))?,
                None => ToolboxSettings::default(),
            };
            let request = build_request(&registry, &process, inputs, outputs, &out_dir)?;

            let renderer: Arc<dyn ReportRenderer> = if html {
                Arc::new(HtmlReportRenderer)
            } else {
                Arc::new(TextReportRenderer)
            };
            let catalog = Arc::new(LayerCatalog::new());
            let invoker = Arc::new(
                ProcessInvoker::new(Arc::new(registry), catalog.clone(), Arc::new(map_crs))
                    .with_settings(settings)
                    .with_renderer(renderer),
            );
            let verbosity = if cli.verbose { Verbosity::Verbose } else { Verbosity::Normal };

            let start = Instant::now();
            let report = watch(&invoker, request, RunOptions::with_verbosity(verbosity), timeout)?;

            if !report.report.is_empty() {
                println!("{}", report.report);
            }
            print_layers(&catalog);
            println!("\n{} {}", process, report.outcome);
            println!("  Processing time: {:.2?}", start.elapsed());

            if let RunOutcome::Failed { cause } = report.outcome {
                bail!("{} failed: {}", process, cause);
            }
        }
    }

    Ok(())
}
