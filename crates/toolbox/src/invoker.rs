//! Process invocation: validate, run, publish, report.
//!
//! A run reports 100 progress units: 10 for setup, 60 for the process
//! itself (through a capped [`SubProgress`]), 30 split across the outputs.
//! Cancellation is checked when the process is entered, when it returns and
//! before each output is published; never while an output is being
//! published.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::classifier::{Classified, ResultClassifier};
use crate::config::ToolboxSettings;
use crate::error::{Result, ToolboxError};
use crate::export::{Exporter, FileExporter};
use crate::progress::{ProgressSink, SubProgress};
use crate::publish::{PublishContext, Publication};
use crate::registry::{Process, ProcessRegistry};
use crate::report::{HtmlReportRenderer, ReportRenderer};
use crate::request::ProcessRequest;
use crate::result::ExecutionOutcome;
use crate::workspace::{MapContext, WorkspaceAttach};

pub const TOTAL_UNITS: u32 = 100;
pub const SETUP_UNITS: u32 = 10;
pub const ALGORITHM_UNITS: u32 = 60;
pub const PUBLISH_UNITS: u32 = 30;

/// How chatty step logging is. Errors are logged at every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Step messages go to `debug`
    Quiet,
    #[default]
    Normal,
    /// Also log every output as it is published
    Verbose,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub verbosity: Verbosity,
}

impl RunOptions {
    pub fn with_verbosity(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Success { published: Vec<Publication> },
    Cancelled,
    Failed { cause: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn published(&self) -> &[Publication] {
        match self {
            Self::Success { published } => published,
            _ => &[],
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { published } => write!(f, "completed, {} output(s) published", published.len()),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Failed { cause } => write!(f, "failed: {}", cause),
        }
    }
}

/// Outcome plus the concatenated report fragments, in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub report: String,
}

impl RunReport {
    fn failed(cause: impl Into<String>) -> Self {
        Self {
            outcome: RunOutcome::Failed { cause: cause.into() },
            report: String::new(),
        }
    }

    fn cancelled(report: String) -> Self {
        Self {
            outcome: RunOutcome::Cancelled,
            report,
        }
    }
}

/// Runs process requests against a fixed set of collaborators.
pub struct ProcessInvoker {
    registry: Arc<dyn ProcessRegistry>,
    exporter: Arc<dyn Exporter>,
    workspace: Arc<dyn WorkspaceAttach>,
    map: Arc<dyn MapContext>,
    renderer: Arc<dyn ReportRenderer>,
    settings: ToolboxSettings,
}

impl ProcessInvoker {
    /// Invoker writing files with [`FileExporter`] and rendering HTML reports.
    pub fn new(
        registry: Arc<dyn ProcessRegistry>,
        workspace: Arc<dyn WorkspaceAttach>,
        map: Arc<dyn MapContext>,
    ) -> Self {
        Self {
            registry,
            exporter: Arc::new(FileExporter::new()),
            workspace,
            map,
            renderer: Arc::new(HtmlReportRenderer),
            settings: ToolboxSettings::default(),
        }
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ReportRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_settings(mut self, settings: ToolboxSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ToolboxSettings {
        &self.settings
    }

    /// Resolve the process and check the request's bindings against its
    /// declarations.
    pub fn validate(&self, request: &ProcessRequest) -> Result<Arc<dyn Process>> {
        let process = self
            .registry
            .resolve(request.process_id())
            .ok_or_else(|| ToolboxError::UnknownProcess(request.process_id().to_string()))?;

        for def in process.inputs() {
            match request.input(def.name) {
                None if def.required => {
                    return Err(ToolboxError::input_binding(def.name, "required input is missing"));
                }
                Some(value) if !def.kind.accepts(value) => {
                    return Err(ToolboxError::input_binding(
                        def.name,
                        format!("expected {:?}, got {}", def.kind, value.kind_name()),
                    ));
                }
                _ => {}
            }
        }

        for def in process.outputs() {
            let has_path = request.output(def.name).and_then(|d| d.path()).is_some();
            if def.kind.needs_destination() && !has_path {
                return Err(ToolboxError::input_binding(def.name, "output has no destination path"));
            }
        }

        if let Some((name, _)) = request.outputs().iter().find(|(_, d)| d.is_empty()) {
            return Err(ToolboxError::input_binding(name.as_str(), "output destination is empty"));
        }

        Ok(process)
    }

    pub fn execute(
        &self,
        request: &ProcessRequest,
        progress: &dyn ProgressSink,
        options: &RunOptions,
    ) -> RunReport {
        self.execute_with(request, progress, options, |_| {})
    }

    /// Execute and notify `on_finished` exactly once with the final report.
    pub fn execute_with<F>(
        &self,
        request: &ProcessRequest,
        progress: &dyn ProgressSink,
        options: &RunOptions,
        on_finished: F,
    ) -> RunReport
    where
        F: FnOnce(&RunReport),
    {
        let report = catch_unwind(AssertUnwindSafe(|| self.run(request, progress, options)))
            .unwrap_or_else(|payload| {
                let cause = panic_message(payload.as_ref());
                error!(process = request.process_id(), "run aborted: {}", cause);
                RunReport::failed(cause)
            });
        on_finished(&report);
        report
    }

    fn run(&self, request: &ProcessRequest, progress: &dyn ProgressSink, options: &RunOptions) -> RunReport {
        let process = match self.validate(request) {
            Ok(process) => process,
            Err(e) => {
                error!(process = request.process_id(), "{}", e);
                return RunReport::failed(e.to_string());
            }
        };

        let title = process.title().to_string();
        let executing = format!("Executing {}", title);
        step(options.verbosity, &executing);
        progress.set_task(&executing);
        progress.advance(SETUP_UNITS);

        let report = self.run_process(process.as_ref(), &title, request, progress, options);
        step(options.verbosity, &format!("{} completed", title));
        report
    }

    fn run_process(
        &self,
        process: &dyn Process,
        title: &str,
        request: &ProcessRequest,
        progress: &dyn ProgressSink,
        options: &RunOptions,
    ) -> RunReport {
        if progress.is_cancelled() {
            info!("{} cancelled before start", title);
            return RunReport::cancelled(String::new());
        }

        let sub = SubProgress::new(progress, ALGORITHM_UNITS);
        let outcome = catch_unwind(AssertUnwindSafe(|| process.execute(request.inputs(), &sub)));
        sub.finish();

        let results = match outcome {
            Ok(ExecutionOutcome::Success(results)) => results,
            Ok(ExecutionOutcome::Cancelled) => {
                info!("{} cancelled", title);
                return RunReport::cancelled(String::new());
            }
            Ok(ExecutionOutcome::Failed(cause)) => return algorithm_failed(title, cause),
            Err(payload) => return algorithm_failed(title, panic_message(payload.as_ref())),
        };

        if progress.is_cancelled() {
            info!("{} cancelled, {} output(s) discarded", title, results.len());
            return RunReport::cancelled(String::new());
        }

        let ctx = PublishContext {
            exporter: self.exporter.as_ref(),
            workspace: self.workspace.as_ref(),
            map: self.map.as_ref(),
            settings: &self.settings,
            progress,
        };
        let classifier = ResultClassifier::new(ctx, self.renderer.as_ref(), title, request.inputs());

        let share = match results.len() {
            0 => 0,
            n => PUBLISH_UNITS / n as u32,
        };
        let mut used = SETUP_UNITS + ALGORITHM_UNITS;
        let mut report = String::new();
        let mut published = Vec::new();
        let mut rendered = 0usize;
        let mut failures = Vec::new();

        for (name, value) in results {
            if progress.is_cancelled() {
                info!("{} cancelled before publishing '{}'", title, name);
                return RunReport::cancelled(report);
            }
            if options.verbosity == Verbosity::Verbose {
                info!(output = %name, kind = value.kind(), "publishing output");
            } else {
                debug!(output = %name, kind = value.kind(), "publishing output");
            }

            let meta = process.output_metadata(&name);
            let classified = catch_unwind(AssertUnwindSafe(|| {
                classifier.classify(&name, value, &meta, request.output(&name))
            }))
            .unwrap_or_else(|payload| Err(ToolboxError::publish(&name, panic_message(payload.as_ref()))));

            match classified {
                Ok(Classified::Published(publication)) => published.push(publication),
                Ok(Classified::Reported(fragment)) => {
                    report.push_str(&fragment);
                    rendered += 1;
                }
                Err(e) => {
                    error!("{}", e);
                    failures.push(e);
                }
            }
            progress.advance(share);
            used += share;
        }
        progress.advance(TOTAL_UNITS.saturating_sub(used));

        match failures.into_iter().next() {
            Some(first) if published.is_empty() && rendered == 0 => RunReport {
                outcome: RunOutcome::Failed {
                    cause: first.to_string(),
                },
                report,
            },
            _ => RunReport {
                outcome: RunOutcome::Success { published },
                report,
            },
        }
    }
}

fn step(verbosity: Verbosity, message: &str) {
    match verbosity {
        Verbosity::Quiet => debug!("{}", message),
        Verbosity::Normal | Verbosity::Verbose => info!("{}", message),
    }
}

fn algorithm_failed(title: &str, cause: String) -> RunReport {
    let err = ToolboxError::AlgorithmExecution {
        process: title.to_string(),
        message: cause,
    };
    error!("{}", err);
    RunReport::failed(err.to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
