//! Process execution in background threads.
//!
//! Each run gets its own `std::thread` and streams [`RunEvent`]s back via
//! `crossbeam_channel`. Exactly one [`RunEvent::Finished`] is sent per run.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Instant, SystemTime};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::invoker::{ProcessInvoker, RunOptions, RunOutcome, RunReport, TOTAL_UNITS};
use crate::progress::{CancellationToken, ProgressSink};
use crate::request::ProcessRequest;

/// Log level for streamed messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

/// A log line streamed from a background run.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: SystemTime,
}

impl LogEntry {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::at(LogLevel::Info, msg)
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::at(LogLevel::Warning, msg)
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::at(LogLevel::Error, msg)
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self::at(LogLevel::Success, msg)
    }

    fn at(level: LogLevel, msg: impl Into<String>) -> Self {
        Self {
            level,
            message: msg.into(),
            timestamp: SystemTime::now(),
        }
    }
}

/// Messages sent from a background run.
#[derive(Debug, Clone)]
pub enum RunEvent {
    Progress { worked: u32, total: u32 },
    Log(LogEntry),
    Finished(RunReport),
}

struct ChannelProgress {
    tx: Sender<RunEvent>,
    token: CancellationToken,
    worked: AtomicU32,
}

impl ProgressSink for ChannelProgress {
    fn advance(&self, units: u32) {
        let worked = self.worked.fetch_add(units, Ordering::SeqCst) + units;
        let _ = self.tx.send(RunEvent::Progress {
            worked,
            total: TOTAL_UNITS,
        });
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn set_task(&self, name: &str) {
        let _ = self.tx.send(RunEvent::Log(LogEntry::info(name)));
    }
}

/// Handle to a background run.
pub struct RunHandle {
    token: CancellationToken,
    thread: JoinHandle<()>,
}

impl RunHandle {
    /// Request cooperative cancellation
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the run thread to exit
    pub fn join(self) -> std::thread::Result<()> {
        self.thread.join()
    }
}

/// Run `request` on a background thread, sending events to `tx`.
pub fn spawn_run(
    invoker: Arc<ProcessInvoker>,
    request: ProcessRequest,
    options: RunOptions,
    tx: Sender<RunEvent>,
) -> RunHandle {
    let token = CancellationToken::new();
    let sink = ChannelProgress {
        tx: tx.clone(),
        token: token.clone(),
        worked: AtomicU32::new(0),
    };

    let thread = std::thread::spawn(move || {
        let _ = tx.send(RunEvent::Log(LogEntry::info(format!(
            "Running {}...",
            request.process_id()
        ))));
        let start = Instant::now();

        let report = invoker.execute_with(&request, &sink, &options, |report| {
            let entry = match &report.outcome {
                RunOutcome::Success { .. } => LogEntry::success(format!(
                    "{} completed in {:.2}s",
                    request.process_id(),
                    start.elapsed().as_secs_f64()
                )),
                RunOutcome::Cancelled => LogEntry::warning(format!("{} cancelled", request.process_id())),
                RunOutcome::Failed { cause } => {
                    LogEntry::error(format!("{}: {}", request.process_id(), cause))
                }
            };
            let _ = tx.send(RunEvent::Log(entry));
        });
        let _ = tx.send(RunEvent::Finished(report));
    });

    RunHandle { token, thread }
}

impl ProcessInvoker {
    /// Run on a background thread with a fresh unbounded event channel.
    pub fn spawn(self: &Arc<Self>, request: ProcessRequest, options: RunOptions) -> (RunHandle, Receiver<RunEvent>) {
        let (tx, rx) = unbounded();
        (spawn_run(Arc::clone(self), request, options, tx), rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FnProcess, InMemoryRegistry};
    use crate::result::{ExecutionOutcome, ResultMap, ResultValue};
    use crate::workspace::LayerCatalog;
    use geotoolbox_core::CRS;
    use std::time::Duration;

    fn invoker(process: FnProcess) -> Arc<ProcessInvoker> {
        Arc::new(ProcessInvoker::new(
            Arc::new(InMemoryRegistry::new().with("p", process)),
            Arc::new(LayerCatalog::new()),
            Arc::new(CRS::wgs84()),
        ))
    }

    fn drain(rx: &Receiver<RunEvent>) -> Vec<RunEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.recv_timeout(Duration::from_secs(10)) {
            let done = matches!(event, RunEvent::Finished(_));
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    #[test]
    fn background_run_streams_progress_and_finishes_once() {
        let inv = invoker(FnProcess::new("Count", |_, _| {
            let mut results = ResultMap::new();
            results.insert("n".to_string(), ResultValue::Scalar(3.0));
            ExecutionOutcome::Success(results)
        }));
        let (handle, rx) = inv.spawn(ProcessRequest::new("p"), RunOptions::default());
        let events = drain(&rx);
        handle.join().unwrap();

        let finished: Vec<&RunReport> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Finished(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(finished.len(), 1);
        assert!(finished[0].outcome.is_success());

        let last_progress = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Progress { worked, .. } => Some(*worked),
                _ => None,
            })
            .last();
        assert_eq!(last_progress, Some(TOTAL_UNITS));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cancel_is_observed_by_the_process() {
        let (started_tx, started_rx) = crossbeam_channel::bounded::<()>(1);
        let inv = invoker(FnProcess::new("Wait", move |_, progress| {
            let _ = started_tx.send(());
            while !progress.is_cancelled() {
                std::thread::sleep(Duration::from_millis(5));
            }
            ExecutionOutcome::Cancelled
        }));
        let (handle, rx) = inv.spawn(ProcessRequest::new("p"), RunOptions::default());
        started_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        handle.cancel();

        let events = drain(&rx);
        match events.last() {
            Some(RunEvent::Finished(report)) => assert!(report.outcome.is_cancelled()),
            other => panic!("expected Finished, got {:?}", other),
        }
        handle.join().unwrap();
    }
}
