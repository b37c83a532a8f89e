//! # GeoToolbox
//!
//! Runs registered geoprocessing processes and publishes whatever they return.
//!
//! A run flows one way:
//!
//! ```text
//! ProcessInvoker -> ResultClassifier -> {vector | raster} publisher -> style engine -> workspace
//!                                    \-> report renderer
//! ```
//!
//! - [`invoker`]: resolves a process, runs it under a cancellable progress
//!   budget and aggregates the report
//! - [`classifier`]: routes each named output to a publisher or the report
//! - [`publish`]: exports vector/raster outputs and attaches them with a style
//! - [`style`]: pure style inference from output metadata tags
//! - [`executor`]: background runs streaming [`executor::RunEvent`]s
//!
//! Collaborators the pipeline only talks to through traits live in
//! [`registry`], [`export`], [`workspace`] and [`report`].

pub mod classifier;
pub mod config;
pub mod error;
pub mod executor;
pub mod export;
pub mod invoker;
pub mod progress;
pub mod publish;
pub mod registry;
pub mod report;
pub mod request;
pub mod result;
pub mod style;
pub mod workspace;

pub use config::ToolboxSettings;
pub use error::{Result, ToolboxError};
pub use executor::{spawn_run, RunEvent, RunHandle};
pub use invoker::{ProcessInvoker, RunOptions, RunOutcome, RunReport, Verbosity};
pub use progress::{CancellationToken, ProgressSink};
pub use request::{Inputs, OutputDestination, ParamValue, ProcessRequest};
pub use result::{
    BoundingBox, ExecutionOutcome, GeometryValue, OutputMetadata, ResultMap, ResultValue,
    Statistic,
};
pub use style::{resolve_style, ClassificationFunction, StyleRule, SymbolKind};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::export::{Exporter, FileExporter};
    pub use crate::invoker::{ProcessInvoker, RunOptions, RunOutcome, RunReport, Verbosity};
    pub use crate::progress::{CancellationToken, NullProgress, ProgressSink};
    pub use crate::registry::{FnProcess, InMemoryRegistry, Process, ProcessRegistry};
    pub use crate::request::{OutputDestination, ParamValue, ProcessRequest};
    pub use crate::result::{ExecutionOutcome, OutputMetadata, ResultMap, ResultValue};
    pub use crate::workspace::{LayerCatalog, MapContext, WorkspaceAttach};
    pub use geotoolbox_core::prelude::*;
}
