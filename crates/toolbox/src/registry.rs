//! Process registry with declarative parameter definitions.
//!
//! Each process describes its title, its inputs and its outputs. The invoker
//! validates a request against these before anything runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::progress::ProgressSink;
use crate::request::{Inputs, ParamValue};
use crate::result::{ExecutionOutcome, OutputMetadata};

/// The kind of value an input accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Number,
    Bool,
    Text,
    Features,
    Coverage,
    Geometry,
    /// Reference to a loaded workspace layer
    Layer,
    Any,
}

impl ParamKind {
    pub fn accepts(self, value: &ParamValue) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (Self::Number, ParamValue::Integer(_) | ParamValue::Real(_)) => true,
            (Self::Bool, ParamValue::Bool(_)) => true,
            (Self::Text, ParamValue::Text(_)) => true,
            (Self::Features, ParamValue::Features(_) | ParamValue::Layer(_)) => true,
            (Self::Coverage, ParamValue::Coverage(_) | ParamValue::Layer(_)) => true,
            (Self::Geometry, ParamValue::Geometry(_)) => true,
            (Self::Layer, ParamValue::Layer(_)) => true,
            _ => false,
        }
    }
}

/// Definition of a single process input.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamDef {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// What a declared output produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Vector,
    Raster,
    /// Rendered into the run report; needs no destination
    Report,
}

impl OutputKind {
    pub fn needs_destination(self) -> bool {
        matches!(self, Self::Vector | Self::Raster)
    }
}

/// Definition of a single process output.
#[derive(Debug, Clone)]
pub struct OutputDef {
    pub name: &'static str,
    pub kind: OutputKind,
}

impl OutputDef {
    pub const fn new(name: &'static str, kind: OutputKind) -> Self {
        Self { name, kind }
    }
}

/// A runnable geoprocessing process.
pub trait Process: Send + Sync {
    fn title(&self) -> &str;

    fn inputs(&self) -> Vec<ParamDef> {
        Vec::new()
    }

    fn outputs(&self) -> Vec<OutputDef> {
        Vec::new()
    }

    /// Tags declared for an output, `styles` among them
    fn output_metadata(&self, _output: &str) -> OutputMetadata {
        OutputMetadata::default()
    }

    fn execute(&self, inputs: &Inputs, progress: &dyn ProgressSink) -> ExecutionOutcome;
}

/// Resolves process identifiers to runnable processes.
pub trait ProcessRegistry: Send + Sync {
    fn resolve(&self, id: &str) -> Option<Arc<dyn Process>>;
}

/// Registry backed by a map, filled at startup.
#[derive(Default)]
pub struct InMemoryRegistry {
    processes: HashMap<String, Arc<dyn Process>>,
    /// Registration order
    order: Vec<String>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a process; an existing entry with the same id is replaced.
    pub fn register(&mut self, id: impl Into<String>, process: impl Process + 'static) {
        let id = id.into();
        if !self.processes.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.processes.insert(id, Arc::new(process));
    }

    pub fn with(mut self, id: impl Into<String>, process: impl Process + 'static) -> Self {
        self.register(id, process);
        self
    }

    /// Ids and titles in registration order
    pub fn entries(&self) -> Vec<(String, String)> {
        self.order
            .iter()
            .filter_map(|id| {
                self.processes
                    .get(id)
                    .map(|p| (id.clone(), p.title().to_string()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

impl ProcessRegistry for InMemoryRegistry {
    fn resolve(&self, id: &str) -> Option<Arc<dyn Process>> {
        self.processes.get(id).cloned()
    }
}

type ProcessFn = dyn Fn(&Inputs, &dyn ProgressSink) -> ExecutionOutcome + Send + Sync;

/// A process defined by a closure plus its declarations.
pub struct FnProcess {
    title: String,
    inputs: Vec<ParamDef>,
    outputs: Vec<OutputDef>,
    metadata: HashMap<String, OutputMetadata>,
    run: Box<ProcessFn>,
}

impl FnProcess {
    pub fn new<F>(title: impl Into<String>, run: F) -> Self
    where
        F: Fn(&Inputs, &dyn ProgressSink) -> ExecutionOutcome + Send + Sync + 'static,
    {
        Self {
            title: title.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            metadata: HashMap::new(),
            run: Box::new(run),
        }
    }

    pub fn with_input(mut self, def: ParamDef) -> Self {
        self.inputs.push(def);
        self
    }

    pub fn with_output(mut self, def: OutputDef) -> Self {
        self.outputs.push(def);
        self
    }

    pub fn with_metadata(mut self, output: impl Into<String>, metadata: OutputMetadata) -> Self {
        self.metadata.insert(output.into(), metadata);
        self
    }
}

impl fmt::Debug for FnProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProcess")
            .field("title", &self.title)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

impl Process for FnProcess {
    fn title(&self) -> &str {
        &self.title
    }

    fn inputs(&self) -> Vec<ParamDef> {
        self.inputs.clone()
    }

    fn outputs(&self) -> Vec<OutputDef> {
        self.outputs.clone()
    }

    fn output_metadata(&self, output: &str) -> OutputMetadata {
        self.metadata.get(output).cloned().unwrap_or_default()
    }

    fn execute(&self, inputs: &Inputs, progress: &dyn ProgressSink) -> ExecutionOutcome {
        (self.run)(inputs, progress)
    }
}
