//! Process requests: input bindings and output destinations.

use std::fmt;
use std::path::{Path, PathBuf};

use geo_types::Geometry;
use geotoolbox_core::{Coverage, FeatureCollection};
use indexmap::IndexMap;

/// Input bindings of a request, in declaration order
pub type Inputs = IndexMap<String, ParamValue>;

/// Value bound to a process input.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Integer(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Features(FeatureCollection),
    Coverage(Coverage),
    Geometry(Geometry<f64>),
    /// Name of a layer already loaded in the workspace
    Layer(String),
}

impl ParamValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Bool(_) => "boolean",
            Self::Text(_) => "text",
            Self::Features(_) => "features",
            Self::Coverage(_) => "coverage",
            Self::Geometry(_) => "geometry",
            Self::Layer(_) => "layer",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Layer(s) => Some(s),
            _ => None,
        }
    }
}

/// String form of a bound value; used when an input names a field
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Real(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Text(s) | Self::Layer(s) => f.write_str(s),
            Self::Features(fc) => f.write_str(fc.schema().name()),
            Self::Coverage(c) => f.write_str(c.name()),
            Self::Geometry(g) => write!(f, "{:?}", g),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<FeatureCollection> for ParamValue {
    fn from(v: FeatureCollection) -> Self {
        Self::Features(v)
    }
}

impl From<Coverage> for ParamValue {
    fn from(v: Coverage) -> Self {
        Self::Coverage(v)
    }
}

/// Where an output goes: a file path and/or the name shown in the workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputDestination {
    path: Option<PathBuf>,
    display_name: Option<String>,
}

impl OutputDestination {
    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.display_name.is_none()
    }

    /// Explicit display name, else the file stem of the path
    pub fn display_name(&self) -> Option<String> {
        self.display_name.clone().or_else(|| {
            self.path
                .as_ref()
                .and_then(|p| p.file_stem())
                .map(|s| s.to_string_lossy().into_owned())
        })
    }
}

/// A request to run one process.
///
/// Built up front and borrowed immutably for the whole run.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    process_id: String,
    inputs: Inputs,
    outputs: IndexMap<String, OutputDestination>,
}

impl ProcessRequest {
    pub fn new(process_id: impl Into<String>) -> Self {
        Self {
            process_id: process_id.into(),
            inputs: Inputs::new(),
            outputs: IndexMap::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, destination: OutputDestination) -> Self {
        self.outputs.insert(name.into(), destination);
        self
    }

    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&ParamValue> {
        self.inputs.get(name)
    }

    pub fn outputs(&self) -> &IndexMap<String, OutputDestination> {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&OutputDestination> {
        self.outputs.get(name)
    }
}
