//! Error types for the fallible surfaces of the core
//!
//! Data-path failures (empty or degenerate series) are not errors: they are
//! reported as `None` by the analysis functions. This enum covers region
//! definitions, camera plumbing, configuration and output.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RheedError {
    #[error("Region '{0}' encloses no pixels")]
    EmptyRegion(String),

    #[error("Invalid geometry for region '{region}': {reason}")]
    InvalidGeometry { region: String, reason: String },

    #[error("Unknown region '{0}'")]
    UnknownRegion(String),

    #[error("Region '{0}' already exists")]
    DuplicateRegion(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Unknown camera kind '{0}'")]
    UnknownCameraKind(String),

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Unknown camera property '{0}'")]
    UnknownProperty(String),

    #[error("Camera property '{0}' is read-only")]
    ReadOnlyProperty(String),

    #[error("Camera property '{name}' expects a {expected} value")]
    PropertyKind { name: String, expected: &'static str },

    #[error("Camera property '{name}' = {value} is outside [{min}, {max}]")]
    PropertyRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Processor is already running")]
    AlreadyRunning,

    #[error("Failed to write frame record: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RheedError>;
