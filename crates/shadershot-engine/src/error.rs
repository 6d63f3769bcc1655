//! Error taxonomy for the single-shot render pipeline.
//!
//! Every variant here is fatal to the invocation: the tool has no retry or
//! partial-success path, so callers report the error and exit non-zero.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// No driver tier in the candidate list produced a usable device.
    #[error("no usable rendering device: {0}")]
    DeviceCreationFailed(String),

    /// Shader front-end rejected the source. The diagnostic has already been
    /// written verbatim to stderr by the compiler; it is carried here for
    /// programmatic callers.
    #[error("shader compilation failed (profile {profile}, entry point `{entry_point}`)")]
    ShaderCompilationFailed {
        profile: String,
        entry_point: String,
        diagnostic: String,
    },

    /// A pipeline binding step rejected its inputs (for example a vertex
    /// layout that does not match the shader's input signature).
    #[error("pipeline bind failed at {stage}: {detail}")]
    PipelineBindFailed { stage: &'static str, detail: String },

    /// Readback, encoding, or writing of the output image failed.
    #[error("failed to export image to {}: {reason}", path.display())]
    ExportFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
