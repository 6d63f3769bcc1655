//! Shadershot engine crate.
//!
//! Owns the headless GPU runtime: device acquisition with fallback, shader
//! compilation, the single-frame draw, and capture export.

pub mod device;
pub mod error;
pub mod export;
pub mod geometry;
pub mod pipeline;
pub mod shader;
pub mod target;
pub mod uniforms;

pub mod logging;

pub use error::{Error, Result};
