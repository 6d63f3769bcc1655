//! GPU device acquisition.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - walking the driver-tier fallback list and negotiating a feature tier
//! - probing optional extended capabilities (best-effort, never fatal)

mod gpu;
mod info;

pub use gpu::{acquire, AcquireOptions, DriverTier, ExtendedCaps, FeatureTier, Gpu};
pub use info::AdapterReport;
