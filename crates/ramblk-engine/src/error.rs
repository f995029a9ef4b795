//! Engine error types
//!
//! Initialization errors unwind through the registry's public entry points
//! with rollback at each failure site; per-request errors never unwind past
//! the dispatch boundary and are converted to completion statuses instead.

use ramblk_common::config::ConfigError;
use ramblk_common::types::{DeviceId, GeometryError};
use thiserror::Error;

/// Engine error
#[derive(Error, Debug)]
pub enum EngineError {
    /// No storage identity token could be obtained from the host
    #[error("no storage identity available for '{name}'")]
    IdentityUnavailable { name: String },

    /// A backing store or device table allocation failed
    #[error("allocation of {requested_bytes} bytes failed")]
    Allocation { requested_bytes: u64 },

    /// The host refused the queue registration for one device
    #[error("queue registration failed for device {device}: {reason}")]
    QueueRegistration { device: DeviceId, reason: String },

    /// A transfer span exceeds the device capacity
    #[error("offset {offset} + length {length} exceeds device size {size}")]
    OutOfBounds { offset: u64, length: u64, size: u64 },

    /// A request referenced a device identity not present in the registry
    #[error("unknown target device {device}")]
    UnknownTarget { device: DeviceId },

    /// The device slot is already occupied
    #[error("device {device} already exists")]
    Busy { device: DeviceId },

    /// Configuration failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Device geometry failed validation
    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
