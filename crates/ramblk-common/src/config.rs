//! Configuration types for Ramblk
//!
//! The engine takes no implicit global parameters: an [`EngineConfig`] is
//! constructed once at startup (from whatever front end the embedder uses)
//! and passed into registry initialization.

use crate::types::{Geometry, GeometryError};
use serde::{Deserialize, Serialize};

/// Engine configuration, fixed at registry initialization time
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of independent devices to create
    pub device_count: u32,
    /// Sectors per device
    pub sectors_per_device: u64,
    /// Device sector size in bytes
    pub sector_size: u32,
    /// Prefix for published device names ("ramblk" yields ramblk0, ramblk1, ...)
    pub device_name_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device_count: 4,
            sectors_per_device: 1024,
            sector_size: 512,
            device_name_prefix: "ramblk".to_string(),
        }
    }
}

impl EngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_count == 0 {
            return Err(ConfigError::NoDevices);
        }
        if self.device_name_prefix.is_empty() {
            return Err(ConfigError::EmptyNamePrefix);
        }
        self.geometry()?;
        Ok(())
    }

    /// The per-device geometry this configuration describes
    pub fn geometry(&self) -> Result<Geometry, GeometryError> {
        Geometry::new(self.sectors_per_device, self.sector_size)
    }

    /// Published name for the device at the given registry slot
    #[must_use]
    pub fn device_name(&self, index: u32) -> String {
        format!("{}{}", self.device_name_prefix, index)
    }
}

/// Errors that can occur when validating an engine configuration
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("device count must be at least 1")]
    NoDevices,
    #[error("device name prefix must not be empty")]
    EmptyNamePrefix,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
