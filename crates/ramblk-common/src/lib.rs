//! Ramblk Common - Shared types and configuration
//!
//! This crate provides the unit-tagged sector types, device geometry, and
//! configuration structures used across all Ramblk components.

pub mod config;
pub mod types;

pub use config::{ConfigError, EngineConfig};
pub use types::{DeviceId, Geometry, GeometryError, HOST_SECTOR_SIZE, HostSectors};
