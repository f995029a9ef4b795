//! Core type definitions for Ramblk
//!
//! The block layer speaks two distinct units and mixing them up is the
//! classic bug in drivers of this kind, so both are named types here:
//!
//! - **Host sectors** ([`HostSectors`]): the fixed 512-byte granularity the
//!   host uses for request offsets and published capacities, regardless of
//!   how a device is configured.
//! - **Device bytes** (`u64`): raw byte offsets into a device's backing
//!   store, derived from host sectors only through the named conversions
//!   below.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The host's fixed minimal addressing granularity in bytes.
///
/// Request offsets and published capacities are always expressed in units
/// of this size, independent of a device's configured sector size.
pub const HOST_SECTOR_SIZE: u64 = 512;

/// A count or index expressed in host sector units (512-byte sectors)
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[display("{_0}")]
pub struct HostSectors(u64);

impl HostSectors {
    /// Create a sector count/index from a raw number of host sectors
    #[must_use]
    pub const fn new(sectors: u64) -> Self {
        Self(sectors)
    }

    /// Get the raw sector count
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Convert to a byte offset, or `None` if the multiplication overflows
    #[must_use]
    pub const fn checked_byte_offset(self) -> Option<u64> {
        self.0.checked_mul(HOST_SECTOR_SIZE)
    }
}

impl fmt::Debug for HostSectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostSectors({})", self.0)
    }
}

/// Stable index identity of a device within one registry
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[display("{_0}")]
pub struct DeviceId(u32);

impl DeviceId {
    /// Create a device ID from a registry slot index
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the registry slot index
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

/// Errors that can occur when constructing a device geometry
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeometryError {
    #[error("device must have at least one sector")]
    ZeroSectors,
    #[error("sector size {0} is not a positive multiple of the host sector size ({HOST_SECTOR_SIZE} bytes)")]
    UnalignedSectorSize(u32),
    #[error("device capacity overflows a 64-bit byte count")]
    CapacityOverflow,
}

/// Validated shape of one device: sector count and sector size
///
/// A geometry can only be constructed through [`Geometry::new`], so holders
/// may rely on `sectors × sector_size` fitting in a `u64` and on the sector
/// size being a positive multiple of [`HOST_SECTOR_SIZE`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Geometry {
    sectors: u64,
    sector_size: u32,
}

impl Geometry {
    /// Create a geometry, validating the sector count and sector size
    pub fn new(sectors: u64, sector_size: u32) -> Result<Self, GeometryError> {
        if sectors == 0 {
            return Err(GeometryError::ZeroSectors);
        }
        if sector_size == 0 || u64::from(sector_size) % HOST_SECTOR_SIZE != 0 {
            return Err(GeometryError::UnalignedSectorSize(sector_size));
        }
        if sectors.checked_mul(u64::from(sector_size)).is_none() {
            return Err(GeometryError::CapacityOverflow);
        }
        Ok(Self {
            sectors,
            sector_size,
        })
    }

    /// Number of device sectors
    #[must_use]
    pub const fn sectors(self) -> u64 {
        self.sectors
    }

    /// Configured sector size in bytes
    #[must_use]
    pub const fn sector_size(self) -> u32 {
        self.sector_size
    }

    /// Total capacity in bytes (`sectors × sector_size`)
    #[must_use]
    pub const fn total_bytes(self) -> u64 {
        self.sectors * self.sector_size as u64
    }

    /// Capacity in host sector units, as published to the host namespace
    ///
    /// A device configured with 1024 × 512 B sectors reports 1024 host
    /// sectors; the same sector count at 4096 B reports 8192.
    #[must_use]
    pub const fn host_sectors(self) -> HostSectors {
        HostSectors::new(self.total_bytes() / HOST_SECTOR_SIZE)
    }
}
