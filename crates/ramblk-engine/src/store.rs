//! In-memory backing store
//!
//! One contiguous byte buffer per device, sized at creation and never
//! resized. Both primitives validate the whole span before touching the
//! buffer, so a rejected write leaves the store unmodified.

use crate::capacity;
use crate::error::{EngineError, EngineResult};
use bytes::Bytes;
use ramblk_common::types::Geometry;

/// Fixed-size in-memory buffer standing in for persistent media
pub struct BackingStore {
    buf: Vec<u8>,
}

impl BackingStore {
    /// Allocate a zero-filled store for the given geometry
    ///
    /// Uses fallible allocation so an out-of-memory condition surfaces as
    /// [`EngineError::Allocation`] and the registry can roll back instead of
    /// aborting the process.
    pub fn allocate(geometry: Geometry) -> EngineResult<Self> {
        let size = geometry.total_bytes();
        let len = usize::try_from(size).map_err(|_| EngineError::Allocation {
            requested_bytes: size,
        })?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| EngineError::Allocation {
                requested_bytes: size,
            })?;
        buf.resize(len, 0);
        Ok(Self { buf })
    }

    /// Store size in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Read `length` bytes starting at `offset`
    ///
    /// Fails with [`EngineError::OutOfBounds`] when the span exceeds the
    /// store size.
    pub fn read(&self, offset: u64, length: usize) -> EngineResult<Bytes> {
        capacity::validate_span(offset, length as u64, self.size())?;
        let start = offset as usize;
        Ok(Bytes::copy_from_slice(&self.buf[start..start + length]))
    }

    /// Write `data` starting at `offset`
    ///
    /// Fails with [`EngineError::OutOfBounds`] when the span exceeds the
    /// store size; a rejected write performs no partial copy.
    pub fn write(&mut self, offset: u64, data: &[u8]) -> EngineResult<()> {
        capacity::validate_span(offset, data.len() as u64, self.size())?;
        let start = offset as usize;
        self.buf[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}
