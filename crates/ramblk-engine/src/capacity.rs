//! Capacity arithmetic and bounds checking
//!
//! Pure functions over a device [`Geometry`]. Request offsets arrive in host
//! sector units and all transfer math runs in raw device bytes; the
//! conversions live here and in `ramblk_common::types` so the two units are
//! never mixed implicitly. All arithmetic is overflow-checked: an overflowing
//! span is out of range, never a wrap-around.

use crate::error::{EngineError, EngineResult};
use ramblk_common::types::{Geometry, HostSectors};

/// Total device capacity in bytes
#[must_use]
pub fn total_bytes(geometry: Geometry) -> u64 {
    geometry.total_bytes()
}

/// Check a byte span against a device size
///
/// Fails with [`EngineError::OutOfBounds`] when `offset + length` exceeds
/// `size` or overflows. Succeeds for zero-length spans at any in-range
/// offset.
pub fn validate_span(offset: u64, length: u64, size: u64) -> EngineResult<()> {
    match offset.checked_add(length) {
        Some(end) if end <= size => Ok(()),
        _ => Err(EngineError::OutOfBounds {
            offset,
            length,
            size,
        }),
    }
}

/// Check a transfer expressed in host sector units against a device geometry
///
/// `start` is a host sector index; `length_bytes` is the raw transfer
/// length. Fails when the span extends past `geometry.total_bytes()`.
pub fn validate_range(geometry: Geometry, start: HostSectors, length_bytes: u64) -> EngineResult<()> {
    let size = geometry.total_bytes();
    let Some(offset) = start.checked_byte_offset() else {
        return Err(EngineError::OutOfBounds {
            offset: u64::MAX,
            length: length_bytes,
            size,
        });
    };
    validate_span(offset, length_bytes, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry::new(1024, 512).unwrap()
    }

    #[test]
    fn test_total_bytes() {
        assert_eq!(total_bytes(geometry()), 524_288);
    }

    #[test]
    fn test_validate_span_exact_fit() {
        assert!(validate_span(0, 524_288, 524_288).is_ok());
        assert!(validate_span(524_288, 0, 524_288).is_ok());
    }

    #[test]
    fn test_validate_span_one_past_end() {
        let err = validate_span(524_288, 1, 524_288).unwrap_err();
        assert!(matches!(err, EngineError::OutOfBounds { .. }));

        assert!(validate_span(0, 524_289, 524_288).is_err());
    }

    #[test]
    fn test_validate_span_overflow_is_out_of_range() {
        assert!(validate_span(u64::MAX, 2, 524_288).is_err());
    }

    #[test]
    fn test_validate_range_in_host_sectors() {
        // Last host sector of a 1024-sector 512 B device
        assert!(validate_range(geometry(), HostSectors::new(1023), 512).is_ok());
        // One host sector past the end
        assert!(validate_range(geometry(), HostSectors::new(1024), 512).is_err());
    }

    #[test]
    fn test_validate_range_scaled_sector_size() {
        // 1024 × 4096 B sectors = 8192 host sectors
        let geometry = Geometry::new(1024, 4096).unwrap();
        assert!(validate_range(geometry, HostSectors::new(8191), 512).is_ok());
        assert!(validate_range(geometry, HostSectors::new(8192), 512).is_err());
    }

    #[test]
    fn test_validate_range_sector_overflow() {
        assert!(validate_range(geometry(), HostSectors::new(u64::MAX), 1).is_err());
    }
}
