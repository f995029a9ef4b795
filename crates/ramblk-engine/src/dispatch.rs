//! Request model and dispatcher
//!
//! The host delivers one [`Request`] per dispatch call; the dispatcher
//! processes it to completion synchronously and returns exactly one terminal
//! [`Completion`]. Per-request failures (bad kind, unknown target, spans
//! past the end of the device) resolve to an `IoError` completion status
//! here and never unwind to the caller.

use crate::capacity;
use crate::device::DeviceTable;
use crate::host::QueueDriver;
use bytes::Bytes;
use ramblk_common::types::{DeviceId, HostSectors};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Operation kind of one request
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RequestKind {
    Read,
    Write,
    /// Passthrough/control requests; admitted straight to an error
    /// completion, never attempted on the backing store
    Control,
}

/// One contiguous host-side buffer of a request
///
/// Segments are consumed in order, exactly once per dispatch call. A write
/// segment carries its payload; a read segment only sizes the host buffer to
/// fill.
#[derive(Clone, Debug)]
pub struct Segment {
    len: usize,
    data: Bytes,
}

impl Segment {
    /// Segment carrying a write payload
    #[must_use]
    pub fn write(data: Bytes) -> Self {
        Self {
            len: data.len(),
            data,
        }
    }

    /// Read segment of the given buffer length
    #[must_use]
    pub fn read(len: usize) -> Self {
        Self {
            len,
            data: Bytes::new(),
        }
    }

    /// Transfer length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Write payload (empty for read segments)
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.data
    }
}

/// One I/O request as delivered by the host queue
#[derive(Clone, Debug)]
pub struct Request {
    /// Target device identity
    pub target: DeviceId,
    pub kind: RequestKind,
    /// Starting offset in host sector units
    pub start_sector: HostSectors,
    /// Ordered host-side buffers; device-side the request is one contiguous
    /// range starting at `start_sector`
    pub segments: Vec<Segment>,
}

/// Terminal status of one request, acknowledged exactly once
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IoStatus {
    Ok,
    IoError,
}

/// What happened to one segment, aligned 1:1 with the request's segments
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// Data read back for this segment
    Read(Bytes),
    /// Payload applied to the backing store
    Written,
    /// No transfer performed (request rejected, or a prior segment failed)
    Skipped,
}

/// Completion of one dispatch call
#[derive(Clone, Debug)]
pub struct Completion {
    pub status: IoStatus,
    pub segments: Vec<SegmentOutcome>,
}

impl Completion {
    /// Error completion with every segment untouched
    #[must_use]
    pub fn rejected(segment_count: usize) -> Self {
        Self {
            status: IoStatus::IoError,
            segments: vec![SegmentOutcome::Skipped; segment_count],
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == IoStatus::Ok
    }
}

/// Processes queued requests against the shared device table
///
/// One dispatcher instance serves every registered queue; the per-device
/// store lock serializes transfers, so several dispatch contexts may run
/// concurrently as long as they target different devices.
pub struct RequestDispatcher {
    devices: Arc<DeviceTable>,
}

impl RequestDispatcher {
    pub(crate) fn new(devices: Arc<DeviceTable>) -> Self {
        Self { devices }
    }

    fn process(&self, request: &Request) -> Completion {
        let segment_count = request.segments.len();

        // Admit: control/passthrough requests never reach the store
        let writing = match request.kind {
            RequestKind::Read => false,
            RequestKind::Write => true,
            RequestKind::Control => {
                warn!(device = %request.target, "rejecting non-storage request");
                return Completion::rejected(segment_count);
            }
        };

        // Resolve: an unknown target means the registration is inconsistent,
        // which is a different failure class than a bounds violation
        let Some(device) = self.devices.get(request.target) else {
            error!(device = %request.target, "dispatch for device not present in the registry");
            return Completion::rejected(segment_count);
        };

        let size = device.geometry().total_bytes();
        let Some(mut offset) = request.start_sector.checked_byte_offset() else {
            warn!(device = %request.target, start_sector = %request.start_sector, "request start past addressable range");
            return Completion::rejected(segment_count);
        };

        // One in-flight transfer per device: the store guard is held for the
        // whole request
        let mut store = device.store();

        let mut outcomes = Vec::with_capacity(segment_count);
        let mut failed = false;

        for segment in &request.segments {
            if failed {
                outcomes.push(SegmentOutcome::Skipped);
                continue;
            }

            let length = segment.len();
            if capacity::validate_span(offset, length as u64, size).is_err() {
                warn!(
                    device = %request.target,
                    offset,
                    length,
                    size,
                    "segment beyond end of device, failing request"
                );
                failed = true;
                outcomes.push(SegmentOutcome::Skipped);
                continue;
            }

            let outcome = if writing {
                store.write(offset, segment.payload()).map(|()| SegmentOutcome::Written)
            } else {
                store.read(offset, length).map(SegmentOutcome::Read)
            };
            match outcome {
                Ok(outcome) => {
                    outcomes.push(outcome);
                    // Segments land back to back on the device: advance by
                    // the exact byte length so sub-sector segments stay
                    // contiguous
                    offset += length as u64;
                }
                Err(e) => {
                    warn!(device = %request.target, error = %e, "transfer failed");
                    failed = true;
                    outcomes.push(SegmentOutcome::Skipped);
                }
            }
        }

        let status = if failed { IoStatus::IoError } else { IoStatus::Ok };
        debug!(device = %request.target, segments = segment_count, ?status, "request complete");
        Completion {
            status,
            segments: outcomes,
        }
    }
}

impl QueueDriver for RequestDispatcher {
    fn dispatch(&self, request: Request) -> Completion {
        self.process(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, DeviceTable};
    use crate::store::BackingStore;
    use ramblk_common::types::Geometry;

    /// Dispatcher over freshly created devices, one per geometry
    fn setup(geometries: &[Geometry]) -> RequestDispatcher {
        let table = Arc::new(DeviceTable::with_slots(geometries.len() as u32).unwrap());
        for (index, &geometry) in geometries.iter().enumerate() {
            let id = DeviceId::new(index as u32);
            let store = BackingStore::allocate(geometry).unwrap();
            let device = Arc::new(Device::new(id, format!("ramblk{index}"), geometry, store));
            table.insert(device).unwrap();
        }
        RequestDispatcher::new(table)
    }

    fn write_request(target: u32, start_sector: u64, payloads: &[Bytes]) -> Request {
        Request {
            target: DeviceId::new(target),
            kind: RequestKind::Write,
            start_sector: HostSectors::new(start_sector),
            segments: payloads.iter().cloned().map(Segment::write).collect(),
        }
    }

    fn read_request(target: u32, start_sector: u64, lengths: &[usize]) -> Request {
        Request {
            target: DeviceId::new(target),
            kind: RequestKind::Read,
            start_sector: HostSectors::new(start_sector),
            segments: lengths.iter().map(|&len| Segment::read(len)).collect(),
        }
    }

    fn read_back(dispatcher: &RequestDispatcher, target: u32, start_sector: u64, len: usize) -> Bytes {
        let completion = dispatcher.dispatch(read_request(target, start_sector, &[len]));
        assert!(completion.is_ok());
        match &completion.segments[0] {
            SegmentOutcome::Read(data) => data.clone(),
            other => panic!("expected read data, got {other:?}"),
        }
    }

    #[test]
    fn test_three_segments_applied_in_order() {
        // 512-sector device, 512 B sectors: 262144 bytes total
        let dispatcher = setup(&[Geometry::new(512, 512).unwrap()]);

        let segments = [
            Bytes::from(vec![0x01; 200]),
            Bytes::from(vec![0x02; 300]),
            Bytes::from(vec![0x03; 512]),
        ];
        let completion = dispatcher.dispatch(write_request(0, 0, &segments));
        assert_eq!(completion.status, IoStatus::Ok);
        assert_eq!(
            completion.segments,
            vec![SegmentOutcome::Written; 3]
        );

        // Segments are contiguous on the device: 0..200, 200..500, 500..1012
        let data = read_back(&dispatcher, 0, 0, 1012);
        assert!(data[..200].iter().all(|&b| b == 0x01));
        assert!(data[200..500].iter().all(|&b| b == 0x02));
        assert!(data[500..].iter().all(|&b| b == 0x03));
    }

    #[test]
    fn test_devices_are_independent() {
        let geometry = Geometry::new(1024, 512).unwrap();
        let dispatcher = setup(&[geometry, geometry]);

        let completion =
            dispatcher.dispatch(write_request(0, 0, &[Bytes::from(vec![0xAB; 512])]));
        assert!(completion.is_ok());

        assert!(read_back(&dispatcher, 0, 0, 512).iter().all(|&b| b == 0xAB));
        assert!(read_back(&dispatcher, 1, 0, 512).iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_read_returns_per_segment_data() {
        let dispatcher = setup(&[Geometry::new(1024, 512).unwrap()]);
        dispatcher.dispatch(write_request(0, 2, &[Bytes::from(vec![0x5A; 1024])]));

        let completion = dispatcher.dispatch(read_request(0, 2, &[256, 768]));
        assert!(completion.is_ok());
        let [SegmentOutcome::Read(first), SegmentOutcome::Read(second)] =
            completion.segments.as_slice()
        else {
            panic!("expected two read segments");
        };
        assert_eq!(first.len(), 256);
        assert_eq!(second.len(), 768);
        assert!(first.iter().chain(second.iter()).all(|&b| b == 0x5A));
    }

    #[test]
    fn test_control_request_rejected_without_touching_store() {
        let dispatcher = setup(&[Geometry::new(8, 512).unwrap()]);

        let completion = dispatcher.dispatch(Request {
            target: DeviceId::new(0),
            kind: RequestKind::Control,
            start_sector: HostSectors::new(0),
            segments: vec![Segment::write(Bytes::from(vec![0xFF; 512]))],
        });
        assert_eq!(completion.status, IoStatus::IoError);
        assert_eq!(completion.segments, vec![SegmentOutcome::Skipped]);

        assert!(read_back(&dispatcher, 0, 0, 512).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_unknown_target_is_io_error() {
        let dispatcher = setup(&[Geometry::new(8, 512).unwrap()]);

        let completion =
            dispatcher.dispatch(write_request(7, 0, &[Bytes::from(vec![0xFF; 512])]));
        assert_eq!(completion.status, IoStatus::IoError);
        assert_eq!(completion.segments, vec![SegmentOutcome::Skipped]);
    }

    #[test]
    fn test_segment_past_end_fails_request() {
        // 8 × 512 B = 4096 bytes; second segment starts at the last sector
        // boundary and runs past the end
        let dispatcher = setup(&[Geometry::new(8, 512).unwrap()]);

        let completion = dispatcher.dispatch(write_request(
            0,
            7,
            &[Bytes::from(vec![0x01; 512]), Bytes::from(vec![0x02; 512])],
        ));
        assert_eq!(completion.status, IoStatus::IoError);
        assert_eq!(
            completion.segments,
            vec![SegmentOutcome::Written, SegmentOutcome::Skipped]
        );

        // The in-range segment stays applied
        assert!(read_back(&dispatcher, 0, 7, 512).iter().all(|&b| b == 0x01));
    }

    #[test]
    fn test_overlong_segment_leaves_store_unmodified() {
        let dispatcher = setup(&[Geometry::new(8, 512).unwrap()]);

        // Starts in range, extends 88 bytes past the end
        let completion =
            dispatcher.dispatch(write_request(0, 7, &[Bytes::from(vec![0xEE; 600])]));
        assert_eq!(completion.status, IoStatus::IoError);
        assert_eq!(completion.segments, vec![SegmentOutcome::Skipped]);

        assert!(read_back(&dispatcher, 0, 7, 512).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_later_segments_skipped_after_failure() {
        let dispatcher = setup(&[Geometry::new(8, 512).unwrap()]);

        let completion = dispatcher.dispatch(write_request(
            0,
            7,
            &[
                Bytes::from(vec![0x01; 512]),
                Bytes::from(vec![0x02; 512]),
                Bytes::from(vec![0x03; 512]),
            ],
        ));
        assert_eq!(completion.status, IoStatus::IoError);
        assert_eq!(
            completion.segments,
            vec![
                SegmentOutcome::Written,
                SegmentOutcome::Skipped,
                SegmentOutcome::Skipped,
            ]
        );
    }

    #[test]
    fn test_start_sector_overflow_rejected() {
        let dispatcher = setup(&[Geometry::new(8, 512).unwrap()]);

        let completion = dispatcher.dispatch(write_request(
            0,
            u64::MAX,
            &[Bytes::from(vec![0x01; 512])],
        ));
        assert_eq!(completion.status, IoStatus::IoError);
    }

    #[test]
    fn test_empty_request_completes_ok() {
        let dispatcher = setup(&[Geometry::new(8, 512).unwrap()]);

        let completion = dispatcher.dispatch(write_request(0, 0, &[]));
        assert!(completion.is_ok());
        assert!(completion.segments.is_empty());
    }
}
