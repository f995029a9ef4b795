//! Open/release lifecycle handling
//!
//! Block devices permit multiple concurrent openers; the per-device lock
//! only makes the reference-count update atomic, it does not enforce
//! exclusivity. A release without a matching open is clamped at zero rather
//! than rejected, so the count can never go negative.

use crate::device::{Device, DeviceTable};
use crate::error::{EngineError, EngineResult};
use ramblk_common::types::DeviceId;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handles open/release events from the host, independent of the I/O path
#[derive(Clone)]
pub struct LifecycleController {
    devices: Arc<DeviceTable>,
}

impl LifecycleController {
    pub(crate) fn new(devices: Arc<DeviceTable>) -> Self {
        Self { devices }
    }

    /// Take an open reference on a device
    pub fn open(&self, device: DeviceId) -> EngineResult<()> {
        let dev = self.resolve(device)?;
        let mut count = dev.open_count_mut();
        *count += 1;
        if *count == 1 {
            Self::media_changed(&dev);
        }
        debug!(device = %device, open_count = *count, "device opened");
        Ok(())
    }

    /// Drop an open reference on a device
    ///
    /// An unmatched release is clamped: the count stays at zero and the
    /// event is logged.
    pub fn release(&self, device: DeviceId) -> EngineResult<()> {
        let dev = self.resolve(device)?;
        let mut count = dev.open_count_mut();
        if *count == 0 {
            warn!(device = %device, "release without matching open");
        } else {
            *count -= 1;
        }
        debug!(device = %device, open_count = *count, "device released");
        Ok(())
    }

    fn resolve(&self, device: DeviceId) -> EngineResult<Arc<Device>> {
        self.devices
            .get(device)
            .ok_or(EngineError::UnknownTarget { device })
    }

    /// Hook point for revalidating device state on the first open
    /// (0 → 1 transition); currently a no-op extension point.
    fn media_changed(device: &Device) {
        debug!(device = %device.id(), "media change check on first open");
    }
}
