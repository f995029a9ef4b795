//! Host boundary traits
//!
//! The engine never talks to an OS block layer directly; everything it
//! consumes from the surrounding host is collected in [`HostBridge`]:
//!
//! - **Registration boundary**: obtain/release the global storage identity.
//! - **Queue boundary**: register a per-device dispatch callback and tear it
//!   down again.
//! - **Namespace boundary**: publish/unpublish a device, with its capacity
//!   expressed in host sector units.
//!
//! The completion boundary flows the other way: the host invokes
//! [`QueueDriver::dispatch`] once per request and receives exactly one
//! terminal [`Completion`](crate::dispatch::Completion).

use crate::dispatch::{Completion, Request};
use crate::error::EngineResult;
use derive_more::{Display, From, Into};
use ramblk_common::types::{DeviceId, HostSectors};
use std::fmt;
use std::sync::Arc;

/// Opaque token for the global storage identity (a registered major, in
/// kernel terms)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
#[display("{_0}")]
pub struct IdentityToken(u32);

impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityToken({})", self.0)
    }
}

/// Opaque handle for one device's queue registration
#[derive(Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
#[display("{_0}")]
pub struct QueueHandle(u64);

impl fmt::Debug for QueueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueueHandle({})", self.0)
    }
}

/// Per-request dispatch entry point the host invokes through a registered
/// queue
pub trait QueueDriver: Send + Sync {
    /// Process one request to completion, synchronously
    fn dispatch(&self, request: Request) -> Completion;
}

/// Everything the engine consumes from the host block layer
pub trait HostBridge: Send + Sync {
    /// Obtain the global storage identity under which devices are published
    fn obtain_storage_identity(&self, name: &str) -> EngineResult<IdentityToken>;

    /// Return a previously obtained identity token
    fn release_storage_identity(&self, token: IdentityToken);

    /// Bind a dispatch callback to a device's request queue
    fn register_queue(
        &self,
        device: DeviceId,
        driver: Arc<dyn QueueDriver>,
    ) -> EngineResult<QueueHandle>;

    /// Tear down a queue registration; no dispatches arrive afterwards
    fn unregister_queue(&self, queue: QueueHandle);

    /// Make a device visible in the host storage namespace
    fn publish_device(&self, device: DeviceId, capacity: HostSectors, name: &str);

    /// Remove a device from the host storage namespace
    fn unpublish_device(&self, device: DeviceId);
}
