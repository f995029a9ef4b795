//! Per-device state and the registry's device table
//!
//! A [`Device`] ties together identity, geometry, the backing store, the
//! open-reference count, and the host queue registration. The store and the
//! open count sit behind separate per-device locks: transfers are serialized
//! under the store lock for the full length of a request, while open/release
//! only ever touch the count lock.

use crate::error::{EngineError, EngineResult};
use crate::host::QueueHandle;
use crate::store::BackingStore;
use parking_lot::{Mutex, MutexGuard, RwLock};
use ramblk_common::types::{DeviceId, Geometry};
use std::sync::Arc;

/// One virtual block device
pub struct Device {
    /// Stable slot identity, immutable after creation
    id: DeviceId,
    /// Published name (prefix + slot index)
    name: String,
    geometry: Geometry,
    /// Backing store; the mutex is the per-device transfer guard
    store: Mutex<BackingStore>,
    /// Open references, mutated only by the lifecycle controller
    open_count: Mutex<u32>,
    /// Host queue registration, present from creation until teardown
    queue: Mutex<Option<QueueHandle>>,
}

impl Device {
    pub(crate) fn new(id: DeviceId, name: String, geometry: Geometry, store: BackingStore) -> Self {
        Self {
            id,
            name,
            geometry,
            store: Mutex::new(store),
            open_count: Mutex::new(0),
            queue: Mutex::new(None),
        }
    }

    /// Device identity within the registry
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Published device name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device geometry
    #[must_use]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Current number of open references
    #[must_use]
    pub fn open_count(&self) -> u32 {
        *self.open_count.lock()
    }

    /// Lock the backing store for one full transfer
    pub(crate) fn store(&self) -> MutexGuard<'_, BackingStore> {
        self.store.lock()
    }

    /// Lock the open-reference count
    pub(crate) fn open_count_mut(&self) -> MutexGuard<'_, u32> {
        self.open_count.lock()
    }

    pub(crate) fn attach_queue(&self, queue: QueueHandle) {
        *self.queue.lock() = Some(queue);
    }

    pub(crate) fn take_queue(&self) -> Option<QueueHandle> {
        self.queue.lock().take()
    }
}

/// Slot table shared between the registry, dispatcher, and lifecycle
/// controller
///
/// A slot is `None` until its device is fully created and again after
/// teardown, so a partially-initialized device is never reachable from a
/// dispatch context.
pub(crate) struct DeviceTable {
    slots: RwLock<Vec<Option<Arc<Device>>>>,
}

impl DeviceTable {
    /// Allocate an empty table with `count` slots, fallibly
    pub(crate) fn with_slots(count: u32) -> EngineResult<Self> {
        let count = count as usize;
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(count)
            .map_err(|_| EngineError::Allocation {
                requested_bytes: (count * std::mem::size_of::<Option<Arc<Device>>>()) as u64,
            })?;
        slots.resize_with(count, || None);
        Ok(Self {
            slots: RwLock::new(slots),
        })
    }

    pub(crate) fn slot_count(&self) -> u32 {
        self.slots.read().len() as u32
    }

    pub(crate) fn get(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.slots.read().get(id.index() as usize)?.clone()
    }

    /// Publish a device into its slot; fails if the slot is occupied
    pub(crate) fn insert(&self, device: Arc<Device>) -> EngineResult<()> {
        let mut slots = self.slots.write();
        let index = device.id().index() as usize;
        match slots.get_mut(index) {
            None => Err(EngineError::UnknownTarget { device: device.id() }),
            Some(Some(_)) => Err(EngineError::Busy { device: device.id() }),
            Some(slot) => {
                *slot = Some(device);
                Ok(())
            }
        }
    }

    /// Remove and return the device at `index`, leaving the slot empty
    pub(crate) fn take(&self, index: u32) -> Option<Arc<Device>> {
        self.slots.write().get_mut(index as usize)?.take()
    }
}
