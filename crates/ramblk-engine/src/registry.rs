//! Device registry: create/destroy lifecycle and identity allocation
//!
//! The registry is an explicit value owned by the embedder's top-level
//! lifecycle — there is no ambient global device table. It obtains the
//! storage identity from the host, creates the configured devices, and
//! tears everything down in reverse order, releasing the identity last.
//! Registration and teardown are single-threaded by contract; concurrent
//! dispatch is stopped per device (queue unregistration) before that
//! device's storage is freed.

use crate::device::{Device, DeviceTable};
use crate::dispatch::RequestDispatcher;
use crate::error::{EngineError, EngineResult};
use crate::host::{HostBridge, IdentityToken, QueueDriver};
use crate::lifecycle::LifecycleController;
use crate::store::BackingStore;
use ramblk_common::config::EngineConfig;
use ramblk_common::types::{DeviceId, Geometry};
use std::sync::Arc;
use tracing::{info, warn};

/// Owns the set of devices and drives their lifecycle
pub struct DeviceRegistry {
    config: EngineConfig,
    geometry: Geometry,
    host: Arc<dyn HostBridge>,
    /// `None` once torn down
    token: Option<IdentityToken>,
    devices: Arc<DeviceTable>,
    dispatcher: Arc<RequestDispatcher>,
}

impl DeviceRegistry {
    /// Initialize the registry and create the configured devices
    ///
    /// Obtains the storage identity first; if that fails, nothing is
    /// allocated. If the device table cannot be allocated, the identity is
    /// released again before the error surfaces. A device that fails to
    /// create is logged and skipped; the remaining devices still initialize.
    pub fn initialize(config: EngineConfig, host: Arc<dyn HostBridge>) -> EngineResult<Self> {
        config.validate()?;
        let geometry = config.geometry()?;

        let token = host.obtain_storage_identity(&config.device_name_prefix)?;

        let devices = match DeviceTable::with_slots(config.device_count) {
            Ok(table) => Arc::new(table),
            Err(e) => {
                // No leaked global registration
                host.release_storage_identity(token);
                return Err(e);
            }
        };
        let dispatcher = Arc::new(RequestDispatcher::new(Arc::clone(&devices)));

        let registry = Self {
            config,
            geometry,
            host,
            token: Some(token),
            devices,
            dispatcher,
        };

        let mut created = 0u32;
        for index in 0..registry.config.device_count {
            match registry.create_device(index) {
                Ok(()) => created += 1,
                Err(e) => {
                    warn!(device = index, error = %e, "device creation failed, continuing with remaining devices");
                }
            }
        }
        info!(
            created,
            configured = registry.config.device_count,
            identity = %token,
            "registry initialized"
        );
        Ok(registry)
    }

    /// Create the device for one registry slot
    ///
    /// Rolls back on failure: if the queue registration is refused, the
    /// just-allocated backing store is freed and the device is never
    /// published to the host namespace.
    pub fn create_device(&self, index: u32) -> EngineResult<()> {
        let id = DeviceId::new(index);
        if index >= self.config.device_count {
            return Err(EngineError::UnknownTarget { device: id });
        }
        if self.devices.get(id).is_some() {
            return Err(EngineError::Busy { device: id });
        }

        let name = self.config.device_name(index);
        let store = BackingStore::allocate(self.geometry)?;
        let device = Arc::new(Device::new(id, name.clone(), self.geometry, store));
        self.devices.insert(Arc::clone(&device))?;

        let driver = Arc::clone(&self.dispatcher) as Arc<dyn QueueDriver>;
        let queue = match self.host.register_queue(id, driver) {
            Ok(queue) => queue,
            Err(e) => {
                // Empty the slot again; dropping the device frees its store
                self.devices.take(index);
                return Err(e);
            }
        };
        device.attach_queue(queue);

        self.host
            .publish_device(id, self.geometry.host_sectors(), &name);
        info!(
            device = %id,
            name = %name,
            capacity_host_sectors = %self.geometry.host_sectors(),
            "created device"
        );
        Ok(())
    }

    /// Tear down every created device and release the identity token
    ///
    /// Devices go down in reverse creation order: unpublish, unregister the
    /// queue, free the store. Each step tolerates a partially-initialized
    /// device (empty slot, missing queue handle). A second call is a no-op.
    pub fn teardown(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };

        for index in (0..self.devices.slot_count()).rev() {
            let Some(device) = self.devices.take(index) else {
                continue;
            };
            self.host.unpublish_device(device.id());
            if let Some(queue) = device.take_queue() {
                self.host.unregister_queue(queue);
            }
            info!(device = %device.id(), "tore down device");
            // Dropping the last reference frees the backing store
        }

        self.host.release_storage_identity(token);
        info!(identity = %token, "released storage identity");
    }

    /// Look up a created device
    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.devices.get(id)
    }

    /// Number of configured device slots
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.devices.slot_count()
    }

    /// The dispatch entry point bound to this registry's queues
    #[must_use]
    pub fn dispatcher(&self) -> Arc<RequestDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Open/release handler over this registry's devices
    #[must_use]
    pub fn lifecycle(&self) -> LifecycleController {
        LifecycleController::new(Arc::clone(&self.devices))
    }

    /// The identity token currently held, if any
    #[must_use]
    pub fn identity(&self) -> Option<IdentityToken> {
        self.token
    }
}

impl Drop for DeviceRegistry {
    fn drop(&mut self) {
        self.teardown();
    }
}
