//! Ramblk Engine - virtual block devices backed by memory
//!
//! This crate implements a small multi-queue block device engine: it exposes
//! one or more independently addressable devices, each backed by a fixed-size
//! in-memory buffer, and services structured read/write requests delivered by
//! a host block layer through per-device queue registrations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   Host block     │  open/release, queued I/O requests
//! │     layer        │
//! └────────┬─────────┘
//!          │ HostBridge (identity / queue / namespace boundaries)
//! ┌────────▼─────────┐
//! │  DeviceRegistry  │  create/destroy lifecycle, identity token
//! │  ├ Device ×N     │  geometry, open count, queue handle
//! │  │  └ BackingStore  (one contiguous in-memory buffer)
//! │  ├ RequestDispatcher  (per-request segment iteration)
//! │  └ LifecycleController (open/release reference counts)
//! └──────────────────┘
//! ```
//!
//! All per-request errors resolve to a completion status inside the
//! dispatcher; only initialization errors surface through `Result`.

pub mod capacity;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod registry;
pub mod store;

pub use device::Device;
pub use dispatch::{
    Completion, IoStatus, Request, RequestDispatcher, RequestKind, Segment, SegmentOutcome,
};
pub use error::{EngineError, EngineResult};
pub use host::{HostBridge, IdentityToken, QueueDriver, QueueHandle};
pub use lifecycle::LifecycleController;
pub use registry::DeviceRegistry;
pub use store::BackingStore;
