//! Polling and classification layer between `tuyasense-api` and hosts.
//!
//! This crate turns a Tuya cloud account into typed, pollable sensors:
//!
//! - **[`classify()`]** — Pure mapping from a data-point code, its current
//!   value, and optional [`DataPointSpec`] to a [`SensorDescriptor`]:
//!   known-code table, then substring heuristics, then spec range, then a
//!   generic fallback.
//!
//! - **[`discover()`]** — One-shot startup discovery. Resolves explicit device
//!   ids (skipping bad ones) or lists the whole account, then fetches status
//!   and specifications per device and classifies the filtered codes.
//!
//! - **[`Coordinator`]** — One per device. Serializes fetches, keeps the last
//!   good snapshot through failures, and notifies subscribers after each
//!   committed cycle. Driven by a [`Scheduler`]; [`TokioScheduler`] is the
//!   default.
//!
//! - **[`SensorReading`]** — One per data point. Reads its value out of the
//!   shared coordinator snapshot on demand.
//!
//! - **[`SensorHub`]** — The setup sequence: connect, discover, build
//!   coordinators and readings, refresh, register with an
//!   [`EntityRegistrar`], start timers.

pub mod api;
pub mod classify;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod hub;
pub mod model;
pub mod reading;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::DeviceApi;
pub use classify::{classify, humanize};
pub use config::{
    DEFAULT_SCAN_INTERVAL, MIN_SCAN_INTERVAL, PollerConfig, SensorFilter, clamp_scan_interval,
};
pub use coordinator::{
    Coordinator, CoordinatorSnapshot, Scheduler, Subscription, TickFn, TokioScheduler,
};
pub use discovery::{DiscoveredDataPoint, DiscoveredDevice, discover};
pub use error::CoreError;
pub use hub::{EntityRegistrar, SensorHub};
pub use reading::{ReadingState, SensorReading, unique_id};

pub use model::{
    DataPointSample, DataPointSpec, DataPointType, DataPointValue, DeviceDescriptor, SensorClass,
    SensorDescriptor, SensorValue, StateClass,
};
