// tuyasense-api: Async Rust client for the Tuya cloud OpenAPI

pub mod auth;
pub mod client;
mod devices;
pub mod error;
pub mod models;
mod sign;
pub mod transport;

pub use auth::{AccessToken, Credentials, Region};
pub use client::TuyaClient;
pub use error::Error;
pub use models::{DeviceInfo, SpecEntry, Specification, StatusEntry};
pub use transport::TransportConfig;
