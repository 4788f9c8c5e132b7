// m4250-api: Async Rust client for the Netgear M4250 switch REST API

pub mod auth;
pub mod client;
pub mod device;
pub mod error;
pub mod models;
pub mod poe;
pub mod ports;
pub mod transport;

pub use client::{DEFAULT_API_PORT, SwitchClient};
pub use device::REBOOT_DELAY_SECS;
pub use error::Error;
pub use models::{
    DeviceStatus, LinkSpeed, LoginGrant, PoeConfigTable, PoePortConfig, PoeStatus, PortCollection,
    PortEntry, PortStats, PortStatsTable, Uptime,
};
pub use transport::{TlsMode, TransportConfig};
