// ovpn-api: Async Rust client for the OpenVPN Cloud API (hosts, connectors, regions)

pub mod auth;
pub mod client;
mod connectors;
pub mod error;
mod hosts;
mod regions;
pub mod transport;
pub mod types;

pub use auth::{AuthConfig, AuthData};
pub use client::Client;
pub use error::{Error, ErrorResponse};
pub use transport::{TlsMode, Transport, TransportConfig};
pub use types::{
    ConnectionStatus, Connector, ConnectorData, ConnectorRequest, CreateHostRequest, Host,
    NetworkItemType, Region, UpdateHostRequest,
};
