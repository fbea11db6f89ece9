//! Wire types for the `/api/beta` endpoints.
//!
//! Response types are lenient: missing fields and JSON `null` fall back to
//! defaults so a partially populated server document still decodes. Request
//! types serialize exactly the fields each endpoint accepts. Field names use
//! camelCase via `#[serde(rename_all = "camelCase")]`.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

// ── Enumerations ─────────────────────────────────────────────────────

/// Kind of parent network item a connector attaches to.
///
/// A closed set: parsing anything other than exactly `HOST` or `NETWORK`
/// fails with [`Error::InvalidNetworkItemType`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::VariantNames,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkItemType {
    Host,
    Network,
}

impl NetworkItemType {
    /// The wire value (`"HOST"` / `"NETWORK"`).
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Check a raw value without keeping the parsed result.
    pub fn validate(value: &str) -> Result<(), Error> {
        value.parse::<Self>().map(|_| ())
    }
}

impl FromStr for NetworkItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HOST" => Ok(Self::Host),
            "NETWORK" => Ok(Self::Network),
            other => Err(Error::InvalidNetworkItemType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Connector tunnel state as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Online,
    Offline,
    /// Any value this client does not know about yet.
    #[serde(other)]
    Unknown,
}

// ── Regions ──────────────────────────────────────────────────────────

/// A server-defined deployment location, from `GET /regions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Region {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub continent: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country_iso: String,
    #[serde(deserialize_with = "null_as_default")]
    pub region_name: String,
}

// ── Connectors ───────────────────────────────────────────────────────

/// A deployable access point bound to one network item and one region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Connector {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub description: Option<String>,
    pub ip_v4_address: Option<String>,
    pub ip_v6_address: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub network_item_id: String,
    pub network_item_type: Option<NetworkItemType>,
    #[serde(deserialize_with = "null_as_default")]
    pub vpn_region_id: String,
    pub connection_status: Option<ConnectionStatus>,
}

/// JSON body for connector create/update, and the element type of
/// [`CreateHostRequest::connectors`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub vpn_region_id: String,
}

/// Input for [`Client::create_connector`](crate::Client::create_connector)
/// and [`Client::update_connector`](crate::Client::update_connector).
///
/// `network_item_id` and `network_item_type` identify the parent and travel
/// as query parameters; the remaining fields form the JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorData {
    pub name: String,
    pub description: String,
    pub vpn_region_id: String,
    pub network_item_id: String,
    pub network_item_type: NetworkItemType,
}

impl ConnectorData {
    /// Attach a connector body to a host.
    pub fn for_host(host_id: impl Into<String>, request: ConnectorRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            vpn_region_id: request.vpn_region_id,
            network_item_id: host_id.into(),
            network_item_type: NetworkItemType::Host,
        }
    }
}

impl From<&ConnectorData> for ConnectorRequest {
    fn from(data: &ConnectorData) -> Self {
        Self {
            name: data.name.clone(),
            description: data.description.clone(),
            vpn_region_id: data.vpn_region_id.clone(),
        }
    }
}

impl From<&Connector> for ConnectorRequest {
    fn from(connector: &Connector) -> Self {
        Self {
            name: connector.name.clone(),
            description: connector.description.clone().unwrap_or_default(),
            vpn_region_id: connector.vpn_region_id.clone(),
        }
    }
}

// ── Hosts ────────────────────────────────────────────────────────────

/// A logical endpoint grouping connectors plus network configuration.
///
/// `id` and `system_subnets` are server-assigned. `connectors` reflects the
/// server's current connector set for the host and may hold more than one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Host {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub internet_access: String,
    #[serde(deserialize_with = "null_as_default")]
    pub domain: String,
    #[serde(deserialize_with = "null_as_default")]
    pub connectors: Vec<Connector>,
    #[serde(deserialize_with = "null_as_default")]
    pub system_subnets: Vec<String>,
}

impl Host {
    /// Look up one of the host's connectors by id.
    pub fn connector(&self, id: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.id == id)
    }

    /// The first connector the server listed, if any.
    pub fn primary_connector(&self) -> Option<&Connector> {
        self.connectors.first()
    }
}

/// Body for `POST /hosts`. Connectors are created server-side in the same call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHostRequest {
    pub name: String,
    pub description: String,
    pub domain: String,
    pub internet_access: String,
    pub connectors: Vec<ConnectorRequest>,
}

/// Body for `PUT /hosts/{id}`. Connectors are managed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHostRequest {
    pub name: String,
    pub description: String,
    pub domain: String,
    pub internet_access: String,
}

impl From<&Host> for CreateHostRequest {
    fn from(host: &Host) -> Self {
        Self {
            name: host.name.clone(),
            description: host.description.clone().unwrap_or_default(),
            domain: host.domain.clone(),
            internet_access: host.internet_access.clone(),
            connectors: host.connectors.iter().map(ConnectorRequest::from).collect(),
        }
    }
}

impl From<&Host> for UpdateHostRequest {
    fn from(host: &Host) -> Self {
        Self {
            name: host.name.clone(),
            description: host.description.clone().unwrap_or_default(),
            domain: host.domain.clone(),
            internet_access: host.internet_access.clone(),
        }
    }
}

// ── Serde helpers ────────────────────────────────────────────────────

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
