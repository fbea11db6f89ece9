use std::collections::BTreeMap;
use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use strum::VariantNames;
use thiserror::Error;

use crate::types::{NetworkItemType, null_as_default};

/// Top-level error type for the `ovpn-api` crate.
///
/// Every operation on [`Client`](crate::Client) returns one of these. The
/// variants fall into five groups: preconditions checked before any network
/// call, input validation, transport failures, server rejections, and body
/// decoding. Nothing is retried or swallowed; callers map these into their
/// own diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Preconditions ───────────────────────────────────────────────
    /// A resource operation was attempted before `authenticate()` succeeded.
    #[error("authentication is required")]
    AuthenticationRequired,

    // ── Validation ──────────────────────────────────────────────────
    /// A network item type outside the closed `HOST` / `NETWORK` set.
    #[error(
        "invalid value for NetworkItemType: '{value}'. Possible values are: {possible}",
        possible = NetworkItemType::VARIANTS.join(", ")
    )]
    InvalidNetworkItemType { value: String },

    /// URL parsing error (bad host in `AuthConfig`, unjoinable path).
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A credential or token cannot be carried in an HTTP header.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// TLS setup failed while building the HTTP client.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Server ──────────────────────────────────────────────────────
    /// Structured error body returned by the API.
    #[error(transparent)]
    Api(#[from] ErrorResponse),

    /// Error status whose body was not a structured error document.
    #[error("{method} {path} {status}")]
    Http {
        method: String,
        path: String,
        status: StatusCode,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// A success body that does not match the expected shape.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A request body could not be encoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if the operation was refused locally for lack of a token.
    pub fn is_authentication_required(&self) -> bool {
        matches!(self, Self::AuthenticationRequired)
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// HTTP status of a server-side failure, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(body) => StatusCode::from_u16(body.status).ok(),
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Server-assigned request id, useful when reporting issues upstream.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Api(body) if !body.request_id.is_empty() => Some(&body.request_id),
            _ => None,
        }
    }

    /// Field-level validation messages from a structured error body.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            Self::Api(body) => Some(&body.errors),
            _ => None,
        }
    }
}

// ── Error response shape ─────────────────────────────────────────────

/// The decoded body of any API response with status >= 400.
///
/// Implements [`std::error::Error`] so it can be returned as-is inside
/// [`Error::Api`]. Its display form is `"<status> <statusError> <errors>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorResponse {
    /// Field name -> validation messages.
    #[serde(deserialize_with = "null_as_default")]
    pub errors: BTreeMap<String, Vec<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub status_error: String,
    /// Epoch milliseconds.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: i64,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.status_error)?;
        for (i, (field, messages)) in self.errors.iter().enumerate() {
            let sep = if i == 0 { " " } else { "; " };
            write!(f, "{sep}{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorResponse {}
