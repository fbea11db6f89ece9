// Client-credentials authentication
//
// `authenticate()` exchanges the client id/secret for a bearer token at
// `{host}/api/beta/oauth/token` (HTTP Basic + JSON body). The token is kept
// as a pre-built sensitive `Authorization` header and stamped onto every
// subsequent request until the next `authenticate()` replaces it.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, Request};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::client::{Client, build_request, decode_json};
use crate::error::Error;
use crate::transport::Transport;

/// Every endpoint lives under this prefix.
const API_PREFIX: [&str; 2] = ["api", "beta"];

/// Token endpoint, relative to [`API_PREFIX`].
const TOKEN_ENDPOINT: [&str; 2] = ["oauth", "token"];

/// Connection settings, fixed for the lifetime of a [`Client`].
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Service root, e.g. `https://acme.api.openvpn.com`.
    pub host: String,
    pub client_id: String,
    pub client_secret: SecretString,
}

impl AuthConfig {
    pub fn new(
        host: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
    ) -> Self {
        Self {
            host: host.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Build `{host}/api/beta/{segments...}`.
    ///
    /// Each segment is percent-encoded as a single path segment, so ids
    /// containing `/` or `?` cannot escape their position.
    pub fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = Url::parse(&self.host)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    fn token_request(&self) -> Result<Request, Error> {
        #[derive(Serialize)]
        struct Body {
            grant_type: &'static str,
            scope: &'static str,
        }

        let url = self.api_url(&TOKEN_ENDPOINT)?;
        let body = serde_json::to_vec(&Body {
            grant_type: "client_credentials",
            scope: "default",
        })?;

        let credentials = STANDARD.encode(format!(
            "{}:{}",
            self.client_id,
            self.client_secret.expose_secret()
        ));
        let mut basic = HeaderValue::try_from(format!("Basic {credentials}"))?;
        basic.set_sensitive(true);

        let mut request = build_request(Method::POST, url, Some(body));
        request.headers_mut().insert(AUTHORIZATION, basic);
        Ok(request)
    }
}

// ── Token ────────────────────────────────────────────────────────────

/// Success body of the token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: SecretString,
}

/// A bearer token obtained from the client-credentials exchange.
///
/// Holds the ready-to-send `Authorization` header, marked sensitive so it
/// never shows up in `Debug` output.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "TokenResponse")]
pub struct AuthData {
    bearer: HeaderValue,
}

impl AuthData {
    /// Wrap an access token obtained elsewhere.
    pub fn new(access_token: &SecretString) -> Result<Self, Error> {
        let mut bearer =
            HeaderValue::try_from(format!("Bearer {}", access_token.expose_secret()))?;
        bearer.set_sensitive(true);
        Ok(Self { bearer })
    }

    /// Set `Authorization: Bearer <token>` on `request`, replacing any
    /// existing value.
    pub fn authorize_request(&self, request: &mut Request) {
        request
            .headers_mut()
            .insert(AUTHORIZATION, self.bearer.clone());
    }
}

impl TryFrom<TokenResponse> for AuthData {
    type Error = Error;

    fn try_from(resp: TokenResponse) -> Result<Self, Self::Error> {
        Self::new(&resp.access_token)
    }
}

// ── Client integration ───────────────────────────────────────────────

impl<T: Transport> Client<T> {
    /// Exchange the configured client credentials for a bearer token.
    ///
    /// On success the token replaces any previous one. On failure the
    /// previous token (if any) is left in place.
    pub async fn authenticate(&mut self) -> Result<(), Error> {
        let request = self.auth_config.token_request()?;
        debug!("authenticating at {}", request.url());

        let resp = self.execute(request).await?;
        let auth_data: AuthData = decode_json(resp).await?;
        self.auth_data = Some(auth_data);

        debug!("authentication successful");
        Ok(())
    }
}
