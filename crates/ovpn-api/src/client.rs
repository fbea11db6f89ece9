// API client and request pipeline
//
// Owns the transport, the immutable `AuthConfig`, and the bearer token. Every
// resource operation funnels through `send()`: authentication gate, URL
// construction, authorization header, transport call, status classification.
// Endpoint methods live in hosts.rs, connectors.rs and regions.rs.

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::{AuthConfig, AuthData};
use crate::error::{Error, ErrorResponse};
use crate::transport::{Transport, TransportConfig};

/// Client for the `/api/beta` REST surface.
///
/// Construct with [`Client::new`] (any [`Transport`]) or
/// [`Client::from_config`] (a configured `reqwest::Client`), call
/// [`authenticate()`](Self::authenticate) once, then issue resource
/// operations. Operations made before a successful authentication fail with
/// [`Error::AuthenticationRequired`] without touching the network.
pub struct Client<T = reqwest::Client> {
    pub(crate) transport: T,
    pub(crate) auth_config: AuthConfig,
    pub(crate) auth_data: Option<AuthData>,
}

impl Client<reqwest::Client> {
    /// Create a client backed by a `reqwest::Client` built from `transport`.
    pub fn from_config(auth_config: AuthConfig, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self::new(transport.build_client()?, auth_config))
    }
}

impl<T: Transport> Client<T> {
    /// Create an unauthenticated client.
    pub fn new(transport: T, auth_config: AuthConfig) -> Self {
        Self {
            transport,
            auth_config,
            auth_data: None,
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The configuration this client was built with.
    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth_config
    }

    /// `true` once `authenticate()` has stored a token.
    pub fn is_authenticated(&self) -> bool {
        self.auth_data.is_some()
    }

    /// Stamp a caller-built request with the current bearer token.
    pub fn authorize_request(&self, request: &mut Request) -> Result<(), Error> {
        let auth_data = self.auth_data.as_ref().ok_or(Error::AuthenticationRequired)?;
        auth_data.authorize_request(request);
        Ok(())
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<R: DeserializeOwned>(&self, path: &[&str]) -> Result<R, Error> {
        self.request(Method::GET, path, &[], None).await
    }

    pub(crate) async fn post<R: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<R, Error> {
        self.request_json(Method::POST, path, &[], body).await
    }

    pub(crate) async fn post_with_params<R: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &[&str],
        params: &[(&str, &str)],
        body: &B,
    ) -> Result<R, Error> {
        self.request_json(Method::POST, path, params, body).await
    }

    pub(crate) async fn put<R: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<R, Error> {
        self.request_json(Method::PUT, path, &[], body).await
    }

    pub(crate) async fn put_with_params<R: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &[&str],
        params: &[(&str, &str)],
        body: &B,
    ) -> Result<R, Error> {
        self.request_json(Method::PUT, path, params, body).await
    }

    pub(crate) async fn delete(&self, path: &[&str]) -> Result<(), Error> {
        self.send(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    pub(crate) async fn delete_with_params(
        &self,
        path: &[&str],
        params: &[(&str, &str)],
    ) -> Result<(), Error> {
        self.send(Method::DELETE, path, params, None).await?;
        Ok(())
    }

    /// POST with an empty body and return the response body verbatim.
    pub(crate) async fn post_for_bytes(&self, path: &[&str]) -> Result<Vec<u8>, Error> {
        let resp = self.send(Method::POST, path, &[], Some(Vec::new())).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    // ── Pipeline ─────────────────────────────────────────────────────

    /// Encode `body` as JSON and decode the JSON response.
    async fn request_json<R: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &[&str],
        params: &[(&str, &str)],
        body: &B,
    ) -> Result<R, Error> {
        let data = serde_json::to_vec(body)?;
        self.request(method, path, params, Some(data)).await
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &[&str],
        params: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<R, Error> {
        let resp = self.send(method, path, params, body).await?;
        decode_json(resp).await
    }

    /// Gate, build, authorize, execute, classify.
    ///
    /// Returns the raw response only when its status is below 400.
    async fn send(
        &self,
        method: Method,
        path: &[&str],
        params: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<Response, Error> {
        let auth_data = self.auth_data.as_ref().ok_or(Error::AuthenticationRequired)?;

        let mut url = self.auth_config.api_url(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        debug!("{method} {url}");

        let mut request = build_request(method, url, body);
        auth_data.authorize_request(&mut request);

        self.execute(request).await
    }

    /// Run a fully built request through the transport and classify the status.
    pub(crate) async fn execute(&self, request: Request) -> Result<Response, Error> {
        let method = request.method().clone();
        let path = request.url().path().to_owned();

        let resp = self.transport.execute(request).await?;
        check_status(&method, &path, resp).await
    }
}

// ── Request / response helpers ───────────────────────────────────────

/// Build a request, tagging non-empty bodies as JSON.
pub(crate) fn build_request(method: Method, url: Url, body: Option<Vec<u8>>) -> Request {
    let mut request = Request::new(method, url);
    if let Some(data) = body {
        if !data.is_empty() {
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        *request.body_mut() = Some(data.into());
    }
    request
}

/// Turn any status >= 400 into an error.
///
/// A JSON object body that decodes as [`ErrorResponse`] becomes
/// [`Error::Api`]; anything else, including an unreadable body, falls back to
/// [`Error::Http`] built from the method, path, and status.
async fn check_status(method: &Method, path: &str, resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if !is_error_status(status) {
        return Ok(resp);
    }

    debug!(%status, "{method} {path} failed");
    let raw = resp.bytes().await.ok();
    Err(classify_error(method, path, status, raw.as_deref()))
}

fn is_error_status(status: StatusCode) -> bool {
    status.as_u16() >= 400
}

/// Build the error for a failed response from its (possibly unread) body.
fn classify_error(method: &Method, path: &str, status: StatusCode, raw: Option<&[u8]>) -> Error {
    let decoded = raw
        .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(bytes).ok())
        .filter(serde_json::Value::is_object)
        .and_then(|value| serde_json::from_value::<ErrorResponse>(value).ok());

    match decoded {
        Some(mut body) => {
            if body.status == 0 {
                body.status = status.as_u16();
                if body.status_error.is_empty() {
                    body.status_error = status.canonical_reason().unwrap_or_default().to_owned();
                }
            }
            Error::Api(body)
        }
        None => Error::Http {
            method: method.to_string(),
            path: path.to_owned(),
            status,
        },
    }
}

pub(crate) async fn decode_json<R: DeserializeOwned>(resp: Response) -> Result<R, Error> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn json_bodies_are_tagged() {
        let url = Url::parse("https://example.com/api/beta/hosts").unwrap();
        let req = build_request(Method::POST, url.clone(), Some(b"{}".to_vec()));
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(req.body().and_then(|b| b.as_bytes()), Some(&b"{}"[..]));

        let req = build_request(Method::POST, url.clone(), Some(Vec::new()));
        assert!(req.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(req.body().and_then(|b| b.as_bytes()), Some(&b""[..]));

        let req = build_request(Method::GET, url, None);
        assert!(req.body().is_none());
    }

    #[test]
    fn error_status_boundary() {
        assert!(!is_error_status(StatusCode::OK));
        assert!(!is_error_status(StatusCode::NO_CONTENT));
        assert!(!is_error_status(StatusCode::PERMANENT_REDIRECT));
        assert!(is_error_status(StatusCode::BAD_REQUEST));
        assert!(is_error_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_error_status(StatusCode::from_u16(600).unwrap()));
        assert!(is_error_status(StatusCode::from_u16(999).unwrap()));
    }

    fn classify(status: u16, raw: Option<&[u8]>) -> Error {
        classify_error(
            &Method::GET,
            "/api/beta/hosts/h-1",
            StatusCode::from_u16(status).unwrap(),
            raw,
        )
    }

    #[test]
    fn non_object_error_bodies_fall_back() {
        for raw in [&b"[]"[..], &b"null"[..], &b"42"[..], &b"\"oops\""[..], &b"<html>"[..]] {
            let err = classify(500, Some(raw));
            assert!(
                matches!(err, Error::Http { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR),
                "{:?} -> {err:?}",
                String::from_utf8_lossy(raw)
            );
        }
    }

    #[test]
    fn unreadable_error_body_falls_back() {
        let err = classify(503, None);
        assert_eq!(
            err.to_string(),
            "GET /api/beta/hosts/h-1 503 Service Unavailable"
        );
    }

    #[test]
    fn object_error_body_is_structured() {
        let err = classify(600, Some(&br#"{"status":600,"statusError":"WEIRD"}"#[..]));
        assert!(
            matches!(err, Error::Api(ref body) if body.status == 600 && body.status_error == "WEIRD"),
            "{err:?}"
        );

        let err = classify(500, Some(&b"{}"[..]));
        assert_eq!(err.to_string(), "500 Internal Server Error");
    }
}
