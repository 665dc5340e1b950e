// Gateway HTTP client
//
// Wraps `reqwest::Client` with credential application, API-root URL
// construction, the per-request timeout, and uniform error translation.
// Endpoint groups (resources, modes, tags, gateway, projects) live in their
// own modules as inherent methods so this file stays about transport.

use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::Credential;
use crate::connection::{RemotePath, ResolvedConnection};
use crate::error::{Error, HttpStatusError, classify_transport};
use crate::transport::TransportConfig;

// ── Request / response ───────────────────────────────────────────────

/// Body of an outgoing request.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Bytes {
        data: Bytes,
        content_type: String,
    },
    /// Streamed body; `content_length` is declared when known up front,
    /// otherwise chunked transfer encoding is used.
    Stream {
        body: reqwest::Body,
        content_type: String,
        content_length: Option<u64>,
    },
}

impl RequestBody {
    fn apply(self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Empty => builder,
            Self::Json(value) => builder.json(&value),
            Self::Bytes { data, content_type } => {
                builder.header(CONTENT_TYPE, content_type).body(data)
            }
            Self::Stream {
                body,
                content_type,
                content_length,
            } => {
                let builder = builder.header(CONTENT_TYPE, content_type);
                let builder = match content_length {
                    Some(len) => builder.header(CONTENT_LENGTH, len),
                    None => builder,
                };
                builder.body(body)
            }
        }
    }
}

/// A single HTTP call against the gateway.
#[derive(Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}

/// A fully buffered 2xx response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::decode(&e, &self.body))
    }

    /// Body as text (lossy UTF-8).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether the gateway declared a JSON content type.
    pub fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"))
    }

    /// JSON value if the response is JSON, else the text wrapped as a string.
    pub fn into_value(self) -> Result<Value, Error> {
        if self.body.is_empty() {
            Ok(Value::Null)
        } else if self.is_json() {
            self.json()
        } else {
            Ok(Value::String(self.text()))
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Ignition gateway REST API.
///
/// Holds one resolved connection and one credential for the lifetime of
/// an invocation. Requests are sent one at a time and never retried.
pub struct GatewayClient {
    http: reqwest::Client,
    connection: ResolvedConnection,
    credential: Credential,
}

impl GatewayClient {
    /// Build a client from a resolved connection and credential.
    pub fn new(connection: ResolvedConnection, credential: Credential) -> Result<Self, Error> {
        let http = TransportConfig::from_connection(&connection).build_client()?;
        Ok(Self {
            http,
            connection,
            credential,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages TLS and timeouts).
    pub fn with_client(
        http: reqwest::Client,
        connection: ResolvedConnection,
        credential: Credential,
    ) -> Self {
        Self {
            http,
            connection,
            credential,
        }
    }

    pub fn connection(&self) -> &ResolvedConnection {
        &self.connection
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// URL under `/data/api/v1`.
    pub fn api_url(&self, path: &RemotePath) -> Result<Url, Error> {
        self.connection.api_url(path)
    }

    /// URL relative to the gateway origin (e.g. `/openapi.json`).
    pub fn origin_url(&self, path: &RemotePath) -> Result<Url, Error> {
        self.connection.origin_url(path)
    }

    // ── Execution ────────────────────────────────────────────────────

    /// Send a request and buffer the response body.
    ///
    /// Non-2xx statuses and transport failures come back already classified.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        let resp = self.dispatch(request, true).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    /// Send a request and hand back the unread 2xx response for streaming.
    ///
    /// Only connection setup and individual reads are bounded by the
    /// timeout, so a long transfer that keeps making progress completes.
    pub async fn execute_streaming(&self, request: ApiRequest) -> Result<reqwest::Response, Error> {
        self.dispatch(request, false).await
    }

    async fn dispatch(
        &self,
        request: ApiRequest,
        bounded: bool,
    ) -> Result<reqwest::Response, Error> {
        let ApiRequest {
            method,
            url,
            query,
            body,
        } = request;
        debug!(%method, %url, "sending gateway request");

        let mut builder = self.http.request(method, url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if bounded {
            if let Some(timeout) = self.connection.timeout() {
                builder = builder.timeout(timeout);
            }
        }
        builder = self.credential.apply(builder)?;
        builder = body.apply(builder);

        let resp = builder.send().await.map_err(|e| self.transport_error(&e))?;
        self.check_status(resp).await
    }

    async fn check_status(&self, resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let url = resp.url().clone();
        let body = resp.text().await.unwrap_or_default();
        let preview: String = body.chars().take(200).collect();
        debug!(%status, %url, body = %preview, "gateway returned error");
        Err(HttpStatusError { status, body, url }.into())
    }

    pub(crate) fn transport_error(&self, err: &reqwest::Error) -> Error {
        classify_transport(err, self.connection.timeout())
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// `GET` a path under the API root and decode JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &RemotePath,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let request = ApiRequest::new(Method::GET, self.api_url(path)?).query_pairs(owned(query));
        self.execute(request).await?.json()
    }

    /// `POST` a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &RemotePath,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<ApiResponse, Error> {
        self.send_json(Method::POST, path, query, body).await
    }

    /// `PUT` a JSON body.
    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &RemotePath,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<ApiResponse, Error> {
        self.send_json(Method::PUT, path, query, body).await
    }

    /// `DELETE` a path under the API root.
    pub async fn delete(
        &self,
        path: &RemotePath,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse, Error> {
        let request =
            ApiRequest::new(Method::DELETE, self.api_url(path)?).query_pairs(owned(query));
        self.execute(request).await
    }

    /// Raw pass-through call: any method, any path under the API root,
    /// optional JSON body.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, Error> {
        let mut request = ApiRequest::new(method, self.api_url(&RemotePath::parse(path))?);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request).await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &RemotePath,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<ApiResponse, Error> {
        let value = serde_json::to_value(body).map_err(|e| Error::General {
            message: format!("failed to encode request body: {e}"),
            status: None,
        })?;
        let request = ApiRequest::new(method, self.api_url(path)?)
            .query_pairs(owned(query))
            .json(value);
        self.execute(request).await
    }
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}
