//! Transport seams used by the dispatch layer, plus a reqwest implementation.
//!
//! Two shapes of call site exist. The executor path hands over a request and
//! a completion callback ([`RequestTransport`]); the chat path posts a body
//! and reads the raw reply itself ([`JsonEndpoint`]). [`HttpTransport`]
//! implements both.

use crate::config::EndpointConfig;
use crate::error::{BridgeError, Result};
use crate::providers::Protocol;

use bytes::Bytes;
use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::oneshot;

/// Client headers that travel with a passthrough request.
pub const FORWARDED_HEADERS: &[&str] = &["anthropic-version", "anthropic-beta"];

const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

/// A body exactly as it crossed the wire, plus the headers that go with it.
///
/// Bodies stay opaque bytes so passthrough forwards what the client sent and
/// hands back what the backend answered (JSON or an event stream) untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    pub body: Bytes,
    pub headers: HeaderMap,
}

impl Payload {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::new(serde_json::to_vec(value)?))
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// An empty (or whitespace-only) body means "no response".
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Pick the headers from an incoming request that should reach the backend.
pub fn forwarded_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in FORWARDED_HEADERS {
        if let Some(value) = incoming.get(*name) {
            headers.insert(*name, value.clone());
        }
    }
    headers
}

/// Receives the outcome of exactly one request.
pub type Completion = Box<dyn FnOnce(Result<Payload>) + Send + 'static>;

/// Callback-style request execution (the executor call site).
pub trait RequestTransport: Send + Sync {
    /// Issue `request` and deliver the outcome to `completion` once.
    fn request(&self, request: Payload, completion: Completion) -> BoxFuture<'_, ()>;
}

/// Post a JSON body and return the raw reply payload (the chat call site).
pub trait JsonEndpoint: Send + Sync {
    fn post(&self, body: Value) -> BoxFuture<'_, Result<Bytes>>;
}

/// Drive a [`RequestTransport`] to completion and return what its callback saw.
///
/// A transport that drops the completion without calling it yields
/// [`BridgeError::Cancelled`].
pub async fn call(transport: &dyn RequestTransport, request: Payload) -> Result<Payload> {
    let (tx, rx) = oneshot::channel();
    transport
        .request(
            request,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        )
        .await;
    rx.await.unwrap_or(Err(BridgeError::Cancelled))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `x-api-key: <key>` plus `anthropic-version`
    AnthropicKey,
}

impl From<Protocol> for AuthStyle {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Primary => Self::AnthropicKey,
            Protocol::Secondary => Self::Bearer,
        }
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    auth: AuthStyle,
}

impl HttpTransport {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: Option<String>,
        auth: AuthStyle,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
            auth,
        }
    }

    /// Build a transport for a configured endpoint, speaking whichever
    /// protocol the endpoint is configured (or preset) for.
    pub fn for_endpoint(client: reqwest::Client, endpoint: &EndpointConfig) -> Result<Self> {
        let base_url = endpoint.effective_base_url()?;
        let base_url = base_url.trim_end_matches('/');
        let protocol = endpoint.protocol();
        let url = match protocol {
            Protocol::Primary => format!("{base_url}/v1/messages"),
            Protocol::Secondary => format!("{base_url}/chat/completions"),
        };
        Ok(Self::new(client, url, endpoint.resolve_api_key(), protocol.into()))
    }

    pub fn default_client() -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `request` verbatim and return the reply. Status >= 400 is an error.
    pub async fn send(&self, request: &Payload) -> Result<Payload> {
        let mut builder = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json");

        match (self.auth, self.api_key.as_deref()) {
            (AuthStyle::Bearer, Some(key)) => {
                builder = builder.header("Authorization", format!("Bearer {key}"));
            }
            (AuthStyle::AnthropicKey, key) => {
                if let Some(key) = key {
                    builder = builder.header("x-api-key", key);
                }
                if !request.headers.contains_key("anthropic-version") {
                    builder = builder.header("anthropic-version", DEFAULT_ANTHROPIC_VERSION);
                }
            }
            (AuthStyle::Bearer, None) => {}
        }

        tracing::debug!(url = %self.url, body_len = request.body.len(), "POST");

        let response = builder
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| BridgeError::transport(format!("Request failed: {e}")))?;

        let status = response.status().as_u16();
        let mut headers = HeaderMap::new();
        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, content_type.clone());
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::transport(format!("Failed to read response body: {e}")))?;

        tracing::debug!(status, body_len = body.len(), "Response");

        if status >= 400 {
            return Err(BridgeError::Status {
                status,
                body: truncate(&String::from_utf8_lossy(&body), 500).to_string(),
            });
        }

        Ok(Payload { body, headers })
    }

    pub async fn post_json(&self, body: &Value) -> Result<Bytes> {
        Ok(self.send(&Payload::json(body)?).await?.body)
    }
}

impl RequestTransport for HttpTransport {
    fn request(&self, request: Payload, completion: Completion) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            completion(self.send(&request).await);
        })
    }
}

impl JsonEndpoint for HttpTransport {
    fn post(&self, body: Value) -> BoxFuture<'_, Result<Bytes>> {
        Box::pin(async move { self.post_json(&body).await })
    }
}

/// An empty payload is "no response" (`null`), anything else must be JSON.
pub fn parse_payload(payload: &[u8]) -> Result<Value> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(payload).map_err(|e| {
        BridgeError::transport(format!(
            "Unparsable response body: {e}. Body: {}",
            truncate(&String::from_utf8_lossy(payload), 300)
        ))
    })
}

pub(crate) fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
