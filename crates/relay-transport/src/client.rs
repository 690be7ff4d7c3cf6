//! reqwest-backed [`Transport`] implementation.
//!
//! One client is shared by every call of the agent so the session cookie set
//! by the login page travels with all later API requests.

use crate::error::{TransportError, TransportResult};
use crate::payload::{Method, RawResponse, RequestPayload};
use crate::transport::Transport;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONNECTION};
use std::time::Duration;
use url::Url;

/// User agent sent when a request does not set its own.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_6_8; en-us) AppleWebKit/534.50 (KHTML, like Gecko) Version/5.1 Safari/534.50";

/// Debug level at which full requests and responses are dumped.
pub const DUMP_DEBUG_LEVEL: u8 = 4;

/// HTTP client with a cookie store, a per-request timeout and optional
/// request/response dumps.
#[derive(Clone, Debug)]
pub struct HttpClient {
    http_client: reqwest::Client,
    debug_level: u8,
}

impl HttpClient {
    /// Create a client with the given request timeout and debug level.
    pub fn new(timeout: Duration, debug_level: u8) -> TransportResult<Self> {
        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self {
            http_client,
            debug_level,
        })
    }

    fn dumps_enabled(&self) -> bool {
        self.debug_level >= DUMP_DEBUG_LEVEL
    }

    fn build_request(&self, url: &str, payload: &RequestPayload) -> TransportResult<reqwest::Request> {
        let url = Url::parse(url)
            .map_err(|e| TransportError::InvalidPayload(format!("invalid url {url:?}: {e}")))?;

        let method = match payload.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };
        let mut builder = self.http_client.request(method, url);

        if !payload.form.is_empty() {
            builder = match payload.method {
                Method::Get => builder.query(&payload.form),
                Method::Post => builder.form(&payload.form),
            };
        }
        for (name, value) in &payload.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = builder.header(
            CONNECTION,
            if payload.keep_alive { "keep-alive" } else { "close" },
        );
        if let Some((username, password)) = &payload.basic_auth {
            builder = builder.basic_auth(username, password.as_ref());
        }

        Ok(builder.build()?)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn request(&self, url: &str, payload: &RequestPayload) -> TransportResult<RawResponse> {
        let request = self.build_request(url, payload)?;

        if self.dumps_enabled() {
            let body = request
                .body()
                .and_then(|b| b.as_bytes())
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default();
            tracing::debug!(
                method = %request.method(),
                url = %request.url(),
                headers = %format_headers(request.headers()),
                body = %body,
                "HTTP request"
            );
        }

        let response = self.http_client.execute(request).await?;
        let status = response.status().as_u16();
        let headers = self.dumps_enabled().then(|| format_headers(response.headers()));
        let body = response.bytes().await?.to_vec();

        if let Some(headers) = headers {
            tracing::debug!(
                status,
                headers = %headers,
                body = %String::from_utf8_lossy(&body),
                "HTTP response"
            );
        }

        Ok(RawResponse { status, body })
    }
}

fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}: {}", value.to_str().unwrap_or("<binary>")))
        .collect::<Vec<_>>()
        .join("\r\n")
}
