//! Request and response values exchanged with a [`Transport`](crate::Transport).

use crate::error::{TransportError, TransportResult};
use serde::de::DeserializeOwned;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Everything needed to issue one request besides the URL.
///
/// Form fields are sent urlencoded: in the body for POST, appended to the
/// query string for GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPayload {
    pub method: Method,
    pub form: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub keep_alive: bool,
    pub basic_auth: Option<(String, Option<String>)>,
}

impl Default for RequestPayload {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestPayload {
    /// A plain GET without form fields.
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            form: Vec::new(),
            headers: Vec::new(),
            keep_alive: false,
            basic_auth: None,
        }
    }

    /// A keep-alive POST carrying `fields` as an urlencoded form.
    pub fn post_form<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            method: Method::Post,
            form: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            headers: Vec::new(),
            keep_alive: true,
            basic_auth: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.basic_auth = Some((username.into(), password));
        self
    }

    /// Value of the first form field named `name`.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Only 200 counts as success for the remote API.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Fail with [`TransportError::Status`] unless the status is 200.
    pub fn ensure_ok(&self) -> TransportResult<()> {
        if self.is_ok() {
            return Ok(());
        }
        let body_summary = summarize_response_body(&self.body);
        tracing::warn!(status = self.status, body_summary = %body_summary, "remote API error");
        Err(TransportError::Status {
            status: self.status,
            body_summary,
        })
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Decoder applied to a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Json,
}

impl Codec {
    pub fn decode<T: DeserializeOwned>(self, body: &[u8]) -> TransportResult<T> {
        match self {
            Codec::Json => Ok(serde_json::from_slice(body)?),
        }
    }
}

/// Length and digest of a body, safe to put in logs and errors.
pub(crate) fn summarize_response_body(body: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}
