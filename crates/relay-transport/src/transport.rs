use crate::error::{TransportError, TransportResult};
use crate::payload::{Codec, RawResponse, RequestPayload};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Issues requests against the remote API.
///
/// Implementors only provide [`Transport::request`]; document and decoded
/// fetches are layered on top of it.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send one request and return its status and body, whatever the status.
    async fn request(&self, url: &str, payload: &RequestPayload) -> TransportResult<RawResponse>;

    /// Fetch an HTML/text document. Fails on a non-200 status or an empty body.
    async fn fetch_document(&self, url: &str, payload: &RequestPayload) -> TransportResult<String> {
        let response = self.request(url, payload).await?;
        response.ensure_ok()?;
        if response.body.is_empty() {
            return Err(TransportError::EmptyDocument {
                url: url.to_string(),
            });
        }
        Ok(response.text())
    }

    /// Fetch and decode a response body. Fails on a non-200 status or a
    /// body the codec rejects.
    async fn fetch_decoded<T>(
        &self,
        url: &str,
        payload: &RequestPayload,
        codec: Codec,
    ) -> TransportResult<T>
    where
        T: DeserializeOwned + Send,
    {
        let response = self.request(url, payload).await?;
        response.ensure_ok()?;
        codec.decode(&response.body)
    }
}

/// Join an endpoint path onto a base URL, with or without trailing slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
