//! Endpoints of the remote command/data API.

use crate::error::{SyncError, SyncResult};
use crate::receipt::ReceiptParams;
use crate::state::SessionIdentifiers;
use relay_transport::{join_url, Codec, Envelope, RequestPayload, Transport};

pub const LOGIN_PATH: &str = "admin/index/login";
pub const COMMANDS_PATH: &str = "api/Chinaport/Commands";
pub const DOWNLOAD_PATH: &str = "api/Chinaport/Download";
pub const RECEIPT_PATH: &str = "api/Chinaport/Receipt";

/// Typed wrapper over a [`Transport`] for the agent's endpoints.
pub struct RemoteApi<T: Transport> {
    transport: T,
    base_url: String,
}

impl<T: Transport> RemoteApi<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// GET the HTML login page.
    pub async fn login_page(&self) -> SyncResult<String> {
        let url = self.endpoint(LOGIN_PATH);
        Ok(self
            .transport
            .fetch_document(&url, &RequestPayload::get())
            .await?)
    }

    /// POST the credentials together with the form token.
    pub async fn login(&self, token: &str, username: &str, password: &str) -> SyncResult<Envelope> {
        let payload = RequestPayload::post_form([
            ("__token__", token),
            ("username", username),
            ("password", password),
        ])
        .with_header("X-Requested-With", "XMLHttpRequest");
        self.post_envelope(LOGIN_PATH, payload).await
    }

    /// Pending commands for this enterprise and user.
    pub async fn commands(&self, session: &SessionIdentifiers) -> SyncResult<Envelope> {
        let payload = RequestPayload::post_form([
            ("ecid", session.enterprise_id.as_str()),
            ("admin_id", session.user_id.as_str()),
        ]);
        self.post_envelope(COMMANDS_PATH, payload).await
    }

    /// Document attached to command `id`.
    pub async fn download(&self, id: &str, session: &SessionIdentifiers) -> SyncResult<Envelope> {
        let payload = RequestPayload::post_form([
            ("id", id),
            ("ecid", session.enterprise_id.as_str()),
            ("admin_id", session.user_id.as_str()),
        ]);
        self.post_envelope(DOWNLOAD_PATH, payload).await
    }

    /// Report an action. A failure envelope becomes [`SyncError::Remote`].
    pub async fn receipt(&self, params: &ReceiptParams) -> SyncResult<()> {
        let payload = RequestPayload::post_form(params.iter());
        let envelope = self.post_envelope(RECEIPT_PATH, payload).await?;
        if envelope.is_success() {
            Ok(())
        } else {
            Err(SyncError::Remote(envelope.failure_message().to_string()))
        }
    }

    async fn post_envelope(&self, path: &str, payload: RequestPayload) -> SyncResult<Envelope> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "calling remote API");
        Ok(self
            .transport
            .fetch_decoded(&url, &payload, Codec::Json)
            .await?)
    }
}
