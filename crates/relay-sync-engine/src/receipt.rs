//! Form parameters of the receipt endpoint.

use crate::filename::ReceiptName;
use crate::state::SessionIdentifiers;
use std::collections::BTreeMap;

/// Ordered string map describing one reported action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptParams(BTreeMap<String, String>);

impl ReceiptParams {
    fn with_session(session: &SessionIdentifiers, action: &str) -> Self {
        let mut params = Self::default();
        params.insert("ecid", &session.enterprise_id);
        params.insert("admin_id", &session.user_id);
        params.insert("action", action);
        params
    }

    /// Outbound receipt file converted to JSON.
    pub fn upload(
        session: &SessionIdentifiers,
        file_name: &str,
        content: String,
        name: &ReceiptName,
    ) -> Self {
        let mut params = Self::with_session(session, name.action());
        params.insert("file", file_name);
        params.0.insert("content".to_string(), content);
        match name {
            ReceiptName::Receipt { original_bn } => {
                params.insert("id", "0");
                params.insert("original_bn", original_bn);
            }
            ReceiptName::Status { id } => params.insert("id", id),
            ReceiptName::Other => {}
        }
        params
    }

    /// Successful download of command `id`.
    pub fn download_ok(session: &SessionIdentifiers, id: &str) -> Self {
        Self::download(session, id, "ok")
    }

    /// Terminal failure of command `id`.
    pub fn download_failed(session: &SessionIdentifiers, id: &str) -> Self {
        Self::download(session, id, "failed")
    }

    fn download(session: &SessionIdentifiers, id: &str, status: &str) -> Self {
        let mut params = Self::with_session(session, "download");
        params.insert("id", id);
        params.insert("status", status);
        params
    }

    fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
