//! Login handshake against the remote admin panel.

use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteApi;
use crate::state::SessionIdentifiers;
use regex::Regex;
use relay_transport::{coerce_id, Transport};
use std::sync::LazyLock;

const TOKEN_FIELD: &str = "__token__";

// The id attribute must start after whitespace and hold exactly `login-form`.
static LOGIN_FORM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<form\b(?:[^>]*\s)?id\s*=\s*(?:"login-form"|'login-form'|login-form)(?:[\s/][^>]*)?>(.*?)(?:</form>|\z)"#,
    )
    .expect("login form pattern is valid")
});

static INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b[^>]*>").expect("input pattern is valid"));

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute pattern is valid")
});

/// Credentials used for the login handshake.
#[derive(Clone)]
pub struct AuthSession {
    username: String,
    password: String,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AuthSession {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Fetch the login form token, post the credentials and extract the
    /// enterprise and user ids from the answer.
    ///
    /// The credential POST is only issued when a token was found.
    pub async fn login<T: Transport>(&self, remote: &RemoteApi<T>) -> SyncResult<SessionIdentifiers> {
        let page = remote.login_page().await?;
        let token = extract_login_token(&page).ok_or(SyncError::AuthTokenMissing)?;

        let envelope = remote.login(&token, &self.username, &self.password).await?;
        if !envelope.is_success() {
            return Err(SyncError::AuthIncomplete(
                envelope.failure_message().to_string(),
            ));
        }

        let data = envelope
            .data
            .as_object()
            .ok_or_else(|| SyncError::AuthIncomplete("login answer carries no data".to_string()))?;
        let user_id = data
            .get("id")
            .and_then(coerce_id)
            .ok_or_else(|| SyncError::AuthIncomplete("user id missing".to_string()))?;
        let enterprise_id = data
            .get("ecid")
            .and_then(coerce_id)
            .ok_or_else(|| SyncError::AuthIncomplete("enterprise id missing".to_string()))?;

        tracing::info!(
            username = %self.username,
            ecid = %enterprise_id,
            uid = %user_id,
            "logged in"
        );
        Ok(SessionIdentifiers::new(enterprise_id, user_id))
    }
}

/// Value of the `__token__` input inside the `login-form` form, if any.
pub fn extract_login_token(html: &str) -> Option<String> {
    let mut token = None;
    for form in LOGIN_FORM_RE.captures_iter(html) {
        let Some(body) = form.get(1) else { continue };
        for input in INPUT_RE.find_iter(body.as_str()) {
            let mut name = None;
            let mut value = None;
            for attribute in ATTRIBUTE_RE.captures_iter(input.as_str()) {
                let key = attribute.get(1).map(|m| m.as_str()).unwrap_or_default();
                let text = attribute
                    .get(2)
                    .or_else(|| attribute.get(3))
                    .or_else(|| attribute.get(4))
                    .map(|m| m.as_str());
                if key.eq_ignore_ascii_case("name") {
                    name = text;
                } else if key.eq_ignore_ascii_case("value") {
                    value = text;
                }
            }
            if name == Some(TOKEN_FIELD) {
                token = value.map(str::to_string);
            }
        }
    }

    token.filter(|t| !t.is_empty())
}
