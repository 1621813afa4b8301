//! Opaque credential carriers (§4.11). The core accepts these as values;
//! where they come from (environment, a config file) is not this crate's
//! concern.

/// Authorizes downloads. Sent as `username`/`token` query parameters.
#[derive(Clone)]
pub struct ServiceCredential {
    username: String,
    token: String,
}

impl ServiceCredential {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self { username: username.into(), token: token.into() }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredential").field("username", &self.username).field("token", &"<redacted>").finish()
    }
}

/// Authorizes uploads/edits. Sent as a bearer `Authorization` header.
#[derive(Clone)]
pub struct APICredential {
    key: String,
}

impl APICredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn bearer_header(&self) -> (String, String) {
        ("Authorization".to_string(), format!("Bearer {}", self.key))
    }
}

impl std::fmt::Debug for APICredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("APICredential").field("key", &"<redacted>").finish()
    }
}
