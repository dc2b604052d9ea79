//! The access credential and the storage keys it lives under.

use std::fmt;
use std::time::Duration;

/// User access token, stored with its expiry.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Long-lived refresh token used for renewals.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Anonymous (public) access token, used when no user is logged in.
pub const PUBLIC_ACCESS_TOKEN_KEY: &str = "public_access_token";
/// PKCE verifier kept between the authorization redirect and the code exchange.
pub const CODE_VERIFIER_KEY: &str = "code_verifier";

/// Every key removed when the session's auth state is discarded.
pub const AUTH_STORAGE_KEYS: [&str; 4] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    PUBLIC_ACCESS_TOKEN_KEY,
    CODE_VERIFIER_KEY,
];

/// Whether a credential belongs to a logged-in user or is an anonymous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    User,
    Anonymous,
}

impl CredentialKind {
    pub fn storage_key(&self) -> &'static str {
        match self {
            CredentialKind::User => ACCESS_TOKEN_KEY,
            CredentialKind::Anonymous => PUBLIC_ACCESS_TOKEN_KEY,
        }
    }
}

/// An access token and the instant it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub value: String,
    pub expires_at_ms: i64,
    pub kind: CredentialKind,
}

impl Credential {
    pub fn new(value: impl Into<String>, expires_at_ms: i64, kind: CredentialKind) -> Self {
        Self {
            value: value.into(),
            expires_at_ms,
            kind,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms <= now_ms
    }

    /// Time left before expiry, zero once expired
    pub fn remaining(&self, now_ms: i64) -> Duration {
        let left = self.expires_at_ms.saturating_sub(now_ms);
        Duration::from_millis(left.max(0) as u64)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"<redacted>")
            .field("expires_at_ms", &self.expires_at_ms)
            .field("kind", &self.kind)
            .finish()
    }
}
