//! # token-lifecycle
//!
//! Keeps a single access credential valid for the lifetime of a playback
//! session.
//!
//! - [`TokenLifecycleManager`] owns the active [`Credential`], renews it
//!   proactively one renewal lead (60 s by default) before expiry, and exposes
//!   [`TokenLifecycleManager::force_renew`] for reactive renewal. Both paths
//!   share one single-flight slot, so at most one refresh call is ever in
//!   flight and every waiter observes the same outcome.
//! - [`AuthenticatedTransport`] stamps the bearer token on outgoing requests
//!   and, on a `401`, forces one renewal and replays the request exactly once.
//! - [`CredentialStore`] is the persistence seam (browser-storage style
//!   key/value with per-key expiry); [`MemoryCredentialStore`] is the
//!   in-process implementation.
//!
//! A failed renewal is terminal: the manager forgets the credential, clears
//! every auth-related storage key and does not retry. Recovery requires a new
//! interactive login, which happens outside this crate; the resulting token is
//! handed back through [`TokenLifecycleManager::install`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use token_lifecycle::{
//!     AuthConfig, AuthenticatedTransport, HttpRefreshEndpoint, MemoryCredentialStore,
//!     SystemClock, TokenLifecycleManager,
//! };
//!
//! let config = AuthConfig::new("my-client-id");
//! let store = Arc::new(MemoryCredentialStore::new(Arc::new(SystemClock)));
//! let endpoint = Arc::new(HttpRefreshEndpoint::new(&config, store.clone())?);
//! let tokens = TokenLifecycleManager::builder(store, endpoint)
//!     .config(&config)
//!     .build();
//!
//! if tokens.initialize().is_none() {
//!     // run the interactive login, then:
//!     tokens.install("fresh-token", std::time::Duration::from_secs(3600));
//! }
//!
//! let transport = AuthenticatedTransport::new(&config, tokens.clone())?;
//! let me: serde_json::Value = transport.get_json("me").await?;
//! ```

mod clock;
mod config;
mod credential;
mod error;
mod manager;
mod refresh;
mod source;
mod store;
mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthConfig;
pub use credential::{
    Credential, CredentialKind, ACCESS_TOKEN_KEY, AUTH_STORAGE_KEYS, CODE_VERIFIER_KEY,
    PUBLIC_ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
pub use error::{AuthError, RefreshError, Result, TransportError};
pub use manager::{TokenLifecycleBuilder, TokenLifecycleManager};
pub use refresh::{HttpRefreshEndpoint, RefreshEndpoint, TokenResponse};
pub use source::TokenSource;
pub use store::{CredentialStore, MemoryCredentialStore, StoredValue};
pub use transport::AuthenticatedTransport;
