//! Mock refresh endpoint and harness helpers shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use token_lifecycle::{
    ManualClock, MemoryCredentialStore, RefreshEndpoint, RefreshError, TokenLifecycleManager,
    TokenResponse,
};
use tokio::sync::Notify;

/// Epoch milliseconds the manual clock starts at.
pub const START_MS: i64 = 1_700_000_000_000;

/// Refresh endpoint that answers from a scripted queue.
///
/// Once the queue is empty every call succeeds with `renewed-<n>` valid for
/// one hour. With a gate installed, each call waits for one
/// `Notify::notify_one` before answering.
#[derive(Default)]
pub struct MockRefreshEndpoint {
    calls: AtomicU32,
    outcomes: Mutex<VecDeque<Result<TokenResponse, RefreshError>>>,
    gate: Option<Arc<Notify>>,
}

impl MockRefreshEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_outcome(&self, outcome: Result<TokenResponse, RefreshError>) {
        self.outcomes.lock().push_back(outcome);
    }

    pub fn fail_next(&self, error: RefreshError) {
        self.push_outcome(Err(error));
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn token(access_token: &str, expires_in: u64) -> TokenResponse {
    TokenResponse {
        access_token: access_token.to_string(),
        expires_in,
        refresh_token: None,
        token_type: Some("Bearer".to_string()),
        scope: None,
    }
}

#[async_trait]
impl RefreshEndpoint for MockRefreshEndpoint {
    async fn refresh(&self) -> Result<TokenResponse, RefreshError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let scripted = self.outcomes.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(token(&format!("renewed-{call}"), 3600)))
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryCredentialStore>,
    pub endpoint: Arc<MockRefreshEndpoint>,
    pub manager: TokenLifecycleManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_endpoint(MockRefreshEndpoint::new())
    }

    pub fn with_endpoint(endpoint: MockRefreshEndpoint) -> Self {
        let clock = Arc::new(ManualClock::new(START_MS));
        let store = Arc::new(MemoryCredentialStore::new(clock.clone()));
        let endpoint = Arc::new(endpoint);
        let manager = TokenLifecycleManager::builder(store.clone(), endpoint.clone())
            .clock(clock.clone())
            .build();

        Self {
            clock,
            store,
            endpoint,
            manager,
        }
    }

    /// Wait until the endpoint has been called `n` times.
    pub async fn wait_for_calls(&self, n: u32) {
        for _ in 0..1_000 {
            if self.endpoint.calls() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("endpoint reached {} calls, expected {}", self.endpoint.calls(), n);
    }
}

pub fn hours(n: u64) -> Duration {
    Duration::from_secs(n * 3600)
}
