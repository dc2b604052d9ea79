//! Access-token lifecycle management.
//!
//! This module contains the TokenLifecycleManager which handles:
//! - Restoring a persisted credential at startup
//! - Scheduling a proactive renewal one renewal lead before expiry
//! - Collapsing proactive and reactive renewals into a single in-flight call
//! - Discarding all stored auth state when a renewal fails

use futures::future::{BoxFuture, FutureExt, Shared};
use log_sink::{LogLevel, LogSink};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::credential::{
    Credential, CredentialKind, ACCESS_TOKEN_KEY, AUTH_STORAGE_KEYS, PUBLIC_ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
use crate::error::RefreshError;
use crate::refresh::RefreshEndpoint;
use crate::store::CredentialStore;

type RenewalOutcome = Result<Credential, RefreshError>;
type PendingRenewal = Shared<BoxFuture<'static, RenewalOutcome>>;

const DEFAULT_RENEWAL_LEAD: Duration = Duration::from_secs(60);

/// Delay before a proactive renewal: `remaining - lead`, floored at zero.
pub(crate) fn renewal_delay(remaining: Duration, lead: Duration) -> Duration {
    remaining.saturating_sub(lead)
}

/// Owner of the session's access credential.
///
/// Cheap to clone; all clones share one credential, one proactive timer and
/// one single-flight renewal slot. Timers are spawned on the ambient tokio
/// runtime, so `initialize`, `install` and `force_renew` must be called from
/// within one.
///
/// # Renewal
///
/// - **Proactive**: armed by `initialize`, `install` and every successful
///   renewal, firing `renewal_lead` before expiry (immediately when already
///   inside that window).
/// - **Reactive**: [`force_renew`](Self::force_renew), used by the transport
///   when a request comes back `401`.
///
/// Both go through the same pending slot. The renewal itself runs on its own
/// task, so it completes even if every waiter is dropped.
#[derive(Clone)]
pub struct TokenLifecycleManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn CredentialStore>,
    endpoint: Arc<dyn RefreshEndpoint>,
    clock: Arc<dyn Clock>,
    sink: Option<Arc<dyn LogSink>>,
    renewal_lead: Duration,
    state: Mutex<ManagerState>,
}

#[derive(Default)]
struct ManagerState {
    active: Option<Credential>,
    pending: Option<PendingRenewal>,
    proactive: Option<ProactiveTimer>,
    next_timer_id: u64,
    torn_down: bool,
}

struct ProactiveTimer {
    id: u64,
    delay: Duration,
    handle: JoinHandle<()>,
}

/// Builder for [`TokenLifecycleManager`].
pub struct TokenLifecycleBuilder {
    store: Arc<dyn CredentialStore>,
    endpoint: Arc<dyn RefreshEndpoint>,
    clock: Arc<dyn Clock>,
    sink: Option<Arc<dyn LogSink>>,
    renewal_lead: Duration,
}

impl TokenLifecycleBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn renewal_lead(mut self, lead: Duration) -> Self {
        self.renewal_lead = lead;
        self
    }

    /// Take the renewal lead from `config`.
    pub fn config(mut self, config: &AuthConfig) -> Self {
        self.renewal_lead = config.renewal_lead;
        self
    }

    /// Remote sink that renewal failures are reported to, in addition to
    /// local `tracing` output.
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> TokenLifecycleManager {
        TokenLifecycleManager {
            inner: Arc::new(Inner {
                store: self.store,
                endpoint: self.endpoint,
                clock: self.clock,
                sink: self.sink,
                renewal_lead: self.renewal_lead,
                state: Mutex::new(ManagerState::default()),
            }),
        }
    }
}

impl TokenLifecycleManager {
    pub fn builder(
        store: Arc<dyn CredentialStore>,
        endpoint: Arc<dyn RefreshEndpoint>,
    ) -> TokenLifecycleBuilder {
        TokenLifecycleBuilder {
            store,
            endpoint,
            clock: Arc::new(SystemClock),
            sink: None,
            renewal_lead: DEFAULT_RENEWAL_LEAD,
        }
    }

    /// Restore the persisted credential, preferring the user token over the
    /// anonymous one.
    ///
    /// When an unexpired credential is found it becomes active. A proactive
    /// renewal is only scheduled for a user credential with a stored refresh
    /// token; an anonymous token is used as-is until it expires. When nothing
    /// is found `None` is returned and the caller obtains a token
    /// interactively and hands it to [`install`](Self::install).
    pub fn initialize(&self) -> Option<Credential> {
        let now_ms = self.inner.clock.now_ms();
        let restored = [
            (ACCESS_TOKEN_KEY, CredentialKind::User),
            (PUBLIC_ACCESS_TOKEN_KEY, CredentialKind::Anonymous),
        ]
        .into_iter()
        .find_map(|(key, kind)| {
            let stored = self.inner.store.get(key)?;
            let expires_at_ms = stored.expires_at_ms?;
            (expires_at_ms > now_ms).then(|| Credential::new(stored.value, expires_at_ms, kind))
        });

        let mut state = self.inner.state.lock();
        state.torn_down = false;

        let Some(credential) = restored else {
            tracing::debug!("No persisted credential to restore");
            state.active = None;
            return None;
        };

        tracing::info!(kind = ?credential.kind, "Restored persisted credential");
        state.active = Some(credential.clone());

        let renewable = credential.kind == CredentialKind::User
            && self.inner.store.get(REFRESH_TOKEN_KEY).is_some();
        if renewable {
            let delay = renewal_delay(credential.remaining(now_ms), self.inner.renewal_lead);
            self.inner.schedule_locked(&mut state, delay);
        } else {
            if let Some(timer) = state.proactive.take() {
                timer.handle.abort();
            }
            tracing::debug!(kind = ?credential.kind, "No refresh token, proactive renewal not scheduled");
        }

        Some(credential)
    }

    /// Adopt a credential obtained through the interactive authorization flow.
    ///
    /// Persists it, makes it active and (re)schedules proactive renewal.
    pub fn install(&self, access_token: impl Into<String>, expires_in: Duration) -> Credential {
        let mut state = self.inner.state.lock();
        state.torn_down = false;
        self.inner.adopt_locked(&mut state, access_token.into(), expires_in)
    }

    /// Renew the access token now, or join the renewal already in flight.
    ///
    /// Every caller that overlaps a renewal receives that renewal's outcome.
    /// On failure the credential is dropped and all auth storage keys are
    /// cleared; nothing is rescheduled.
    pub async fn force_renew(&self) -> Result<Credential, RefreshError> {
        let renewal = {
            let mut state = self.inner.state.lock();
            if let Some(pending) = state.pending.clone() {
                tracing::debug!("Joining in-flight token renewal");
                pending
            } else {
                let inner = Arc::clone(&self.inner);
                let task = tokio::spawn(inner.renew());
                let pending = async move {
                    task.await
                        .unwrap_or_else(|e| Err(RefreshError::Aborted(e.to_string())))
                }
                .boxed()
                .shared();
                state.pending = Some(pending.clone());
                pending
            }
        };

        renewal.await
    }

    /// The active access token, if any.
    pub fn current_token(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .active
            .as_ref()
            .map(|credential| credential.value.clone())
    }

    pub fn active_credential(&self) -> Option<Credential> {
        self.inner.state.lock().active.clone()
    }

    /// Delay the currently armed proactive renewal was scheduled with.
    pub fn pending_renewal_delay(&self) -> Option<Duration> {
        self.inner
            .state
            .lock()
            .proactive
            .as_ref()
            .map(|timer| timer.delay)
    }

    pub fn is_renewing(&self) -> bool {
        self.inner.state.lock().pending.is_some()
    }

    /// Cancel the proactive timer. An in-flight renewal still completes but
    /// does not arm a new timer. Idempotent.
    pub fn teardown(&self) {
        let mut state = self.inner.state.lock();
        state.torn_down = true;
        if let Some(timer) = state.proactive.take() {
            timer.handle.abort();
            tracing::debug!("Cancelled proactive token renewal");
        }
    }

    /// Tear down, forget the credential and clear every auth storage key.
    pub fn logout(&self) {
        self.teardown();
        self.inner.state.lock().active = None;
        self.inner.clear_storage();
        tracing::info!("Logged out, auth storage cleared");
    }
}

impl Inner {
    fn adopt_locked(
        self: &Arc<Self>,
        state: &mut ManagerState,
        access_token: String,
        expires_in: Duration,
    ) -> Credential {
        let expires_at_ms = self.clock.now_ms() + expires_in.as_millis() as i64;
        let credential = Credential::new(access_token, expires_at_ms, CredentialKind::User);

        self.store
            .set(ACCESS_TOKEN_KEY, credential.value.clone(), Some(expires_in));
        state.active = Some(credential.clone());
        self.schedule_locked(state, renewal_delay(expires_in, self.renewal_lead));

        credential
    }

    /// Replace the proactive timer. Never called with the state lock released
    /// between cancel and re-arm, so at most one timer exists.
    fn schedule_locked(self: &Arc<Self>, state: &mut ManagerState, delay: Duration) {
        if let Some(timer) = state.proactive.take() {
            timer.handle.abort();
        }

        if state.torn_down {
            tracing::debug!("Manager torn down, not scheduling renewal");
            return;
        }

        state.next_timer_id += 1;
        let id = state.next_timer_id;
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(Self::proactive_renewal(weak, id, delay));

        tracing::debug!(delay_ms = delay.as_millis() as u64, "Scheduled proactive token renewal");
        state.proactive = Some(ProactiveTimer { id, delay, handle });
    }

    async fn proactive_renewal(weak: Weak<Inner>, id: u64, delay: Duration) {
        tokio::time::sleep(delay).await;

        let Some(inner) = weak.upgrade() else {
            return;
        };

        {
            let mut state = inner.state.lock();
            let still_current = state.proactive.as_ref().is_some_and(|timer| timer.id == id);
            if !still_current {
                return;
            }
            // Release the slot so the renewal's reschedule does not abort us.
            state.proactive = None;
        }

        tracing::debug!("Proactive token renewal firing");
        let _ = TokenLifecycleManager { inner }.force_renew().await;
    }

    async fn renew(self: Arc<Self>) -> RenewalOutcome {
        tracing::info!("Renewing access token");
        let outcome = self.endpoint.refresh().await;

        let mut state = self.state.lock();
        state.pending = None;

        match outcome {
            Ok(response) => {
                let credential = self.adopt_locked(
                    &mut state,
                    response.access_token,
                    Duration::from_secs(response.expires_in),
                );
                tracing::info!("Access token renewed");
                Ok(credential)
            }
            Err(error) => {
                state.active = None;
                if let Some(timer) = state.proactive.take() {
                    timer.handle.abort();
                }
                drop(state);

                self.clear_storage();
                tracing::error!(%error, "Token renewal failed, stored credentials cleared");
                if let Some(sink) = &self.sink {
                    sink.log(
                        "Token renewal failed",
                        LogLevel::Error,
                        json!({ "error": error.to_string() }),
                    );
                }
                Err(error)
            }
        }
    }

    fn clear_storage(&self) {
        for key in AUTH_STORAGE_KEYS {
            self.store.remove(key);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().proactive.take() {
            timer.handle.abort();
        }
    }
}
