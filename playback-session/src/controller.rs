//! Session controller
//!
//! [`SessionController`] collects what a session needs and
//! [`start`](SessionController::start)s it as one background task. The task
//! owns the engine, the session state and every timer (state poll,
//! device-selection wait, track skip), and multiplexes them with the engine's
//! event channel and the shutdown signal. Callers observe it through the
//! returned [`SessionHandle`] and the [`SessionObserver`].

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use log_sink::{LogLevel, LogSink};
use serde_json::json;
use token_lifecycle::TokenSource;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, sleep, timeout, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::catalog::{load_catalog, CatalogSource};
use crate::config::SessionConfig;
use crate::engine::{EngineEvent, EngineFactory, PlaybackEngine, PlayerOptions};
use crate::error::{Result, SessionError};
use crate::model::{DeviceId, PlaybackState, SessionPhase, SessionState, SessionUpdate};
use crate::observer::{NoopObserver, SessionObserver};
use crate::remote::PlaybackRemote;
use crate::skip::{SkipAction, TrackSkipScheduler};

/// Builds and starts a playback session
pub struct SessionController {
    factory: Arc<dyn EngineFactory>,
    tokens: Arc<dyn TokenSource>,
    config: SessionConfig,
    catalog_source: Option<Arc<dyn CatalogSource>>,
    observer: Arc<dyn SessionObserver>,
    remote: Option<Arc<dyn PlaybackRemote>>,
    sink: Option<Arc<dyn LogSink>>,
}

impl SessionController {
    /// Create a controller for engines built by `factory`, which fetch their
    /// access tokens from `tokens`
    pub fn new(factory: Arc<dyn EngineFactory>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            factory,
            tokens,
            config: SessionConfig::default(),
            catalog_source: None,
            observer: Arc::new(NoopObserver),
            remote: None,
            sink: None,
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Load extended-timeout overrides from `source` at startup
    pub fn with_catalog_source(mut self, source: Arc<dyn CatalogSource>) -> Self {
        self.catalog_source = Some(source);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Transfer playback to the engine's device whenever it becomes ready
    pub fn with_remote(mut self, remote: Arc<dyn PlaybackRemote>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validate the configuration and spawn the session task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> Result<SessionHandle> {
        self.config.validate()?;

        let id = Uuid::new_v4();
        let (phase_tx, phase_rx) = watch::channel(SessionPhase::Uninitialized);
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let span = info_span!("playback_session", session_id = %id);
        let task = tokio::spawn(self.run(phase_tx, state_tx, shutdown_rx).instrument(span));

        Ok(SessionHandle {
            id,
            phase: phase_rx,
            state: state_rx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    async fn run(
        self,
        phase_tx: watch::Sender<SessionPhase>,
        state_tx: watch::Sender<SessionState>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let SessionController {
            factory,
            tokens,
            config,
            catalog_source,
            observer,
            remote,
            sink,
        } = self;

        phase_tx.send_replace(SessionPhase::WaitingForEngine);
        info!(player = %config.player_name, "Waiting for playback engine");
        observer.on_loading();

        let startup = async {
            let (_, catalog) = tokio::join!(
                factory.wait_until_ready(),
                load_catalog(catalog_source.as_deref(), sink.as_deref())
            );
            catalog
        };
        let catalog = tokio::select! {
            catalog = startup => catalog,
            _ = shutdown_rx.recv() => {
                info!("Session stopped before the engine was ready");
                phase_tx.send_replace(SessionPhase::Disconnected);
                return;
            }
        };

        phase_tx.send_replace(SessionPhase::Connecting);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let engine = factory.create(
            PlayerOptions {
                name: config.player_name.clone(),
                initial_volume: config.initial_volume,
                enable_media_session: config.enable_media_session,
                tokens,
            },
            events_tx,
        );

        let mut driver = SessionDriver {
            engine,
            config,
            observer,
            remote,
            sink,
            skip: TrackSkipScheduler::new(catalog),
            state: SessionState::default(),
            phase_tx,
            state_tx,
            events: events_rx,
            events_open: true,
            poll: None,
            device_wait: None,
            skip_timer: None,
            device_confirmed: false,
        };

        driver.connect().await;
        driver.run(&mut shutdown_rx).await;
        driver.teardown().await;
    }
}

/// Handle to a running session
///
/// Dropping the handle stops the session as well; use
/// [`shutdown`](Self::shutdown) to wait for the engine to disconnect.
pub struct SessionHandle {
    id: Uuid,
    phase: watch::Receiver<SessionPhase>,
    state: watch::Receiver<SessionState>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Identifier attached to the session's log span
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every phase change, including `Disconnected`
    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait until the phase satisfies `predicate` and return it.
    ///
    /// Fails with [`SessionError::Closed`] if the session ends first.
    pub async fn wait_for_phase<F>(&self, predicate: F) -> Result<SessionPhase>
    where
        F: Fn(SessionPhase) -> bool,
    {
        let mut phase = self.phase.clone();
        loop {
            let current = *phase.borrow_and_update();
            if predicate(current) {
                return Ok(current);
            }
            if phase.changed().await.is_err() {
                return Err(SessionError::Closed);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stop the session and wait up to 5 seconds for it to tear down.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(()).await;
        }

        if let Some(task) = self.task.take() {
            match timeout(Duration::from_secs(5), task).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(SessionError::Shutdown(format!("Session task panicked: {e}"))),
                Err(_) => Err(SessionError::Shutdown(
                    "Session shutdown timed out after 5 seconds".to_string(),
                )),
            }
        } else {
            Ok(())
        }
    }
}

/// State owned by the running session task
struct SessionDriver {
    engine: Arc<dyn PlaybackEngine>,
    config: SessionConfig,
    observer: Arc<dyn SessionObserver>,
    remote: Option<Arc<dyn PlaybackRemote>>,
    sink: Option<Arc<dyn LogSink>>,
    skip: TrackSkipScheduler,
    state: SessionState,
    phase_tx: watch::Sender<SessionPhase>,
    state_tx: watch::Sender<SessionState>,
    events: mpsc::UnboundedReceiver<EngineEvent>,
    events_open: bool,
    poll: Option<Interval>,
    device_wait: Option<Interval>,
    skip_timer: Option<Pin<Box<Sleep>>>,
    device_confirmed: bool,
}

impl SessionDriver {
    async fn connect(&mut self) {
        if self.config.auto_connect {
            match self.engine.connect().await {
                Ok(true) => {
                    info!("Playback engine connected");
                    self.state.connected = true;
                    self.publish_state();
                }
                Ok(false) => {
                    warn!("Playback engine declined to connect");
                    self.report_error("Playback engine declined to connect");
                }
                Err(e) => {
                    warn!(error = %e, "Failed to connect playback engine");
                    self.report_error(&e.to_string());
                }
            }
        }
        self.set_phase(SessionPhase::WaitingForDevice);
    }

    async fn run(&mut self, shutdown_rx: &mut mpsc::Receiver<()>) {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                event = self.events.recv(), if self.events_open => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        warn!("Playback engine dropped its event channel");
                        self.events_open = false;
                    }
                },
                _ = next_tick(&mut self.device_wait) => self.check_device().await,
                _ = next_tick(&mut self.poll) => {
                    let state = self.engine.current_state().await;
                    self.handle_state(state).await;
                }
                _ = fire(&mut self.skip_timer) => self.skip_elapsed().await,
            }
        }
    }

    async fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready { device_id } => self.on_ready(device_id).await,
            EngineEvent::NotReady { device_id } => {
                info!(%device_id, "Playback device went offline");
            }
            EngineEvent::StateChanged(state) => self.handle_state(state).await,
            EngineEvent::Error { kind, message } => {
                warn!(%kind, %message, "Playback engine reported an error");
                if let Some(sink) = &self.sink {
                    sink.log(
                        "Playback engine error",
                        LogLevel::Error,
                        json!({ "kind": kind.as_str(), "message": &message }),
                    );
                }
                self.observer.on_player_error(&message);
            }
        }
    }

    async fn on_ready(&mut self, device_id: DeviceId) {
        info!(%device_id, "Playback engine ready");
        self.state.connected = true;
        self.state.device_id = Some(device_id.clone());
        self.state.is_active_device = true;
        self.publish_state();
        self.observer.on_update(SessionUpdate::DeviceId(device_id.clone()));
        self.observer.on_update(SessionUpdate::ActiveDevice(device_id.clone()));

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.transfer_playback(&device_id).await {
                warn!(%device_id, error = %e, "Failed to transfer playback");
                self.report_error(&e.to_string());
            }
        }

        self.observer.on_waiting_for_device(&device_id);
        if self.device_wait.is_none() && self.poll.is_none() {
            self.begin_device_wait();
        }
    }

    fn begin_device_wait(&mut self) {
        self.poll = None;
        let mut wait = interval(self.config.device_wait_interval);
        wait.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.device_wait = Some(wait);
        self.set_phase(SessionPhase::WaitingForDevice);
        debug!("Waiting for the device to be selected");
    }

    async fn check_device(&mut self) {
        let Some(state) = self.engine.current_state().await else {
            return;
        };

        self.device_wait = None;
        let period = self.config.poll_interval;
        let mut poll = interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.poll = Some(poll);
        info!(poll_interval = ?period, "Device selected, polling playback state");

        if !self.device_confirmed {
            self.device_confirmed = true;
            self.observer.on_device_selected();
        }

        self.handle_state(Some(state)).await;
    }

    /// Polled and pushed states both land here.
    async fn handle_state(&mut self, state: Option<PlaybackState>) {
        let Some(state) = state else {
            // before the first Ready there is no device to wait for
            if self.device_wait.is_none() && self.state.device_id.is_some() {
                info!("Playback state unavailable, waiting for the device again");
                self.begin_device_wait();
            }
            return;
        };

        self.observer.on_update(SessionUpdate::State(state.clone()));

        self.state.paused = state.paused;
        if let Some(track_id) = state.track_id() {
            self.state.current_track_id = Some(track_id.clone());
        }
        self.publish_state();

        if self.poll.is_some() {
            self.set_phase(if state.paused {
                SessionPhase::Paused
            } else {
                SessionPhase::Active
            });
        }

        let actions = self.skip.observe(&state, Instant::now());
        for action in actions {
            self.apply(action).await;
        }
    }

    async fn apply(&mut self, action: SkipAction) {
        match action {
            SkipAction::Cancel => self.skip_timer = None,
            SkipAction::Seek(position_ms) => {
                debug!(position_ms, "Seeking to track start offset");
                if let Err(e) = self.engine.seek(position_ms).await {
                    warn!(position_ms, error = %e, "Seek failed");
                    self.report_error(&e.to_string());
                }
            }
            SkipAction::Arm(after) => self.skip_timer = Some(Box::pin(sleep(after))),
        }
    }

    async fn skip_elapsed(&mut self) {
        self.skip_timer = None;
        self.skip.fired();
        info!("Extended timeout elapsed, skipping to next track");
        if let Err(e) = self.engine.next_track().await {
            warn!(error = %e, "Skip to next track failed");
            self.report_error(&e.to_string());
        }
    }

    async fn teardown(&mut self) {
        self.poll = None;
        self.device_wait = None;
        self.skip_timer = None;

        self.engine.disconnect().await;
        self.state.connected = false;
        self.state.is_active_device = false;
        self.publish_state();
        self.set_phase(SessionPhase::Disconnected);
        info!("Playback session disconnected");
    }

    fn report_error(&self, message: &str) {
        self.observer.on_player_error(message);
    }

    fn set_phase(&self, phase: SessionPhase) {
        let changed = self.phase_tx.send_if_modified(|current| {
            if *current == phase {
                false
            } else {
                *current = phase;
                true
            }
        });
        if changed {
            debug!(?phase, "Session phase changed");
        }
    }

    fn publish_state(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

async fn fire(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}
