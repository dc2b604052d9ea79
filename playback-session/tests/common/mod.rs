//! Mock engine, factory and observer shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use playback_session::{
    CatalogError, CatalogSource, DeviceId, EngineError, EngineEvent, EngineEventSender,
    EngineFactory, OverrideEntry, PlaybackEngine, PlaybackRemote, PlaybackState, PlayerOptions,
    SessionObserver, SessionUpdate, TokenSource, TrackInfo,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Engine whose reported state is set by the test
#[derive(Default)]
pub struct MockEngine {
    state: Mutex<Option<PlaybackState>>,
    seeks: Mutex<Vec<u64>>,
    next_tracks: AtomicU32,
    connects: AtomicU32,
    disconnects: AtomicU32,
    state_queries: AtomicU32,
    fail_commands: AtomicBool,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_state(&self, state: Option<PlaybackState>) {
        *self.state.lock() = state;
    }

    pub fn fail_commands(&self) {
        self.fail_commands.store(true, Ordering::SeqCst);
    }

    pub fn seeks(&self) -> Vec<u64> {
        self.seeks.lock().clone()
    }

    pub fn next_tracks(&self) -> u32 {
        self.next_tracks.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> u32 {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn state_queries(&self) -> u32 {
        self.state_queries.load(Ordering::SeqCst)
    }

    fn command_result(&self) -> Result<(), EngineError> {
        if self.fail_commands.load(Ordering::SeqCst) {
            Err(EngineError::Command("device unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PlaybackEngine for MockEngine {
    async fn connect(&self) -> Result<bool, EngineError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }

    async fn current_state(&self) -> Option<PlaybackState> {
        self.state_queries.fetch_add(1, Ordering::SeqCst);
        self.state.lock().clone()
    }

    async fn seek(&self, position_ms: u64) -> Result<(), EngineError> {
        self.seeks.lock().push(position_ms);
        self.command_result()
    }

    async fn next_track(&self) -> Result<(), EngineError> {
        self.next_tracks.fetch_add(1, Ordering::SeqCst);
        self.command_result()
    }
}

/// Factory handing out one shared [`MockEngine`]
pub struct MockEngineFactory {
    engine: Arc<MockEngine>,
    ready_tx: watch::Sender<bool>,
    events: Mutex<Option<EngineEventSender>>,
    options: Mutex<Option<PlayerOptions>>,
    creates: AtomicU32,
}

impl MockEngineFactory {
    pub fn new(engine: Arc<MockEngine>) -> Arc<Self> {
        Self::build(engine, true)
    }

    /// Factory whose runtime only becomes ready on [`signal_ready`](Self::signal_ready)
    pub fn not_ready(engine: Arc<MockEngine>) -> Arc<Self> {
        Self::build(engine, false)
    }

    fn build(engine: Arc<MockEngine>, ready: bool) -> Arc<Self> {
        let (ready_tx, _) = watch::channel(ready);
        Arc::new(Self {
            engine,
            ready_tx,
            events: Mutex::new(None),
            options: Mutex::new(None),
            creates: AtomicU32::new(0),
        })
    }

    pub fn signal_ready(&self) {
        self.ready_tx.send_replace(true);
    }

    /// Push an event as the engine would. Returns false before `create`.
    pub fn emit(&self, event: EngineEvent) -> bool {
        match self.events.lock().as_ref() {
            Some(events) => events.send(event).is_ok(),
            None => false,
        }
    }

    pub fn creates(&self) -> u32 {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> Option<PlayerOptions> {
        self.options.lock().clone()
    }
}

#[async_trait]
impl EngineFactory for MockEngineFactory {
    async fn wait_until_ready(&self) {
        let mut ready = self.ready_tx.subscribe();
        while !*ready.borrow_and_update() {
            if ready.changed().await.is_err() {
                return;
            }
        }
    }

    fn create(&self, options: PlayerOptions, events: EngineEventSender) -> Arc<dyn PlaybackEngine> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        *self.options.lock() = Some(options);
        *self.events.lock() = Some(events);
        self.engine.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Loading,
    WaitingForDevice(DeviceId),
    DeviceSelected,
    PlayerError(String),
    Update(SessionUpdate),
}

/// Observer that records every notification in order
#[derive(Default)]
pub struct RecordingObserver {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&Notification) -> bool) -> usize {
        self.notifications.lock().iter().filter(|n| matches(n)).count()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notifications
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::PlayerError(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

impl SessionObserver for RecordingObserver {
    fn on_loading(&self) {
        self.push(Notification::Loading);
    }

    fn on_waiting_for_device(&self, device_id: &DeviceId) {
        self.push(Notification::WaitingForDevice(device_id.clone()));
    }

    fn on_device_selected(&self) {
        self.push(Notification::DeviceSelected);
    }

    fn on_player_error(&self, message: &str) {
        self.push(Notification::PlayerError(message.to_string()));
    }

    fn on_update(&self, update: SessionUpdate) {
        self.push(Notification::Update(update));
    }
}

/// Remote that records transfers
#[derive(Default)]
pub struct MockRemote {
    transfers: Mutex<Vec<DeviceId>>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn transfers(&self) -> Vec<DeviceId> {
        self.transfers.lock().clone()
    }
}

#[async_trait]
impl PlaybackRemote for MockRemote {
    async fn transfer_playback(&self, device_id: &DeviceId) -> Result<(), EngineError> {
        self.transfers.lock().push(device_id.clone());
        Ok(())
    }
}

/// Catalog source that always fails
pub struct FailingCatalog;

#[async_trait]
impl CatalogSource for FailingCatalog {
    async fn fetch_overrides(&self) -> Result<Vec<OverrideEntry>, CatalogError> {
        Err(CatalogError::Rejected(503))
    }
}

pub struct StaticTokens;

#[async_trait]
impl TokenSource for StaticTokens {
    async fn access_token(&self) -> Option<String> {
        Some("token".to_string())
    }
}

pub fn playing(track_id: &str, name: &str) -> PlaybackState {
    PlaybackState::playing(TrackInfo::new(track_id, name))
}

pub fn paused(track_id: &str, name: &str) -> PlaybackState {
    playing(track_id, name).with_paused(true)
}
