//! # playback-session
//!
//! Keeps one embedded playback engine connected, synchronized and advancing
//! past known filler segments.
//!
//! A [`SessionController`] drives a single engine instance through
//!
//! ```text
//! Uninitialized → WaitingForEngine → Connecting → WaitingForDevice → Active ⇄ Paused → Disconnected
//! ```
//!
//! Everything the engine reports (pushed state changes, polled state, the
//! `ready` device event, error events) is funneled into one task that owns
//! the [`SessionState`], so there is exactly one place where the session
//! mutates.
//!
//! ## Extended-timeout skips
//!
//! A [`TrackTimeoutCatalog`] maps track display names to an override: seek to
//! a start offset as soon as the track plays, then ask the engine for the next
//! track once a forced duration has elapsed. The catalog is loaded once when
//! the session starts; a failed load leaves it empty and the session carries
//! on without skips.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use playback_session::{HttpCatalogSource, SessionConfig, SessionController, SessionPhase};
//!
//! let handle = SessionController::new(engine_factory, Arc::new(tokens.clone()))
//!     .with_config(SessionConfig::new("Living Room Web Player"))
//!     .with_catalog_source(Arc::new(HttpCatalogSource::new(catalog_url)))
//!     .with_observer(ui_observer)
//!     .start()?;
//!
//! handle.wait_for_phase(|phase| phase == SessionPhase::Active).await?;
//! // ...
//! handle.shutdown().await?;
//! ```

pub mod catalog;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod observer;
pub mod remote;
pub mod skip;

pub use catalog::{
    load_catalog, parse_offset, CatalogSource, HttpCatalogSource, OverrideEntry,
    StaticCatalogSource, TrackTimeoutCatalog, TrackTimeoutOverride,
};
pub use config::SessionConfig;
pub use controller::{SessionController, SessionHandle};
pub use engine::{
    EngineErrorKind, EngineEvent, EngineEventSender, EngineFactory, PlaybackEngine, PlayerOptions,
};
pub use error::{CatalogError, EngineError, Result, SessionError};
pub use model::{
    Artist, DeviceId, PlaybackState, SessionPhase, SessionState, SessionUpdate, TrackId,
    TrackInfo, TrackWindow,
};
pub use observer::{NoopObserver, SessionObserver};
pub use remote::{PlaybackRemote, WebPlayerApi};
pub use skip::{SkipAction, TrackSkipScheduler};

// Re-export the token seam engines authenticate through
pub use token_lifecycle::TokenSource;
