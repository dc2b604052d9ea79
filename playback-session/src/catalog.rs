//! Track-timeout catalog: per-track start offsets and forced durations.
//!
//! Some tracks carry long silent intros or filler tails. The catalog lists
//! them by display name together with where playback should start and how
//! long it may run before the session asks the engine for the next track.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log_sink::{LogLevel, LogSink};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::CatalogError;

/// One catalog entry as served by the catalog source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    /// Track display name
    pub name: String,
    /// Start offset, `[[HH:]MM:]SS`
    pub start: String,
    /// Forced duration in seconds
    pub duration: f64,
}

impl OverrideEntry {
    pub fn new(name: impl Into<String>, start: impl Into<String>, duration: f64) -> Self {
        Self {
            name: name.into(),
            start: start.into(),
            duration,
        }
    }
}

/// A parsed catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTimeoutOverride {
    pub track_name: String,
    pub start_offset_ms: u64,
    pub forced_duration_ms: u64,
}

impl TrackTimeoutOverride {
    pub fn from_entry(entry: &OverrideEntry) -> Result<Self, CatalogError> {
        let start_offset_ms = parse_offset(&entry.start)?;

        if !entry.duration.is_finite() || entry.duration < 0.0 {
            return Err(CatalogError::InvalidDuration {
                track: entry.name.clone(),
                duration: entry.duration,
            });
        }

        Ok(Self {
            track_name: entry.name.clone(),
            start_offset_ms,
            forced_duration_ms: (entry.duration * 1000.0).round() as u64,
        })
    }

    pub fn forced_duration(&self) -> Duration {
        Duration::from_millis(self.forced_duration_ms)
    }
}

/// Parse a `[[HH:]MM:]SS[.fff]` offset into milliseconds.
///
/// Only the seconds field may carry a fraction.
pub fn parse_offset(text: &str) -> Result<u64, CatalogError> {
    let invalid = || CatalogError::InvalidOffset(text.to_string());

    let trimmed = text.trim();
    let parts: Vec<&str> = trimmed.split(':').collect();
    if trimmed.is_empty() || parts.len() > 3 {
        return Err(invalid());
    }

    let (seconds, larger_units) = parts.split_last().ok_or_else(invalid)?;

    let mut minutes: u64 = 0;
    for part in larger_units {
        let value: u64 = part.trim().parse().map_err(|_| invalid())?;
        minutes = minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(value))
            .ok_or_else(invalid)?;
    }

    let seconds = seconds.trim();
    if seconds.is_empty() || !seconds.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid());
    }
    let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
    let seconds_ms = (seconds * 1000.0).round() as u64;

    minutes
        .checked_mul(60_000)
        .and_then(|ms| ms.checked_add(seconds_ms))
        .ok_or_else(invalid)
}

/// Overrides keyed by track display name
#[derive(Debug, Clone, Default)]
pub struct TrackTimeoutCatalog {
    overrides: HashMap<String, TrackTimeoutOverride>,
}

impl TrackTimeoutCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw entries, skipping malformed ones. A later entry for
    /// the same name replaces an earlier one.
    pub fn from_entries(entries: &[OverrideEntry]) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            match TrackTimeoutOverride::from_entry(entry) {
                Ok(parsed) => catalog.insert(parsed),
                Err(e) => warn!(track = %entry.name, error = %e, "Skipping malformed catalog entry"),
            }
        }
        catalog
    }

    pub fn insert(&mut self, entry: TrackTimeoutOverride) {
        self.overrides.insert(entry.track_name.clone(), entry);
    }

    pub fn get(&self, track_name: &str) -> Option<&TrackTimeoutOverride> {
        self.overrides.get(track_name)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Where the catalog comes from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_overrides(&self) -> Result<Vec<OverrideEntry>, CatalogError>;
}

/// Fetches the catalog as a JSON array from a URL
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpCatalogSource {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_overrides(&self) -> Result<Vec<OverrideEntry>, CatalogError> {
        debug!(url = %self.url, "Fetching track timeout catalog");
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Rejected(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

/// A fixed list of entries
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    entries: Vec<OverrideEntry>,
}

impl StaticCatalogSource {
    pub fn new(entries: Vec<OverrideEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch_overrides(&self) -> Result<Vec<OverrideEntry>, CatalogError> {
        Ok(self.entries.clone())
    }
}

/// Load the catalog from `source`, falling back to an empty catalog when the
/// fetch fails.
pub async fn load_catalog(
    source: Option<&dyn CatalogSource>,
    sink: Option<&dyn LogSink>,
) -> TrackTimeoutCatalog {
    let Some(source) = source else {
        return TrackTimeoutCatalog::new();
    };

    match source.fetch_overrides().await {
        Ok(entries) => {
            let catalog = TrackTimeoutCatalog::from_entries(&entries);
            info!(
                entries = entries.len(),
                overrides = catalog.len(),
                "Loaded track timeout catalog"
            );
            catalog
        }
        Err(e) => {
            warn!(error = %e, "Failed to load track timeout data");
            if let Some(sink) = sink {
                sink.log(
                    "Failed to load track timeout data",
                    LogLevel::Warn,
                    json!({ "error": e.to_string() }),
                );
            }
            TrackTimeoutCatalog::new()
        }
    }
}
