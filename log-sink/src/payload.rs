//! Wire format for remote log lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::Result;

/// Severity of a remote log line.
///
/// Serialized lowercase (`"info"`, `"warn"`, `"error"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body posted by a client: `{ "message", "level", "context" }`.
///
/// `level` defaults to `info` and `context` to an empty object when absent,
/// matching what the collector accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPayload {
    pub message: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl LogPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: LogLevel::default(),
            context: Map::new(),
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Attach structured context.
    ///
    /// Objects are used as-is; `null` leaves the context empty; any other
    /// value is stored under a `"value"` key.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = match context {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

/// A payload as recorded by the collector, stamped on arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub context: Map<String, Value>,
}

impl LogRecord {
    pub fn from_payload(payload: LogPayload, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            level: payload.level,
            message: payload.message,
            context: payload.context,
        }
    }

    /// Drop the server-side timestamp.
    pub fn into_payload(self) -> LogPayload {
        LogPayload {
            message: self.message,
            level: self.level,
            context: self.context,
        }
    }
}
