//! # log-sink
//!
//! Fire-and-forget delivery of client-side log lines to a remote collector.
//!
//! The crate has two halves:
//!
//! - [`LogPayload`] / [`LogRecord`]: the `{message, level, context}` JSON wire
//!   format posted by clients, and the timestamped record a collector derives
//!   from it.
//! - [`LogSink`]: the trait the rest of the workspace logs through, with
//!   [`HttpLogSink`] (POSTs payloads on a background task) and
//!   [`TracingLogSink`] (local `tracing` output only).
//!
//! Delivery failures never reach the caller. They are reported through
//! `tracing::warn!` so they show up on the local developer console and
//! nowhere else.
//!
//! # Example
//!
//! ```no_run
//! use log_sink::{HttpLogSink, LogLevel, LogSink};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), log_sink::SinkError> {
//!     let sink = HttpLogSink::with_base_url("http://localhost:3000")?;
//!     sink.log("player ready", LogLevel::Info, json!({ "device": "abc" }));
//!     Ok(())
//! }
//! ```

mod error;
mod payload;
mod sink;

pub use error::{Result, SinkError};
pub use payload::{LogLevel, LogPayload, LogRecord};
pub use sink::{HttpLogSink, LogSink, TracingLogSink, DEFAULT_LOG_PATH};
