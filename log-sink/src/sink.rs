//! Log sink implementations.

use serde_json::Value;
use url::Url;

use crate::error::{Result, SinkError};
use crate::payload::{LogLevel, LogPayload};

/// Path the collector listens on, relative to the application origin.
pub const DEFAULT_LOG_PATH: &str = "/api/log";

/// Fire-and-forget log destination.
///
/// Implementations must return immediately and must never surface delivery
/// failures to the caller.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str, level: LogLevel, context: Value);
}

/// Posts each log line as JSON to a remote collector.
///
/// `log` spawns the request on the current tokio runtime. Without a runtime
/// the line is dropped with a local warning.
#[derive(Debug, Clone)]
pub struct HttpLogSink {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpLogSink {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Build a sink posting to [`DEFAULT_LOG_PATH`] on `base_url`.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let endpoint = Url::parse(base_url)?.join(DEFAULT_LOG_PATH)?;
        Ok(Self::new(endpoint))
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post a single payload and wait for the collector's answer.
    pub async fn deliver(&self, payload: &LogPayload) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected(status.as_u16()));
        }

        Ok(())
    }
}

impl LogSink for HttpLogSink {
    fn log(&self, message: &str, level: LogLevel, context: Value) {
        let payload = LogPayload::new(message)
            .with_level(level)
            .with_context(context);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(message = %payload.message, "No async runtime, dropping remote log line");
            return;
        };

        let sink = self.clone();
        runtime.spawn(async move {
            if let Err(e) = sink.deliver(&payload).await {
                tracing::warn!(endpoint = %sink.endpoint, "{}", e);
            }
        });
    }
}

/// Writes log lines to local `tracing` output only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, message: &str, level: LogLevel, context: Value) {
        match level {
            LogLevel::Info => tracing::info!(%context, "{}", message),
            LogLevel::Warn => tracing::warn!(%context, "{}", message),
            LogLevel::Error => tracing::error!(%context, "{}", message),
        }
    }
}
