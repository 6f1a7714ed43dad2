use crate::services::logger::Logger;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Progress message pushed to the client while a tool call runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub data: String,
}

impl Notification {
    pub fn info(data: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            data: data.into(),
        }
    }

    pub fn error(data: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            data: data.into(),
        }
    }
}

pub type SinkResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: Notification) -> SinkResult;
}

/// Sink that accepts and drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn send(&self, _notification: Notification) -> SinkResult {
        Ok(())
    }
}

/// Forwards notifications into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn send(&self, notification: Notification) -> SinkResult {
        self.tx
            .send(notification)
            .map_err(|_| "notification channel closed".into())
    }
}

/// Sends a notification and discards any failure.
pub async fn notify(sink: &dyn NotificationSink, logger: &Logger, notification: Notification) {
    if let Err(err) = sink.send(notification).await {
        logger.debug(
            "Notification dropped",
            Some(&serde_json::json!({ "error": err.to_string() })),
        );
    }
}
