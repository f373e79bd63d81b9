use super::InvocationResponse;
use crate::application::coordinator::{BatchCoordinator, Entry};
use crate::domain::event::{RawRecord, RuntimeMeta};
use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Event source tag carried by push-notification records.
pub const PUSH_EVENT_SOURCE: &str = "aws:sns";

/// Invocation payload delivered by the push-notification channel.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "Records")]
    pub records: Vec<PushRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushRecord {
    #[serde(rename = "EventSource")]
    pub event_source: String,
    #[serde(rename = "Sns", default)]
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    /// JSON-encoded payment event.
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "MessageId")]
    pub message_id: String,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
}

/// Unwraps push notifications into raw records for the ingress pipeline.
pub struct PushAdapter {
    source: String,
}

impl PushAdapter {
    /// `source` identifies this receiver in the stored records.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Records from other event sources are skipped. A message that is not
    /// valid JSON is passed on as a JSON string, and a record without a
    /// notification body as `null`, so the validator rejects both.
    pub fn into_raw_records(&self, event: PushEvent) -> Vec<RawRecord> {
        event
            .records
            .into_iter()
            .filter_map(|record| {
                if record.event_source != PUSH_EVENT_SOURCE {
                    debug!(event_source = %record.event_source, "Skipping record from foreign source");
                    return None;
                }
                let Some(notification) = record.notification else {
                    warn!("Notification record has no body");
                    return Some(RawRecord::new(
                        Value::Null,
                        RuntimeMeta::new(self.source.clone(), String::new()),
                    ));
                };
                let payload = serde_json::from_str(&notification.message).unwrap_or_else(|err| {
                    warn!(message_id = %notification.message_id, error = %err, "Notification message is not JSON");
                    Value::String(notification.message.clone())
                });

                let mut meta = RuntimeMeta::new(self.source.clone(), notification.message_id);
                meta.timestamp = notification.timestamp;
                Some(RawRecord::new(payload, meta))
            })
            .collect()
    }

    pub async fn handle(
        &self,
        coordinator: &BatchCoordinator,
        event: PushEvent,
    ) -> Result<InvocationResponse> {
        let records = self.into_raw_records(event);
        let result = coordinator.handle_batch(Entry::Ingress, records).await?;
        InvocationResponse::ok(&result)
    }
}
