use super::InvocationResponse;
use crate::application::coordinator::{BatchCoordinator, Entry};
use crate::domain::event::{RawRecord, RuntimeMeta};
use crate::error::Result;
use crate::infrastructure::in_memory::QueuedMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Event source tag carried by queue deliveries.
pub const PULL_EVENT_SOURCE: &str = "aws:sqs";

/// Invocation payload delivered by the pull queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullEvent {
    #[serde(rename = "Records")]
    pub records: Vec<PullRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRecord {
    pub event_source: String,
    /// JSON-encoded [`QueueEnvelope`].
    pub body: String,
    pub message_id: String,
    #[serde(default)]
    pub receipt_handle: Option<String>,
    #[serde(default)]
    pub attributes: DeliveryAttributes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryAttributes {
    #[serde(rename = "SentTimestamp", default)]
    pub sent_timestamp: Option<String>,
}

impl PullEvent {
    /// Wraps messages drained from the in-memory queue as a delivery batch.
    pub fn from_queue(messages: Vec<QueuedMessage>) -> Self {
        let records = messages
            .into_iter()
            .map(|message| PullRecord {
                event_source: PULL_EVENT_SOURCE.to_string(),
                body: message.body,
                message_id: message.message_id,
                receipt_handle: Some(message.receipt_handle),
                attributes: DeliveryAttributes {
                    sent_timestamp: Some(message.sent_at.timestamp_millis().to_string()),
                },
            })
            .collect();
        Self { records }
    }
}

/// Decode-side view of a [`QueueEnvelope`]: only `Payload` is required.
///
/// [`QueueEnvelope`]: crate::domain::envelope::QueueEnvelope
#[derive(Debug, Deserialize)]
struct InboundEnvelope {
    #[serde(rename = "Payload")]
    payload: Value,
    #[serde(rename = "Meta", default)]
    meta: Option<Value>,
}

/// Unwraps queue deliveries into raw records for the continuation pipeline.
pub struct PullAdapter {
    source: String,
}

impl PullAdapter {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Extracts `Payload` as the raw event and carries `Meta` forward as the
    /// upstream metadata. A body that is not a well-formed envelope is passed
    /// on as a JSON string so the validator rejects it.
    pub fn into_raw_records(&self, event: PullEvent) -> Vec<RawRecord> {
        event
            .records
            .into_iter()
            .filter_map(|record| {
                if record.event_source != PULL_EVENT_SOURCE {
                    debug!(event_source = %record.event_source, "Skipping record from foreign source");
                    return None;
                }

                let mut meta = RuntimeMeta::new(self.source.clone(), record.message_id.clone());
                meta.timestamp = record.attributes.sent_timestamp;
                meta.receipt_handle = record.receipt_handle;

                let payload = match serde_json::from_str::<InboundEnvelope>(&record.body) {
                    Ok(envelope) => {
                        meta.upstream = envelope.meta.and_then(|upstream| {
                            serde_json::from_value::<RuntimeMeta>(upstream)
                                .inspect_err(|err| {
                                    debug!(message_id = %record.message_id, error = %err, "Ignoring unusable envelope Meta");
                                })
                                .ok()
                                .map(Box::new)
                        });
                        envelope.payload
                    }
                    Err(err) => {
                        warn!(message_id = %record.message_id, error = %err, "Queue message is not a valid envelope");
                        Value::String(record.body)
                    }
                };

                Some(RawRecord::new(payload, meta))
            })
            .collect()
    }

    pub async fn handle(
        &self,
        coordinator: &BatchCoordinator,
        event: PullEvent,
    ) -> Result<InvocationResponse> {
        let records = self.into_raw_records(event);
        let result = coordinator.handle_batch(Entry::Continuation, records).await?;
        InvocationResponse::ok(&result)
    }
}
