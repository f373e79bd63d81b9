use super::event::{PaymentEvent, ProcessedEvent, ProcessingOutcome, RuntimeMeta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expiration horizon for stored records (one year).
pub const RECORD_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Processing stage a stored record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Original,
    Processed,
    QueuedForProcessing,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Original => "original",
            EventType::Processed => "processed",
            EventType::QueuedForProcessing => "queued_for_processing",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage key for an event at a given stage.
pub fn record_key(event_id: &str, event_type: EventType) -> String {
    format!("{}_{}", event_id, event_type.as_str())
}

/// Durable-store projection of a payment event.
///
/// The key is `event_id + "_" + event_type`, so writing the same stage twice
/// replaces the earlier item. `ttl` is computed once, when the record is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    #[serde(flatten)]
    pub event: PaymentEvent,
    #[serde(flatten)]
    pub outcome: Option<ProcessingOutcome>,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_at: Option<DateTime<Utc>>,
    pub lambda_name: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_message_id: Option<String>,
    pub written_at: DateTime<Utc>,
    /// Expiration marker, epoch seconds.
    pub ttl: i64,
}

impl StoredRecord {
    fn build(
        event: PaymentEvent,
        outcome: Option<ProcessingOutcome>,
        event_type: EventType,
        meta: &RuntimeMeta,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: record_key(event.event_id(), event_type),
            event,
            outcome,
            event_type,
            received_at: None,
            processed_at: None,
            queued_at: None,
            lambda_name: meta.source.clone(),
            message_id: meta.message_id.clone(),
            upstream_message_id: meta.upstream.as_ref().map(|up| up.message_id.clone()),
            written_at: now,
            ttl: now.timestamp() + RECORD_TTL_SECS,
        }
    }

    /// The event exactly as it arrived.
    pub fn original(event: &PaymentEvent, meta: &RuntimeMeta, now: DateTime<Utc>) -> Self {
        let mut record = Self::build(event.clone(), None, EventType::Original, meta, now);
        record.received_at = Some(now);
        record
    }

    pub fn processed(processed: &ProcessedEvent, meta: &RuntimeMeta, now: DateTime<Utc>) -> Self {
        let mut record = Self::build(
            processed.event.clone(),
            Some(processed.outcome.clone()),
            EventType::Processed,
            meta,
            now,
        );
        record.processed_at = Some(now);
        record
    }

    /// The event as it re-entered through the queue.
    pub fn queued(event: &PaymentEvent, meta: &RuntimeMeta, now: DateTime<Utc>) -> Self {
        let mut record = Self::build(
            event.clone(),
            None,
            EventType::QueuedForProcessing,
            meta,
            now,
        );
        record.queued_at = Some(now);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::processor::process;
    use crate::application::validator::validate;
    use chrono::TimeZone;
    use serde_json::json;

    fn event() -> PaymentEvent {
        validate(&json!({
            "event_id": "evt_tctd_001",
            "channel": "qr-tctd",
            "amount": 2000,
            "currency": "USD",
            "customer_id": "cust_003",
            "timestamp": "2024-01-15T10:32:00.000Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_record_key() {
        assert_eq!(record_key("evt_1", EventType::Original), "evt_1_original");
        assert_eq!(
            record_key("evt_1", EventType::QueuedForProcessing),
            "evt_1_queued_for_processing"
        );
    }

    #[test]
    fn test_original_record_fields() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 32, 5).unwrap();
        let meta = RuntimeMeta::new("receiver", "msg-1");
        let record = StoredRecord::original(&event(), &meta, now);

        assert_eq!(record.id, "evt_tctd_001_original");
        assert_eq!(record.received_at, Some(now));
        assert_eq!(record.processed_at, None);
        assert_eq!(record.ttl, now.timestamp() + RECORD_TTL_SECS);
        assert_eq!(record.lambda_name, "receiver");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["event_type"], json!("original"));
        // The event's own timestamp is not overwritten by the write time.
        assert_eq!(value["timestamp"], json!("2024-01-15T10:32:00.000Z"));
        assert!(value.get("processed_amount").is_none());
    }

    #[test]
    fn test_processed_record_round_trips_through_json() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 32, 6).unwrap();
        let upstream = RuntimeMeta::new("receiver", "msg-1");
        let meta = RuntimeMeta::new("worker", "msg-2").with_upstream(upstream);
        let record = StoredRecord::processed(&process(&event()), &meta, now);

        assert_eq!(record.id, "evt_tctd_001_processed");
        assert_eq!(record.upstream_message_id.as_deref(), Some("msg-1"));

        let json = serde_json::to_string(&record).unwrap();
        let back: StoredRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
