use crate::domain::event::{PaymentEvent, ProcessedEvent, RuntimeMeta};
use crate::domain::ports::RecordStoreBox;
use crate::domain::record::StoredRecord;
use crate::error::Result;
use chrono::Utc;
use tracing::info;

/// Writes the audit trail of an event into the durable store.
///
/// Each stage is a separate upsert keyed by `event_id + "_" + event_type`.
/// Writing a stage twice replaces the stored item; processing side effects
/// are not deduplicated here.
pub struct PersistenceRecorder {
    store: RecordStoreBox,
    table: String,
}

impl PersistenceRecorder {
    /// Creates a recorder writing into `table` of the given store.
    pub fn new(store: RecordStoreBox, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Saves the event as received. Returns the storage key.
    pub async fn write_original(&self, event: &PaymentEvent, meta: &RuntimeMeta) -> Result<String> {
        self.put(StoredRecord::original(event, meta, Utc::now())).await
    }

    pub async fn write_processed(
        &self,
        processed: &ProcessedEvent,
        meta: &RuntimeMeta,
    ) -> Result<String> {
        self.put(StoredRecord::processed(processed, meta, Utc::now()))
            .await
    }

    /// Saves the event as it came back from the queue.
    pub async fn write_queued(&self, event: &PaymentEvent, meta: &RuntimeMeta) -> Result<String> {
        self.put(StoredRecord::queued(event, meta, Utc::now())).await
    }

    pub async fn fetch(&self, id: &str) -> Result<Option<StoredRecord>> {
        self.store.get(&self.table, id).await
    }

    pub async fn records(&self) -> Result<Vec<StoredRecord>> {
        self.store.scan(&self.table).await
    }

    async fn put(&self, record: StoredRecord) -> Result<String> {
        let id = record.id.clone();
        let event_type = record.event_type;
        self.store.put(&self.table, record).await?;
        info!(id = %id, event_type = %event_type, table = %self.table, "Item saved");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::processor::process;
    use crate::application::validator::validate;
    use crate::domain::ports::RecordStore;
    use crate::domain::record::EventType;
    use crate::infrastructure::in_memory::InMemoryRecordStore;
    use serde_json::json;

    fn event(event_id: &str) -> PaymentEvent {
        validate(&json!({
            "event_id": event_id,
            "channel": "qr-tctd",
            "amount": 2000,
            "currency": "USD",
            "customer_id": "cust_003",
            "timestamp": "2024-01-15T10:32:00.000Z"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_write_original_twice_keeps_one_item() {
        let store = InMemoryRecordStore::new();
        let recorder = PersistenceRecorder::new(Box::new(store.clone()), "payments");
        let meta = RuntimeMeta::new("receiver", "msg-1");

        let first = recorder.write_original(&event("evt_1"), &meta).await.unwrap();
        let redelivered = RuntimeMeta::new("receiver", "msg-2");
        let second = recorder
            .write_original(&event("evt_1"), &redelivered)
            .await
            .unwrap();

        assert_eq!(first, "evt_1_original");
        assert_eq!(first, second);

        let records = recorder.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message_id, "msg-2");
    }

    #[tokio::test]
    async fn test_original_and_processed_are_separate_items() {
        let store = InMemoryRecordStore::new();
        let recorder = PersistenceRecorder::new(Box::new(store.clone()), "payments");
        let meta = RuntimeMeta::new("receiver", "msg-1");
        let event = event("evt_2");

        recorder.write_original(&event, &meta).await.unwrap();
        recorder
            .write_processed(&process(&event), &meta)
            .await
            .unwrap();

        let original = recorder.fetch("evt_2_original").await.unwrap().unwrap();
        assert_eq!(original.event_type, EventType::Original);
        assert!(original.outcome.is_none());

        let processed = recorder.fetch("evt_2_processed").await.unwrap().unwrap();
        assert_eq!(processed.event_type, EventType::Processed);
        assert!(processed.outcome.is_some());
        assert!(processed.processed_at.is_some());

        // Tables are isolated.
        assert!(store.scan("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_queued() {
        let recorder = PersistenceRecorder::new(Box::new(InMemoryRecordStore::new()), "payments");
        let id = recorder
            .write_queued(&event("evt_3"), &RuntimeMeta::new("worker", "msg-9"))
            .await
            .unwrap();
        assert_eq!(id, "evt_3_queued_for_processing");

        let record = recorder.fetch(&id).await.unwrap().unwrap();
        assert!(record.queued_at.is_some());
        assert_eq!(record.lambda_name, "worker");
    }
}
