mod common;

use common::{TABLE, payload};
use payment_events::application::validator::validate;
use payment_events::domain::envelope::QueueEnvelope;
use payment_events::domain::event::RuntimeMeta;
use payment_events::domain::ports::{ExternalProcessorBox, MessageDispatcherBox, RecordStoreBox};
use payment_events::domain::record::StoredRecord;
use payment_events::infrastructure::external::SimulatedExternalCall;
use payment_events::infrastructure::in_memory::{InMemoryQueue, InMemoryRecordStore};
use std::time::Duration;

#[tokio::test]
async fn test_ports_as_trait_objects() {
    let store: RecordStoreBox = Box::new(InMemoryRecordStore::new());
    let queue = InMemoryQueue::new();
    let dispatcher: MessageDispatcherBox = Box::new(queue.clone());
    let external: ExternalProcessorBox =
        Box::new(SimulatedExternalCall::new(Duration::from_millis(0)));

    let event = validate(&payload("evt_1", "link", 10.0, "USD")).unwrap();
    let meta = RuntimeMeta::new(common::RECEIVER, "msg-1");

    // Verify Send + Sync by spawning tasks
    let record = StoredRecord::original(&event, &meta, chrono::Utc::now());
    let store_handle = tokio::spawn(async move {
        store.put(TABLE, record).await.unwrap();
        store.get(TABLE, "evt_1_original").await.unwrap().unwrap()
    });

    let envelope = QueueEnvelope::new(event.clone(), meta);
    let dispatch_handle =
        tokio::spawn(async move { dispatcher.publish("q", &envelope).await.unwrap() });

    let external_handle = tokio::spawn(async move { external.invoke(&event).await });

    assert_eq!(store_handle.await.unwrap().id, "evt_1_original");
    let message_id = dispatch_handle.await.unwrap();
    assert_eq!(queue.drain("q").await[0].message_id, message_id);
    assert!(external_handle.await.unwrap().is_ok());
}
