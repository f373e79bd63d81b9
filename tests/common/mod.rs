#![allow(dead_code)]

use async_trait::async_trait;
use payment_events::application::coordinator::BatchCoordinator;
use payment_events::application::recorder::PersistenceRecorder;
use payment_events::config::PipelineConfig;
use payment_events::domain::envelope::QueueEnvelope;
use payment_events::domain::event::{PaymentEvent, RawRecord, RuntimeMeta};
use payment_events::domain::ports::{
    ExternalProcessor, ExternalProcessorBox, MessageDispatcher, RecordStore,
};
use payment_events::domain::record::StoredRecord;
use payment_events::error::{Collaborator, PipelineError, Result};
use payment_events::infrastructure::in_memory::{InMemoryQueue, InMemoryRecordStore};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TABLE: &str = "payment-events-test";
pub const RECEIVER: &str = "payment-events-processor-test-ReceiveMessage";

pub fn payload(event_id: &str, channel: &str, amount: f64, currency: &str) -> Value {
    json!({
        "event_id": event_id,
        "channel": channel,
        "amount": amount,
        "currency": currency,
        "customer_id": "cust_001",
        "timestamp": "2024-01-15T10:30:00.000Z"
    })
}

pub fn raw(payload: Value, message_id: &str) -> RawRecord {
    RawRecord::new(payload, RuntimeMeta::new(RECEIVER, message_id))
}

/// External processor that answers immediately.
#[derive(Default, Clone)]
pub struct InstantExternalCall {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ExternalProcessor for InstantExternalCall {
    async fn invoke(&self, _event: &PaymentEvent) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Store that fails every write to a given record id.
#[derive(Clone)]
pub struct FailingStore {
    pub inner: InMemoryRecordStore,
    pub fail_on: String,
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn put(&self, table: &str, record: StoredRecord) -> Result<()> {
        if record.id == self.fail_on {
            return Err(PipelineError::collaborator(
                Collaborator::Store,
                "provisioned throughput exceeded",
            ));
        }
        self.inner.put(table, record).await
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<StoredRecord>> {
        self.inner.get(table, id).await
    }

    async fn scan(&self, table: &str) -> Result<Vec<StoredRecord>> {
        self.inner.scan(table).await
    }
}

/// Dispatcher whose broker is unreachable.
pub struct UnreachableDispatcher;

#[async_trait]
impl MessageDispatcher for UnreachableDispatcher {
    async fn publish(&self, _destination: &str, _message: &QueueEnvelope) -> Result<String> {
        Err(PipelineError::collaborator(
            Collaborator::Dispatcher,
            "queue does not exist",
        ))
    }
}

/// A coordinator wired to in-memory collaborators, plus handles to inspect them.
pub struct Harness {
    pub coordinator: BatchCoordinator,
    pub store: InMemoryRecordStore,
    pub queue: InMemoryQueue,
    pub external: InstantExternalCall,
}

impl Harness {
    pub fn new(config: PipelineConfig) -> Self {
        let external = InstantExternalCall::default();
        Self::with_external(config, Box::new(external.clone()), external)
    }

    pub fn with_external(
        config: PipelineConfig,
        processor: ExternalProcessorBox,
        external: InstantExternalCall,
    ) -> Self {
        let store = InMemoryRecordStore::new();
        let queue = InMemoryQueue::new();
        let coordinator = BatchCoordinator::new(
            PersistenceRecorder::new(Box::new(store.clone()), TABLE),
            Box::new(queue.clone()),
            processor,
            config,
        );
        Self {
            coordinator,
            store,
            queue,
            external,
        }
    }

    pub async fn stored_ids(&self) -> Vec<String> {
        self.store
            .scan(TABLE)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect()
    }
}

pub fn config() -> PipelineConfig {
    PipelineConfig {
        table: TABLE.to_string(),
        ..PipelineConfig::default()
    }
}
