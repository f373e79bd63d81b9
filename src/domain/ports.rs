use super::envelope::QueueEnvelope;
use super::event::PaymentEvent;
use super::record::StoredRecord;
use crate::error::Result;
use async_trait::async_trait;

/// Durable store holding the audit trail.
///
/// `put` must behave as an upsert keyed by `StoredRecord::id` within a table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put(&self, table: &str, record: StoredRecord) -> Result<()>;
    async fn get(&self, table: &str, id: &str) -> Result<Option<StoredRecord>>;
    /// All records of a table, ordered by id.
    async fn scan(&self, table: &str) -> Result<Vec<StoredRecord>>;
}

/// Message broker used to hand events off for a later invocation.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    /// Publishes the envelope and returns the broker-assigned message id.
    async fn publish(&self, destination: &str, message: &QueueEnvelope) -> Result<String>;
}

/// External system consulted before processing `link` payments.
#[async_trait]
pub trait ExternalProcessor: Send + Sync {
    async fn invoke(&self, event: &PaymentEvent) -> Result<()>;
}

pub type RecordStoreBox = Box<dyn RecordStore>;
pub type MessageDispatcherBox = Box<dyn MessageDispatcher>;
pub type ExternalProcessorBox = Box<dyn ExternalProcessor>;
