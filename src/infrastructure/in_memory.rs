use crate::domain::envelope::QueueEnvelope;
use crate::domain::ports::{MessageDispatcher, RecordStore};
use crate::domain::record::StoredRecord;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// A thread-safe in-memory durable store.
///
/// Tables are kept apart; within a table records are keyed by id, so a
/// second `put` with the same id replaces the first. Clones share state.
#[derive(Default, Clone)]
pub struct InMemoryRecordStore {
    tables: Arc<RwLock<HashMap<String, BTreeMap<String, StoredRecord>>>>,
}

impl InMemoryRecordStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn put(&self, table: &str, record: StoredRecord) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .entry(table.to_string())
            .or_default()
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<StoredRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|records| records.get(id)).cloned())
    }

    async fn scan(&self, table: &str) -> Result<Vec<StoredRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }
}

/// A message sitting in the in-memory queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    pub message_id: String,
    pub destination: String,
    /// JSON-encoded [`QueueEnvelope`].
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub receipt_handle: String,
}

/// FIFO message queue living in process memory.
///
/// Published envelopes are serialized the same way a broker would carry
/// them, so draining the queue feeds the pull transport with realistic
/// message bodies. Clones share state.
#[derive(Default, Clone)]
pub struct InMemoryQueue {
    messages: Arc<Mutex<VecDeque<QueuedMessage>>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }

    /// Removes and returns every message published to `destination`, oldest first.
    pub async fn drain(&self, destination: &str) -> Vec<QueuedMessage> {
        let mut messages = self.messages.lock().await;
        let (taken, kept): (VecDeque<_>, VecDeque<_>) = messages
            .drain(..)
            .partition(|message| message.destination == destination);
        *messages = kept;
        taken.into()
    }
}

#[async_trait]
impl MessageDispatcher for InMemoryQueue {
    async fn publish(&self, destination: &str, message: &QueueEnvelope) -> Result<String> {
        let body = serde_json::to_string(message)?;
        let message_id = Uuid::new_v4().to_string();
        self.messages.lock().await.push_back(QueuedMessage {
            message_id: message_id.clone(),
            destination: destination.to_string(),
            body,
            sent_at: Utc::now(),
            receipt_handle: Uuid::new_v4().to_string(),
        });
        Ok(message_id)
    }
}
