use crate::application::processor::process;
use crate::application::recorder::PersistenceRecorder;
use crate::application::routing::select_flow;
use crate::application::validator::validate;
use crate::config::{FailurePolicy, PipelineConfig};
use crate::domain::envelope::QueueEnvelope;
use crate::domain::event::{FlowType, PaymentEvent, RawRecord, Route, RuntimeMeta};
use crate::domain::ports::{ExternalProcessorBox, MessageDispatcherBox};
use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// How a batch entered the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// First delivery through the push transport.
    Ingress,
    /// Deferred continuation of an async dispatch, delivered by the queue.
    Continuation,
}

impl Entry {
    fn success_message(&self) -> &'static str {
        match self {
            Entry::Ingress => "Events processed successfully",
            Entry::Continuation => "Queued messages processed successfully",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Processed,
    Failed,
}

/// Outcome of a record that went through its whole flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordResult {
    #[serde(flatten)]
    pub event: PaymentEvent,
    pub processed_at: DateTime<Utc>,
    pub flow_type: FlowType,
    pub route: Route,
    pub lambda_name: String,
    pub processing_time_ms: u64,
    pub status: RecordStatus,
    pub message_id: String,
    /// Queue message id, when the event was dispatched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_id: Option<String>,
}

/// A record that failed under the best-effort policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordFailure {
    /// Position of the record in the batch.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub message_id: String,
    pub status: RecordStatus,
    pub error: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordOutcome {
    Processed(RecordResult),
    Failed(RecordFailure),
}

impl RecordOutcome {
    pub fn as_processed(&self) -> Option<&RecordResult> {
        match self {
            RecordOutcome::Processed(result) => Some(result),
            RecordOutcome::Failed(_) => None,
        }
    }

    pub fn as_failed(&self) -> Option<&RecordFailure> {
        match self {
            RecordOutcome::Failed(failure) => Some(failure),
            RecordOutcome::Processed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub message: String,
    pub processed_count: usize,
    pub failed_count: usize,
    /// Wall time for the whole batch, in milliseconds.
    pub processing_time: u64,
    pub results: Vec<RecordOutcome>,
}

/// Drives a batch of raw records through validation, persistence, routing
/// and processing.
///
/// Records are handled one at a time, in order; each record finishes all of
/// its I/O before the next one starts.
pub struct BatchCoordinator {
    recorder: PersistenceRecorder,
    dispatcher: MessageDispatcherBox,
    external: ExternalProcessorBox,
    config: PipelineConfig,
}

impl BatchCoordinator {
    pub fn new(
        recorder: PersistenceRecorder,
        dispatcher: MessageDispatcherBox,
        external: ExternalProcessorBox,
        config: PipelineConfig,
    ) -> Self {
        Self {
            recorder,
            dispatcher,
            external,
            config,
        }
    }

    /// Processes every record of the batch.
    ///
    /// Under [`FailurePolicy::FailFast`] the first failing record aborts the
    /// batch and its error is returned; records already written stay written.
    /// Under [`FailurePolicy::BestEffort`] failures are collected in the
    /// result instead. Running past the configured deadline aborts the batch
    /// under either policy.
    pub async fn handle_batch(&self, entry: Entry, records: Vec<RawRecord>) -> Result<BatchResult> {
        let started = Instant::now();
        let total = records.len();
        let mut results = Vec::with_capacity(total);

        info!(records = total, entry = ?entry, "Processing batch");

        match self.config.deadline {
            Some(limit) => {
                let run = self.run_records(entry, records, &mut results);
                let outcome = tokio::time::timeout(limit, run).await;
                match outcome {
                    Ok(run_result) => run_result?,
                    Err(_) => {
                        let err = PipelineError::DeadlineExceeded {
                            limit_ms: limit.as_millis() as u64,
                            completed: results.len(),
                        };
                        error!(error = %err, "Batch interrupted");
                        return Err(err);
                    }
                }
            }
            None => self.run_records(entry, records, &mut results).await?,
        }

        let processing_time = started.elapsed().as_millis() as u64;
        let failed_count = results.iter().filter(|r| r.as_failed().is_some()).count();
        let processed_count = results.len() - failed_count;

        info!(
            processed = processed_count,
            failed = failed_count,
            processing_time_ms = processing_time,
            "Batch completed"
        );

        let message = if failed_count == 0 {
            entry.success_message().to_string()
        } else {
            format!(
                "{} ({} of {} records failed)",
                entry.success_message(),
                failed_count,
                total
            )
        };

        Ok(BatchResult {
            message,
            processed_count,
            failed_count,
            processing_time,
            results,
        })
    }

    async fn run_records(
        &self,
        entry: Entry,
        records: Vec<RawRecord>,
        results: &mut Vec<RecordOutcome>,
    ) -> Result<()> {
        for (index, record) in records.into_iter().enumerate() {
            match self.handle_record(entry, &record).await {
                Ok(result) => {
                    debug!(event_id = %result.event.event_id(), "Message processed successfully");
                    results.push(RecordOutcome::Processed(result));
                }
                Err(err) => match self.config.failure_policy {
                    FailurePolicy::FailFast => {
                        error!(index, message_id = %record.meta.message_id, error = %err, "Error processing record");
                        return Err(err);
                    }
                    FailurePolicy::BestEffort => {
                        warn!(index, message_id = %record.meta.message_id, error = %err, "Record failed, continuing");
                        results.push(RecordOutcome::Failed(RecordFailure {
                            index,
                            event_id: record
                                .payload
                                .get("event_id")
                                .and_then(|v| v.as_str())
                                .map(str::to_string),
                            message_id: record.meta.message_id.clone(),
                            status: RecordStatus::Failed,
                            error: err.to_string(),
                            retryable: err.is_retryable(),
                        }));
                    }
                },
            }
        }
        Ok(())
    }

    async fn handle_record(&self, entry: Entry, record: &RawRecord) -> Result<RecordResult> {
        let event = validate(&record.payload)?;
        let started = Instant::now();
        let meta = &record.meta;

        info!(event_id = %event.event_id(), channel = %event.channel(), "Processing payment event");

        match entry {
            Entry::Ingress => self.recorder.write_original(&event, meta).await?,
            Entry::Continuation => self.recorder.write_queued(&event, meta).await?,
        };

        let route = select_flow(&event);
        info!(event_id = %event.event_id(), route = %route, "Route selected");

        let dispatch_id = match (entry, route) {
            (Entry::Ingress, Route::Async) => Some(self.dispatch(&event, meta).await?),
            (_, Route::SyncDelayed) => {
                self.external.invoke(&event).await?;
                self.process_and_record(&event, meta).await?;
                None
            }
            // A continuation never dispatches again.
            _ => {
                self.process_and_record(&event, meta).await?;
                None
            }
        };

        Ok(RecordResult {
            processed_at: Utc::now(),
            flow_type: route.flow_type(),
            route,
            lambda_name: meta.source.clone(),
            processing_time_ms: started.elapsed().as_millis() as u64,
            status: RecordStatus::Processed,
            message_id: meta.message_id.clone(),
            dispatch_id,
            event,
        })
    }

    async fn dispatch(&self, event: &PaymentEvent, meta: &RuntimeMeta) -> Result<String> {
        let envelope = QueueEnvelope::new(event.clone(), meta.clone());
        let id = self
            .dispatcher
            .publish(&self.config.queue_destination, &envelope)
            .await?;
        info!(event_id = %event.event_id(), dispatch_id = %id, "Message sent to queue");
        Ok(id)
    }

    async fn process_and_record(&self, event: &PaymentEvent, meta: &RuntimeMeta) -> Result<()> {
        let processed = process(event);
        self.recorder.write_processed(&processed, meta).await?;
        Ok(())
    }
}
