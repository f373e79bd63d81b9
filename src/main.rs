use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use payment_events::application::coordinator::BatchCoordinator;
use payment_events::application::recorder::PersistenceRecorder;
use payment_events::config::{
    DEFAULT_CONTINUATION_SOURCE, DEFAULT_EXTERNAL_LATENCY_MS, DEFAULT_INGRESS_SOURCE, DEFAULT_QUEUE,
    DEFAULT_TABLE, FailurePolicy, PipelineConfig,
};
use payment_events::domain::ports::RecordStoreBox;
use payment_events::infrastructure::external::SimulatedExternalCall;
use payment_events::infrastructure::in_memory::{InMemoryQueue, InMemoryRecordStore};
use payment_events::interfaces::transport::InvocationResponse;
use payment_events::interfaces::transport::pull::{PullAdapter, PullEvent};
use payment_events::interfaces::transport::push::{PushAdapter, PushEvent};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Push notifications wrapping one payment event per message
    Push,
    /// Queue deliveries wrapping `{ Payload, Meta }` envelopes
    Pull,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Transport invocation payload (JSON file)
    input: PathBuf,

    /// Transport the input was delivered through
    #[arg(long, value_enum, default_value_t = Transport::Push)]
    transport: Transport,

    /// Durable store table for the audit trail
    #[arg(long, env = "DYNAMODB_TABLE", default_value = DEFAULT_TABLE)]
    table: String,

    /// Queue destination used by the async flow
    #[arg(long, env = "MESSAGE_QUEUE_URL", default_value = DEFAULT_QUEUE)]
    queue: String,

    /// Identity of the push receiver, recorded on every stored item
    #[arg(long, env = "FUNCTION_NAME", default_value = DEFAULT_INGRESS_SOURCE)]
    function_name: String,

    /// Identity of the queue worker
    #[arg(long, env = "QUEUE_FUNCTION_NAME", default_value = DEFAULT_CONTINUATION_SOURCE)]
    queue_function_name: String,

    /// What to do when a record fails
    #[arg(long, env = "FAILURE_POLICY", value_enum, default_value_t = FailurePolicy::FailFast)]
    failure_policy: FailurePolicy,

    /// Latency of the simulated external call on `link` payments
    #[arg(long, env = "EXTERNAL_LATENCY_MS", default_value_t = DEFAULT_EXTERNAL_LATENCY_MS)]
    external_latency_ms: u64,

    /// Overall time budget for one batch
    #[arg(long, env = "BATCH_DEADLINE_MS")]
    deadline_ms: Option<u64>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "DB_PATH")]
    db_path: Option<PathBuf>,

    /// After the batch, deliver queued messages back through the pull transport
    #[arg(long)]
    drain_queue: bool,
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<PathBuf>) -> Result<RecordStoreBox> {
    use payment_events::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => Ok(Box::new(RocksDBStore::open(path).into_diagnostic()?)),
        None => Ok(Box::new(InMemoryRecordStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<PathBuf>) -> Result<RecordStoreBox> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Box::new(InMemoryRecordStore::new()))
}

fn print_response(response: &InvocationResponse) -> Result<()> {
    println!("{}", serde_json::to_string(response).into_diagnostic()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = PipelineConfig {
        table: cli.table,
        queue_destination: cli.queue,
        ..PipelineConfig::default()
    }
    .with_failure_policy(cli.failure_policy);
    if let Some(ms) = cli.deadline_ms {
        config = config.with_deadline(Duration::from_millis(ms));
    }

    let store = open_store(cli.db_path)?;
    let queue = InMemoryQueue::new();
    let external = SimulatedExternalCall::new(Duration::from_millis(cli.external_latency_ms));
    let queue_destination = config.queue_destination.clone();

    let coordinator = BatchCoordinator::new(
        PersistenceRecorder::new(store, config.table.clone()),
        Box::new(queue.clone()),
        Box::new(external),
        config,
    );

    let reader = BufReader::new(File::open(&cli.input).into_diagnostic()?);
    let response = match cli.transport {
        Transport::Push => {
            let event: PushEvent = serde_json::from_reader(reader).into_diagnostic()?;
            PushAdapter::new(cli.function_name)
                .handle(&coordinator, event)
                .await
                .into_diagnostic()?
        }
        Transport::Pull => {
            let event: PullEvent = serde_json::from_reader(reader).into_diagnostic()?;
            PullAdapter::new(cli.queue_function_name.clone())
                .handle(&coordinator, event)
                .await
                .into_diagnostic()?
        }
    };
    print_response(&response)?;

    if cli.drain_queue {
        let messages = queue.drain(&queue_destination).await;
        info!(messages = messages.len(), "Delivering queued messages");
        if !messages.is_empty() {
            let response = PullAdapter::new(cli.queue_function_name)
                .handle(&coordinator, PullEvent::from_queue(messages))
                .await
                .into_diagnostic()?;
            print_response(&response)?;
        }
    }

    Ok(())
}
