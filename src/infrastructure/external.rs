use crate::config::DEFAULT_EXTERNAL_LATENCY_MS;
use crate::domain::event::PaymentEvent;
use crate::domain::ports::ExternalProcessor;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Stand-in for the external system consulted on `link` payments.
///
/// It only waits for a fixed latency; swap it for a real client in production.
#[derive(Debug, Clone)]
pub struct SimulatedExternalCall {
    latency: Duration,
}

impl SimulatedExternalCall {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedExternalCall {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_EXTERNAL_LATENCY_MS))
    }
}

#[async_trait]
impl ExternalProcessor for SimulatedExternalCall {
    async fn invoke(&self, event: &PaymentEvent) -> Result<()> {
        info!(
            event_id = %event.event_id(),
            latency_ms = self.latency.as_millis() as u64,
            "Simulating external API call"
        );
        tokio::time::sleep(self.latency).await;
        Ok(())
    }
}
