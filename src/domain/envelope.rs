use super::event::{PaymentEvent, RuntimeMeta};
use serde::{Deserialize, Serialize};

/// Message body exchanged between the async dispatch and the queue re-entry.
///
/// Outbound messages carry a validated [`PaymentEvent`]; the pull transport
/// reads the payload back as untyped JSON and validates it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEnvelope<P = PaymentEvent> {
    #[serde(rename = "Payload")]
    pub payload: P,
    #[serde(rename = "Meta")]
    pub meta: RuntimeMeta,
}

impl<P> QueueEnvelope<P> {
    pub fn new(payload: P, meta: RuntimeMeta) -> Self {
        Self { payload, meta }
    }
}
