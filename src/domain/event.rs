use crate::error::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Payment channel the event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "qr-pct")]
    QrPct,
    #[serde(rename = "qr-tctd")]
    QrTctd,
    #[serde(rename = "link")]
    Link,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::QrPct => "qr-pct",
            Channel::QrTctd => "qr-tctd",
            Channel::Link => "link",
        }
    }
}

impl FromStr for Channel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qr-pct" => Ok(Channel::QrPct),
            "qr-tctd" => Ok(Channel::QrTctd),
            "link" => Ok(Channel::Link),
            other => Err(ValidationError::InvalidChannel(other.to_string())),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ars,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Ars => "ARS",
            Currency::Usd => "USD",
        }
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ARS" => Ok(Currency::Ars),
            "USD" => Ok(Currency::Usd),
            other => Err(ValidationError::InvalidCurrency(other.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment event that passed validation.
///
/// Fields are private: once built by the validator the event is never
/// mutated. Processing-stage metadata lives on the stored copies instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    event_id: String,
    channel: Channel,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    currency: Currency,
    customer_id: String,
    timestamp: String,
}

impl PaymentEvent {
    pub(crate) fn new(
        event_id: String,
        channel: Channel,
        amount: Decimal,
        currency: Currency,
        customer_id: String,
        timestamp: String,
    ) -> Self {
        Self {
            event_id,
            channel,
            amount,
            currency,
            customer_id,
            timestamp,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// The caller-supplied event time, kept exactly as received.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// Fine-grained processing path chosen for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    /// Hand off to the queue for a later invocation.
    Async,
    /// Process and persist right away.
    SyncDirect,
    /// Call the external processor first, then process and persist.
    SyncDelayed,
}

impl Route {
    pub fn flow_type(&self) -> FlowType {
        match self {
            Route::Async => FlowType::Async,
            Route::SyncDirect | Route::SyncDelayed => FlowType::Sync,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Route::Async => "async",
            Route::SyncDirect => "sync-direct",
            Route::SyncDelayed => "sync-delayed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    Sync,
    Async,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Completed,
}

/// Business fields added by the event processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    #[serde(with = "rust_decimal::serde::float")]
    pub processed_amount: Decimal,
    pub processed_currency: Currency,
    pub processing_status: ProcessingStatus,
    pub business_rules_applied: bool,
}

/// A payment event after business processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedEvent {
    #[serde(flatten)]
    pub event: PaymentEvent,
    #[serde(flatten)]
    pub outcome: ProcessingOutcome,
}

/// Transport-supplied context threaded through the pipeline.
///
/// Serialized in camelCase because it travels inside the queue envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeMeta {
    /// Identity of the executing instance.
    pub source: String,
    /// Transport-assigned correlation id.
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_handle: Option<String>,
    /// Metadata of the invocation that dispatched this message, on re-entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<Box<RuntimeMeta>>,
}

impl RuntimeMeta {
    pub fn new(source: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message_id: message_id.into(),
            ..Default::default()
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_receipt_handle(mut self, handle: impl Into<String>) -> Self {
        self.receipt_handle = Some(handle.into());
        self
    }

    pub fn with_upstream(mut self, upstream: RuntimeMeta) -> Self {
        self.upstream = Some(Box::new(upstream));
        self
    }
}

/// One inbound record as handed over by a transport adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub payload: Value,
    pub meta: RuntimeMeta,
}

impl RawRecord {
    pub fn new(payload: Value, meta: RuntimeMeta) -> Self {
        Self { payload, meta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sample_event() -> PaymentEvent {
        PaymentEvent::new(
            "evt_001".to_string(),
            Channel::QrPct,
            dec!(1500),
            Currency::Ars,
            "cust_001".to_string(),
            "2024-01-15T10:30:00.000Z".to_string(),
        )
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("qr-tctd".parse::<Channel>().unwrap(), Channel::QrTctd);
        assert_eq!(
            "card".parse::<Channel>(),
            Err(ValidationError::InvalidChannel("card".to_string()))
        );
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::Usd);
        assert!(matches!(
            "usd".parse::<Currency>(),
            Err(ValidationError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_event_serializes_amount_as_number() {
        let value = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(value["channel"], json!("qr-pct"));
        assert_eq!(value["currency"], json!("ARS"));
        assert_eq!(value["amount"].as_f64(), Some(1500.0));

        let back: PaymentEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, sample_event());
    }

    #[test]
    fn test_route_flow_type() {
        assert_eq!(Route::Async.flow_type(), FlowType::Async);
        assert_eq!(Route::SyncDirect.flow_type(), FlowType::Sync);
        assert_eq!(Route::SyncDelayed.flow_type(), FlowType::Sync);
        assert_eq!(Route::SyncDelayed.to_string(), "sync-delayed");
    }

    #[test]
    fn test_runtime_meta_camel_case() {
        let meta = RuntimeMeta::new("receiver", "msg-1").with_timestamp("2024-01-15T10:30:00Z");
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["messageId"], json!("msg-1"));
        assert!(value.get("receiptHandle").is_none());
        assert!(value.get("upstream").is_none());
    }
}
