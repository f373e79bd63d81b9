use crate::domain::event::{Channel, Currency, PaymentEvent};
use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::{Map, Value};
use tracing::debug;

/// Fields every payment event must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "event_id",
    "channel",
    "amount",
    "currency",
    "customer_id",
    "timestamp",
];

/// Turns a raw JSON payload into a [`PaymentEvent`].
///
/// Checks run in a fixed order and the first failure is returned: field
/// presence, channel, currency, amount, then timestamp. A field counts as
/// missing when it is absent, `null` or an empty string.
pub fn validate(raw: &Value) -> Result<PaymentEvent, ValidationError> {
    let payload = raw.as_object().ok_or_else(|| {
        ValidationError::MalformedPayload(format!("expected a JSON object, got {}", kind(raw)))
    })?;

    if let Some(field) = REQUIRED_FIELDS
        .iter()
        .find(|field| is_missing(payload.get(**field)))
    {
        return Err(ValidationError::MissingField(field.to_string()));
    }

    let event_id = string_field(payload, "event_id")?;
    let customer_id = string_field(payload, "customer_id")?;

    let channel = match &payload["channel"] {
        Value::String(s) => s.parse::<Channel>()?,
        other => return Err(ValidationError::InvalidChannel(other.to_string())),
    };

    let currency = match &payload["currency"] {
        Value::String(s) => s.parse::<Currency>()?,
        other => return Err(ValidationError::InvalidCurrency(other.to_string())),
    };

    let amount = parse_amount(&payload["amount"])?;

    let timestamp = match &payload["timestamp"] {
        Value::String(s) if is_valid_instant(s) => s.clone(),
        Value::String(s) => return Err(ValidationError::InvalidTimestamp(s.clone())),
        other => return Err(ValidationError::InvalidTimestamp(other.to_string())),
    };

    debug!(event_id = %event_id, "Event validation passed");

    Ok(PaymentEvent::new(
        event_id,
        channel,
        amount,
        currency,
        customer_id,
        timestamp,
    ))
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn string_field(payload: &Map<String, Value>, field: &str) -> Result<String, ValidationError> {
    match &payload[field] {
        Value::String(s) => Ok(s.clone()),
        other => Err(ValidationError::MalformedPayload(format!(
            "{} must be a string, got {}",
            field,
            kind(other)
        ))),
    }
}

fn parse_amount(value: &Value) -> Result<Decimal, ValidationError> {
    let invalid = || ValidationError::InvalidAmount(value.to_string());

    let Value::Number(number) = value else {
        return Err(invalid());
    };

    let amount = if let Some(n) = number.as_i64() {
        Decimal::from(n)
    } else if let Some(n) = number.as_u64() {
        Decimal::from(n)
    } else {
        let n = number.as_f64().ok_or_else(invalid)?;
        if n < 0.0 {
            return Err(invalid());
        }
        // Money is carried as a 96-bit decimal; larger magnitudes cannot be echoed back.
        Decimal::from_f64(n)
            .ok_or_else(|| ValidationError::AmountOutOfRange(value.to_string()))?
    };

    if amount < Decimal::ZERO {
        return Err(invalid());
    }
    Ok(amount)
}

/// Accepts the date/time shapes producers are known to send.
fn is_valid_instant(raw: &str) -> bool {
    DateTime::parse_from_rfc3339(raw).is_ok()
        || DateTime::parse_from_rfc2822(raw).is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
