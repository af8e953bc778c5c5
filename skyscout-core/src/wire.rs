use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyscout_shared::{FlightDuration, FlightOffer, PollResult, PollStatus, Price};

use crate::error::CallFailure;

// ============================================================================
// Provider create endpoint
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub session_token: String,
}

// ============================================================================
// Provider poll endpoint
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    Incomplete,
    Complete,
}

impl ProviderStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "RESULT_STATUS_COMPLETE" | "COMPLETE" => Some(ProviderStatus::Complete),
            "RESULT_STATUS_INCOMPLETE" | "INCOMPLETE" => Some(ProviderStatus::Incomplete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollResponse {
    pub status: ProviderStatus,
    pub flights: Vec<FlightOffer>,
    pub raw: Value,
}

impl PollResponse {
    /// Reads the status and, once complete, the flight records out of a raw
    /// poll payload. Every record is kept; unreadable fields become `None`.
    pub fn from_payload(raw: Value) -> Result<Self, CallFailure> {
        let status_text = raw
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| CallFailure::Decode("poll response has no 'status'".to_string()))?;
        let status = ProviderStatus::parse(status_text).ok_or_else(|| {
            CallFailure::Decode(format!("unknown poll status '{}'", status_text))
        })?;

        let flights = match status {
            ProviderStatus::Incomplete => Vec::new(),
            ProviderStatus::Complete => raw
                .get("flights")
                .and_then(Value::as_array)
                .map(|records| records.iter().map(flight_offer).collect())
                .unwrap_or_default(),
        };

        Ok(Self { status, flights, raw })
    }
}

impl From<PollResponse> for PollResult {
    fn from(response: PollResponse) -> Self {
        let status = match response.status {
            ProviderStatus::Complete => PollStatus::Complete,
            ProviderStatus::Incomplete => PollStatus::Incomplete,
        };
        PollResult {
            status,
            flights: response.flights,
            raw: response.raw,
        }
    }
}

// ============================================================================
// Flight record projection
// ============================================================================

fn flight_offer(record: &Value) -> FlightOffer {
    let id = match record.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };

    // The airline is either a bare name or an object carrying one.
    let airline = match record.get("airline") {
        Some(Value::String(name)) => Some(name.clone()),
        Some(Value::Object(fields)) => {
            fields.get("name").and_then(Value::as_str).map(str::to_string)
        }
        _ => None,
    };

    FlightOffer {
        id,
        airline,
        departure_time: record.get("departureTime").and_then(timestamp),
        arrival_time: record.get("arrivalTime").and_then(timestamp),
        duration: record.get("duration").and_then(duration),
        price: record.get("price").and_then(|value| price(value, record)),
    }
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn duration(value: &Value) -> Option<FlightDuration> {
    match value {
        Value::Number(minutes) => Some(match minutes.as_i64() {
            Some(whole) => FlightDuration::Minutes(whole),
            None => FlightDuration::Text(minutes.to_string()),
        }),
        Value::String(text) if !text.trim().is_empty() => Some(FlightDuration::Text(text.clone())),
        _ => None,
    }
}

/// A bare amount takes its currency from a sibling `currency` field, if any.
fn price(value: &Value, record: &Value) -> Option<Price> {
    let currency_of = |holder: &Value| {
        holder.get("currency").and_then(Value::as_str).map(str::to_string)
    };
    let amount = |value: &Value| match value {
        Value::Number(amount) => amount.as_f64(),
        Value::String(amount) => amount.trim().parse().ok(),
        _ => None,
    };

    match value {
        Value::Object(fields) => Some(Price {
            amount: fields.get("amount").and_then(amount)?,
            currency: currency_of(value),
        }),
        other => Some(Price {
            amount: amount(other)?,
            currency: currency_of(record),
        }),
    }
}
