use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only projection of a provider flight record. Nothing is required;
/// fields the provider leaves out stay `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: Option<String>,
    pub airline: Option<String>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub duration: Option<FlightDuration>,
    pub price: Option<Price>,
}

/// Providers send either whole minutes or a display string such as "5h 30m".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FlightDuration {
    Minutes(i64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Price {
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    Incomplete,
    Complete,
}

/// Snapshot returned by a single poll round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResult {
    pub status: PollStatus,
    pub flights: Vec<FlightOffer>,
    /// Untouched provider payload; kept for callers, never sent to API clients.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl PollResult {
    pub fn is_complete(&self) -> bool {
        self.status == PollStatus::Complete
    }
}
