use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Markets the provider account is enabled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Market {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "ZA")]
    Za,
}

impl Market {
    pub const ALLOWED: [Market; 2] = [Market::Us, Market::Za];

    pub fn code(&self) -> &'static str {
        match self {
            Market::Us => "US",
            Market::Za => "ZA",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALLOWED.into_iter().find(|m| m.code() == code)
    }
}

/// User-supplied search criteria, exactly as received.
///
/// Every field is optional at this level: a value of the wrong JSON type is
/// kept as `None` so the validator can report it together with every other
/// problem instead of failing deserialization on the first one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(
        default,
        rename = "queryLegs",
        alias = "legs",
        deserialize_with = "lenient_legs",
        skip_serializing_if = "Option::is_none"
    )]
    pub legs: Option<Vec<QueryLeg>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub adults: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryLeg {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl QueryLeg {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            destination: Some(destination.into()),
        }
    }
}

impl SearchQuery {
    pub fn new(locale: impl Into<String>, currency: impl Into<String>, adults: i64) -> Self {
        Self {
            market: None,
            locale: Some(locale.into()),
            currency: Some(currency.into()),
            legs: None,
            adults: Some(adults),
        }
    }

    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    pub fn with_leg(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.legs
            .get_or_insert_with(Vec::new)
            .push(QueryLeg::new(origin, destination));
        self
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// A non-list value becomes an empty list so the validator flags it.
fn lenient_legs<'de, D>(deserializer: D) -> Result<Option<Vec<QueryLeg>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let legs = match value {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    };
    Ok(Some(legs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_deserialization() {
        let json = r#"
            {
                "market": "US",
                "locale": "en-US",
                "currency": "USD",
                "queryLegs": [{ "origin": "JFK", "destination": "LAX" }],
                "adults": 2
            }
        "#;
        let query: SearchQuery = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(query.market.as_deref(), Some("US"));
        assert_eq!(query.adults, Some(2));
        assert_eq!(query.legs.unwrap(), vec![QueryLeg::new("JFK", "LAX")]);
    }

    #[test]
    fn test_legs_alias_is_accepted() {
        let json = r#"{ "legs": [{ "origin": "JFK", "destination": "LAX" }] }"#;
        let query: SearchQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.legs.map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_wrong_types_become_none() {
        let json = r#"
            {
                "locale": 5,
                "currency": ["USD"],
                "adults": "two",
                "queryLegs": [{ "origin": 1, "destination": "LAX" }, "garbage"]
            }
        "#;
        let query: SearchQuery = serde_json::from_str(json).unwrap();
        assert!(query.locale.is_none());
        assert!(query.currency.is_none());
        assert!(query.adults.is_none());

        let legs = query.legs.unwrap();
        assert_eq!(legs.len(), 2);
        assert!(legs[0].origin.is_none());
        assert_eq!(legs[0].destination.as_deref(), Some("LAX"));
        assert_eq!(legs[1], QueryLeg::default());
    }

    #[test]
    fn test_serializes_for_provider() {
        let query = SearchQuery::new("en-US", "USD", 2).with_leg("JFK", "LAX");
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["queryLegs"][0]["origin"], "JFK");
        assert_eq!(value["adults"], 2);
        assert!(value.get("market").is_none());
    }

    #[test]
    fn test_market_codes() {
        assert_eq!(Market::from_code("ZA"), Some(Market::Za));
        assert_eq!(Market::from_code("GB"), None);
        assert_eq!(Market::Us.code(), "US");
    }
}
