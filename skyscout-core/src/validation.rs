use regex::Regex;
use std::sync::LazyLock;

use crate::search::{Market, SearchQuery};

static IATA_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,3}$").expect("IATA code pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid market value '{0}'. Allowed markets: US, ZA.")]
    InvalidMarket(String),

    #[error("Missing or invalid 'locale'. 'locale' must be a string.")]
    InvalidLocale,

    #[error("Missing or invalid 'currency'. 'currency' must be a string.")]
    InvalidCurrency,

    #[error("'queryLegs' must be a non-empty list of legs.")]
    EmptyLegs,

    #[error("queryLeg {index} must include origin and destination.")]
    IncompleteLeg { index: usize },

    #[error("Invalid IATA code in queryLeg {index}.")]
    InvalidIataCode { index: usize },

    #[error("Missing or invalid 'adults'. 'adults' must be a positive integer.")]
    InvalidAdults,
}

type Rule = fn(&SearchQuery) -> Vec<ValidationError>;

const RULES: [Rule; 5] = [
    validate_market,
    validate_locale,
    validate_currency,
    validate_legs,
    validate_adults,
];

/// Runs every rule and returns all violations. An empty result means the
/// query may be submitted to the provider.
pub fn validate(query: &SearchQuery) -> Vec<ValidationError> {
    RULES.iter().flat_map(|rule| rule(query)).collect()
}

pub fn is_iata_code(code: &str) -> bool {
    IATA_CODE.is_match(code)
}

fn validate_market(query: &SearchQuery) -> Vec<ValidationError> {
    match query.market.as_deref() {
        Some(code) if Market::from_code(code).is_none() => {
            vec![ValidationError::InvalidMarket(code.to_string())]
        }
        _ => Vec::new(),
    }
}

fn validate_locale(query: &SearchQuery) -> Vec<ValidationError> {
    if is_present(query.locale.as_deref()) {
        Vec::new()
    } else {
        vec![ValidationError::InvalidLocale]
    }
}

fn validate_currency(query: &SearchQuery) -> Vec<ValidationError> {
    if is_present(query.currency.as_deref()) {
        Vec::new()
    } else {
        vec![ValidationError::InvalidCurrency]
    }
}

fn validate_legs(query: &SearchQuery) -> Vec<ValidationError> {
    let Some(legs) = query.legs.as_ref() else {
        return Vec::new();
    };
    if legs.is_empty() {
        return vec![ValidationError::EmptyLegs];
    }

    legs.iter()
        .enumerate()
        .filter_map(|(index, leg)| match (leg.origin.as_deref(), leg.destination.as_deref()) {
            (Some(origin), Some(destination)) => {
                if is_iata_code(origin) && is_iata_code(destination) {
                    None
                } else {
                    Some(ValidationError::InvalidIataCode { index })
                }
            }
            _ => Some(ValidationError::IncompleteLeg { index }),
        })
        .collect()
}

fn validate_adults(query: &SearchQuery) -> Vec<ValidationError> {
    match query.adults {
        Some(adults) if adults > 0 => Vec::new(),
        _ => vec![ValidationError::InvalidAdults],
    }
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
