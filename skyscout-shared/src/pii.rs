use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A wrapper for secrets (provider API keys) that masks its value in Debug and Display output.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Config dumps must not leak the secret either.
        serializer.serialize_str("********")
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Access the real value, e.g. to put it on an outbound request header.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Shortens an opaque session token for log lines: keeps the first six characters.
pub fn redact_token(token: &str) -> String {
    let visible: String = token.chars().take(6).collect();
    if visible.len() == token.len() {
        visible
    } else {
        format!("{}…", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_value() {
        let key = Masked::new("sk-live-123".to_string());
        assert_eq!(format!("{}", key), "********");
        assert_eq!(format!("{:?}", key), "********");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"********\"");
        assert_eq!(key.expose(), "sk-live-123");
    }

    #[test]
    fn test_masked_deserializes_transparently() {
        let key: Masked<String> = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(key.into_inner(), "abc");
    }

    #[test]
    fn test_redact_token() {
        assert_eq!(redact_token("abc123"), "abc123");
        assert_eq!(redact_token("abc123def456"), "abc123…");
    }
}
