//! Endpoint module - the external registries a query can be resolved against

use serde::{Deserialize, Serialize};
use std::fmt;

/// External vehicle-registry data source
///
/// A query may legitimately belong to only one endpoint. Presenting the wrong
/// one is a recoverable user error, not a system fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// State-level registry (vehicles registered in the queried region)
    #[serde(rename = "regional-registry", alias = "regional")]
    Regional,

    /// Federal registry (vehicles outside the regional base)
    #[serde(rename = "national-registry", alias = "national")]
    National,
}

impl Endpoint {
    /// All known endpoints
    pub const ALL: [Endpoint; 2] = [Endpoint::Regional, Endpoint::National];

    /// Get the endpoint name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Regional => "regional-registry",
            Endpoint::National => "national-registry",
        }
    }

    /// Parse an endpoint from a string (wire names and short aliases)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "regional-registry" | "regional" | "estadual" => Some(Endpoint::Regional),
            "national-registry" | "national" | "nacional" => Some(Endpoint::National),
            _ => None,
        }
    }

    /// The endpoint a user should switch to when this one is flagged wrong
    pub fn alternative(&self) -> Self {
        match self {
            Endpoint::Regional => Endpoint::National,
            Endpoint::National => Endpoint::Regional,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid endpoint: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_aliases() {
        assert_eq!(Endpoint::parse("regional"), Some(Endpoint::Regional));
        assert_eq!(Endpoint::parse("Nacional"), Some(Endpoint::National));
        assert_eq!(Endpoint::parse("national-registry"), Some(Endpoint::National));
        assert_eq!(Endpoint::parse("federal"), None);
    }

    #[test]
    fn test_alternative_is_involution() {
        for endpoint in Endpoint::ALL {
            assert_ne!(endpoint.alternative(), endpoint);
            assert_eq!(endpoint.alternative().alternative(), endpoint);
        }
    }

    #[test]
    fn test_serde_wire_names() {
        let json = serde_json::to_string(&Endpoint::Regional).unwrap();
        assert_eq!(json, "\"regional-registry\"");
        let parsed: Endpoint = serde_json::from_str("\"national\"").unwrap();
        assert_eq!(parsed, Endpoint::National);
    }
}
