//! Attempt module - immutable records of past lookup attempts

use crate::endpoint::Endpoint;
use crate::query::{QueryKind, VehicleQuery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Unique identifier for an attempt log entry, based on UUIDv7
///
/// Assigned by the log writer. UUIDv7 keeps identifiers chronologically
/// sortable without coordination between writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(u128);

impl AttemptId {
    /// Generate a new UUIDv7-based AttemptId
    ///
    /// # Examples
    ///
    /// ```
    /// use regula_domain::AttemptId;
    ///
    /// let id = AttemptId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an AttemptId from a raw u128 value (storage deserialization)
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an AttemptId from its hyphenated UUID form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid attempt id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl Serialize for AttemptId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AttemptId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// Classification of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The registry has no record for the identifier
    NotFound,

    /// The identifier belongs to the other registry
    WrongEndpoint,

    /// The provider itself failed (5xx, rate limit, transport)
    ProviderFault,

    /// Anything the classifier could not place
    Unknown,
}

/// Message fragments that mean "ask the other registry"
const WRONG_ENDPOINT_MARKERS: &[&str] = &[
    "wrong endpoint",
    "other registry",
    "another state",
    "outra uf",
    "outra base",
    "fora da uf",
    "base nacional",
    "base estadual",
];

/// Message fragments that mean "no such vehicle"
const NOT_FOUND_MARKERS: &[&str] = &[
    "not found",
    "no record",
    "não encontrado",
    "nao encontrado",
    "não localizado",
    "nao localizado",
];

impl ErrorClass {
    /// Get the class name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::NotFound => "not_found",
            ErrorClass::WrongEndpoint => "wrong_endpoint",
            ErrorClass::ProviderFault => "provider_fault",
            ErrorClass::Unknown => "unknown",
        }
    }

    /// Parse a class from its string name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_found" => Some(ErrorClass::NotFound),
            "wrong_endpoint" => Some(ErrorClass::WrongEndpoint),
            "provider_fault" => Some(ErrorClass::ProviderFault),
            "unknown" => Some(ErrorClass::Unknown),
            _ => None,
        }
    }

    /// Classify a provider failure from its status code and message
    ///
    /// Message markers win over status codes: registries answer "vehicle is
    /// registered in another state" with a plain 404 or even a 200 envelope.
    ///
    /// # Examples
    ///
    /// ```
    /// use regula_domain::ErrorClass;
    ///
    /// assert_eq!(ErrorClass::classify(Some(404), "Veículo não encontrado"), ErrorClass::NotFound);
    /// assert_eq!(ErrorClass::classify(Some(404), "Veículo de outra UF"), ErrorClass::WrongEndpoint);
    /// assert_eq!(ErrorClass::classify(Some(503), "upstream down"), ErrorClass::ProviderFault);
    /// ```
    pub fn classify(status_code: Option<u16>, message: &str) -> Self {
        let lower = message.to_lowercase();
        if WRONG_ENDPOINT_MARKERS.iter().any(|m| lower.contains(m)) {
            return ErrorClass::WrongEndpoint;
        }
        if NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m)) {
            return ErrorClass::NotFound;
        }
        match status_code {
            Some(404) => ErrorClass::NotFound,
            Some(429) | Some(500..=599) => ErrorClass::ProviderFault,
            _ => ErrorClass::Unknown,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened during an attempt
///
/// A payload exists iff the attempt succeeded; an error exists iff it failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The provider answered with vehicle data
    Succeeded {
        /// Opaque provider response
        payload: Value,
    },

    /// The provider refused or failed
    Failed {
        /// Raw provider message
        error_message: String,
        /// Classified failure kind
        error_class: ErrorClass,
    },
}

/// Best-effort projection of a payload, for display only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedAttributes {
    /// Manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,

    /// Model name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Model year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_year: Option<String>,

    /// License plate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,

    /// Chassis / VIN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis: Option<String>,

    /// Renavam
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renavam: Option<String>,
}

impl ExtractedAttributes {
    /// Project the well-known vehicle fields out of a provider payload
    ///
    /// Looks at the top level first, then one level of nested objects
    /// (registries commonly wrap the vehicle in `veiculo` or `data`).
    pub fn from_payload(payload: &Value) -> Self {
        let pick = |keys: &[&str]| find_field(payload, keys);
        Self {
            make: pick(&["make", "marca", "fabricante"]),
            model: pick(&["model", "modelo"]),
            model_year: pick(&["model_year", "modelYear", "ano_modelo", "anoModelo"]),
            plate: pick(&["plate", "placa"]),
            chassis: pick(&["chassis", "chassi", "vin"]),
            renavam: pick(&["renavam"]),
        }
    }

    /// True if nothing could be extracted
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn find_field(payload: &Value, keys: &[&str]) -> Option<String> {
    let obj = payload.as_object()?;
    let direct = keys.iter().find_map(|k| obj.get(*k).and_then(scalar_to_string));
    direct.or_else(|| {
        obj.values()
            .filter_map(Value::as_object)
            .find_map(|nested| keys.iter().find_map(|k| nested.get(*k).and_then(scalar_to_string)))
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// An immutable record of one past resolution attempt
///
/// Append-only: the engine reads these but never creates, edits or deletes
/// them. Writers construct them through [`AttemptLog::succeeded`] and
/// [`AttemptLog::failed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptLog {
    /// Writer-assigned identifier
    pub id: AttemptId,

    /// Kind of the queried identifier
    pub query_kind: QueryKind,

    /// Normalized identifier value
    pub query_value: String,

    /// Registry the attempt was made against
    pub endpoint: Endpoint,

    /// Success payload or classified failure
    pub outcome: AttemptOutcome,

    /// When the attempt was recorded
    pub created_at: DateTime<Utc>,

    /// Display projection of the payload
    #[serde(default)]
    pub extracted: ExtractedAttributes,
}

impl AttemptLog {
    /// Record a successful attempt, extracting display attributes from the payload
    pub fn succeeded(query: &VehicleQuery, endpoint: Endpoint, payload: Value) -> Self {
        let extracted = ExtractedAttributes::from_payload(&payload);
        Self {
            id: AttemptId::new(),
            query_kind: query.kind(),
            query_value: query.value().to_string(),
            endpoint,
            outcome: AttemptOutcome::Succeeded { payload },
            created_at: Utc::now(),
            extracted,
        }
    }

    /// Record a failed attempt
    pub fn failed(
        query: &VehicleQuery,
        endpoint: Endpoint,
        error_message: impl Into<String>,
        error_class: ErrorClass,
    ) -> Self {
        Self {
            id: AttemptId::new(),
            query_kind: query.kind(),
            query_value: query.value().to_string(),
            endpoint,
            outcome: AttemptOutcome::Failed {
                error_message: error_message.into(),
                error_class,
            },
            created_at: Utc::now(),
            extracted: ExtractedAttributes::default(),
        }
    }

    /// Override the creation timestamp (backfills and tests)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Whether the attempt succeeded
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Succeeded { .. })
    }

    /// The success payload, if any
    pub fn payload(&self) -> Option<&Value> {
        match &self.outcome {
            AttemptOutcome::Succeeded { payload } => Some(payload),
            AttemptOutcome::Failed { .. } => None,
        }
    }

    /// The failure class, if any
    pub fn error_class(&self) -> Option<ErrorClass> {
        match &self.outcome {
            AttemptOutcome::Failed { error_class, .. } => Some(*error_class),
            AttemptOutcome::Succeeded { .. } => None,
        }
    }

    /// The raw failure message, if any
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            AttemptOutcome::Failed { error_message, .. } => Some(error_message),
            AttemptOutcome::Succeeded { .. } => None,
        }
    }

    /// True if this entry records the given query
    pub fn matches(&self, query: &VehicleQuery) -> bool {
        self.query_kind == query.kind() && self.query_value == query.value()
    }
}
