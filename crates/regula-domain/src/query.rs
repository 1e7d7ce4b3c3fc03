//! Query module - normalization and validation of raw vehicle identifiers

use crate::inference::{KindInference, ShapeHeuristic};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of vehicle identifier a query carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// 17-character VIN stamped on the vehicle frame
    Chassis,

    /// License plate (legacy or Mercosul layout)
    Plate,

    /// National vehicle registration number
    Renavam,
}

impl QueryKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Chassis => "chassis",
            QueryKind::Plate => "plate",
            QueryKind::Renavam => "renavam",
        }
    }

    /// Parse a kind from a string, accepting the Portuguese field names too
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "chassis" | "chassi" | "vin" => Some(QueryKind::Chassis),
            "plate" | "placa" => Some(QueryKind::Plate),
            "renavam" => Some(QueryKind::Renavam),
            _ => None,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid query kind: {}", s))
    }
}

/// Raised when a raw identifier cannot be turned into a [`VehicleQuery`]
///
/// Caller-fixable; never recorded as an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid query: {reason}")]
pub struct InvalidQuery {
    /// Human-readable reason
    pub reason: String,
}

impl InvalidQuery {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A normalized vehicle identifier
///
/// Only constructible through [`QueryNormalizer`], so holding one means the
/// value is already trimmed, uppercased and (for chassis) structurally valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VehicleQuery {
    kind: QueryKind,
    value: String,
}

impl VehicleQuery {
    /// Identifier kind
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Canonical identifier value
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for VehicleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// Canonicalizes raw user input into a [`VehicleQuery`]
///
/// Kind inference for callers that do not know the kind up front is delegated
/// to a pluggable [`KindInference`] strategy.
///
/// # Examples
///
/// ```
/// use regula_domain::{QueryKind, QueryNormalizer};
///
/// let normalizer: QueryNormalizer = QueryNormalizer::default();
/// let query = normalizer.normalize(QueryKind::Plate, " abc-1234 ").unwrap();
/// assert_eq!(query.value(), "ABC1234");
///
/// let inferred = normalizer.normalize_inferred("9BWZZZ377VT004251").unwrap();
/// assert_eq!(inferred.kind(), QueryKind::Chassis);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryNormalizer<I = ShapeHeuristic> {
    inference: I,
}

impl<I: KindInference> QueryNormalizer<I> {
    /// Create a normalizer with a custom kind inference strategy
    pub fn new(inference: I) -> Self {
        Self { inference }
    }

    /// Normalize a raw value of a known kind
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQuery`] if the value is empty or, for chassis, does
    /// not pass VIN structure validation.
    pub fn normalize(&self, kind: QueryKind, raw_value: &str) -> Result<VehicleQuery, InvalidQuery> {
        let upper = raw_value.trim().to_uppercase();
        if upper.is_empty() {
            return Err(InvalidQuery::new("empty value"));
        }

        let value = match kind {
            QueryKind::Chassis => {
                let stripped: String = upper.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
                if !is_valid_vin(&stripped) {
                    return Err(InvalidQuery::new("malformed chassis"));
                }
                stripped
            }
            QueryKind::Plate => upper.chars().filter(|c| *c != '-' && !c.is_whitespace()).collect(),
            QueryKind::Renavam => upper.chars().filter(|c| c.is_ascii_digit()).collect(),
        };

        if value.is_empty() {
            return Err(InvalidQuery::new("empty value"));
        }

        Ok(VehicleQuery { kind, value })
    }

    /// Normalize a raw value whose kind must be inferred from its shape
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQuery`] if the strategy cannot infer a kind, or if
    /// normalization under the inferred kind fails.
    pub fn normalize_inferred(&self, raw_value: &str) -> Result<VehicleQuery, InvalidQuery> {
        let kind = self
            .inference
            .infer(raw_value)
            .ok_or_else(|| InvalidQuery::new("unrecognized identifier"))?;
        self.normalize(kind, raw_value)
    }
}

/// VIN length per ISO 3779
const VIN_LENGTH: usize = 17;

/// Position-9 check digit weights
const VIN_WEIGHTS: [u32; VIN_LENGTH] = [8, 7, 6, 5, 4, 3, 2, 10, 0, 9, 8, 7, 6, 5, 4, 3, 2];

/// Validate VIN structure, and the check digit where the region mandates it
///
/// Only North-American manufacturers (WMI starting with 1-5) are required to
/// carry a check digit; Brazilian and European VINs often use position 9 freely.
fn is_valid_vin(vin: &str) -> bool {
    if vin.len() != VIN_LENGTH || !vin.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    if vin.contains(['I', 'O', 'Q']) {
        return false;
    }

    match vin.chars().next() {
        Some('1'..='5') => vin_check_digit_matches(vin),
        _ => true,
    }
}

fn vin_check_digit_matches(vin: &str) -> bool {
    let mut sum = 0;
    for (c, weight) in vin.chars().zip(VIN_WEIGHTS) {
        match transliterate(c) {
            Some(v) => sum += v * weight,
            None => return false,
        }
    }

    let expected = match sum % 11 {
        10 => 'X',
        n => char::from_digit(n, 10).unwrap_or('?'),
    };
    vin.chars().nth(8) == Some(expected)
}

fn transliterate(c: char) -> Option<u32> {
    if let Some(d) = c.to_digit(10) {
        return Some(d);
    }
    let v = match c {
        'A' | 'J' => 1,
        'B' | 'K' | 'S' => 2,
        'C' | 'L' | 'T' => 3,
        'D' | 'M' | 'U' => 4,
        'E' | 'N' | 'V' => 5,
        'F' | 'W' => 6,
        'G' | 'P' | 'X' => 7,
        'H' | 'Y' => 8,
        'R' | 'Z' => 9,
        _ => return None,
    };
    Some(v)
}
