//! Validated identifier types
//!
//! A `DniNumber` is exactly 8 ASCII digits, a `RucNumber` exactly 11.
//! Lookups only accept these types, so unvalidated input never reaches an
//! upstream.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn dni_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{8}$").expect("DNI pattern is valid"))
}

fn ruc_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{11}$").expect("RUC pattern is valid"))
}

/// National identity document number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DniNumber(String);

impl DniNumber {
    pub fn parse(candidate: &str) -> Option<Self> {
        dni_pattern()
            .is_match(candidate)
            .then(|| Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DniNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Taxpayer registry number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RucNumber(String);

impl RucNumber {
    pub fn parse(candidate: &str) -> Option<Self> {
        ruc_pattern()
            .is_match(candidate)
            .then(|| Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RucNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
