//! Explicit coercion of textual CSV fields into typed values.
//!
//! Postal codes are never coerced implicitly: every key goes through
//! [`ZipCode::parse_optional`] so that malformed input fails loudly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A US postal code reduced to its five-digit numeric form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZipCode(u32);

/// Raised when a non-empty field is not a recognisable postal code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipParseError(pub String);

impl fmt::Display for ZipParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid zip code '{}'", self.0)
    }
}

impl std::error::Error for ZipParseError {}

impl ZipCode {
    pub const MAX: u32 = 99_999;

    pub fn new(value: u32) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Parses a postal code field, treating an empty field as absent.
    ///
    /// Accepts plain digits (leading zeros may have been stripped by an
    /// upstream export), a float-formatted value with an all-zero fraction
    /// (`98101.0`) and ZIP+4 (`98101-1234`, only the first five digits are
    /// kept).
    ///
    /// # Errors
    ///
    /// Returns [`ZipParseError`] for any other non-empty input.
    pub fn parse_optional(raw: &str) -> Result<Option<Self>, ZipParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let invalid = || ZipParseError(trimmed.to_string());

        let digits = match trimmed.split_once('-') {
            Some((base, plus4)) => {
                if base.len() != 5 || plus4.len() != 4 || !is_digits(plus4) {
                    return Err(invalid());
                }
                base
            }
            None => match trimmed.split_once('.') {
                Some((whole, fraction)) => {
                    if fraction.is_empty() || !fraction.bytes().all(|b| b == b'0') {
                        return Err(invalid());
                    }
                    whole
                }
                None => trimmed,
            },
        };

        if digits.is_empty() || digits.len() > 5 || !is_digits(digits) {
            return Err(invalid());
        }

        let value: u32 = digits.parse().map_err(|_| invalid())?;
        Self::new(value).map(Some).ok_or_else(invalid)
    }
}

impl FromStr for ZipCode {
    type Err = ZipParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_optional(s)?.ok_or_else(|| ZipParseError(s.to_string()))
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}", self.0)
    }
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a numeric field such as a price or a distance.
///
/// Surrounding whitespace, a leading `$` and thousands separators are
/// tolerated. Returns `None` for anything that is not a finite number.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let cleaned: String = unsigned.chars().filter(|c| *c != ',').collect();

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
