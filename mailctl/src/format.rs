//! Rendering and parsing of quota magnitudes
//!
//! Storage sizes are displayed on a binary scale with truncating division,
//! picking the largest unit that fits: `1048576` renders as `1 MB`,
//! `1572864` as `1 MB` too, and `1023` as `1023 bytes`.

use std::{fmt, str::FromStr};

use mailctl_control::Magnitude;
use thiserror::Error;

/// Marker printed for a value the server could not compute
pub const UNKNOWN: &str = "unknown";
/// Marker printed for a value without a limit
pub const UNLIMITED: &str = "unlimited";

const ONE_KB: u64 = 1024;
const ONE_MB: u64 = ONE_KB * 1024;
const ONE_GB: u64 = ONE_MB * 1024;
const ONE_TB: u64 = ONE_GB * 1024;
const ONE_PB: u64 = ONE_TB * 1024;
const ONE_EB: u64 = ONE_PB * 1024;

/// Errors raised while parsing a value with an optional unit suffix
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("empty value")]
    Empty,

    #[error("invalid value `{0}`: expected a non-negative integer")]
    InvalidNumber(String),

    #[error("invalid value `{value}`: unknown unit `{unit}` (expected one of B, K, M, G)")]
    UnknownUnit { value: String, unit: String },

    #[error("invalid value `{0}`: too large")]
    Overflow(String),
}

/// Render a storage magnitude for display
#[must_use]
pub fn format_storage(value: Magnitude) -> String {
    match value {
        Magnitude::Unknown => UNKNOWN.to_string(),
        Magnitude::Unlimited => UNLIMITED.to_string(),
        Magnitude::Known(bytes) => byte_count_to_display_size(bytes),
    }
}

/// Render a message-count magnitude for display
#[must_use]
pub fn format_count(value: Magnitude) -> String {
    match value {
        Magnitude::Unknown => UNKNOWN.to_string(),
        Magnitude::Unlimited => UNLIMITED.to_string(),
        Magnitude::Known(count) => count.to_string(),
    }
}

fn byte_count_to_display_size(bytes: u64) -> String {
    if bytes / ONE_EB > 0 {
        format!("{} EB", bytes / ONE_EB)
    } else if bytes / ONE_PB > 0 {
        format!("{} PB", bytes / ONE_PB)
    } else if bytes / ONE_TB > 0 {
        format!("{} TB", bytes / ONE_TB)
    } else if bytes / ONE_GB > 0 {
        format!("{} GB", bytes / ONE_GB)
    } else if bytes / ONE_MB > 0 {
        format!("{} MB", bytes / ONE_MB)
    } else if bytes / ONE_KB > 0 {
        format!("{} KB", bytes / ONE_KB)
    } else {
        format!("{bytes} bytes")
    }
}

/// Unit suffix accepted after a magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Byte,
    Kilo,
    Mega,
    Giga,
}

impl Unit {
    #[must_use]
    pub const fn multiplier(self) -> u64 {
        match self {
            Self::Byte => 1,
            Self::Kilo => ONE_KB,
            Self::Mega => ONE_MB,
            Self::Giga => ONE_GB,
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" | "B" | "b" => Some(Self::Byte),
            "K" | "k" => Some(Self::Kilo),
            "M" | "m" => Some(Self::Mega),
            "G" | "g" => Some(Self::Giga),
            _ => None,
        }
    }
}

/// A magnitude as typed by the operator, e.g. `100K` or `2M`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueWithUnit {
    magnitude: u64,
    unit: Unit,
}

impl ValueWithUnit {
    /// Parse `s` straight to its canonical count
    ///
    /// # Errors
    ///
    /// Fails on empty input, a non-numeric magnitude, an unknown suffix or
    /// a count that does not fit in a `u64`.
    pub fn parse(s: &str) -> Result<u64, UnitError> {
        s.parse::<Self>()?.converted_value()
    }

    #[must_use]
    pub const fn magnitude(&self) -> u64 {
        self.magnitude
    }

    #[must_use]
    pub const fn unit(&self) -> Unit {
        self.unit
    }

    /// Canonical count: magnitude times the unit multiplier
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Overflow`] if the product does not fit in a `u64`
    pub fn converted_value(&self) -> Result<u64, UnitError> {
        self.magnitude
            .checked_mul(self.unit.multiplier())
            .ok_or_else(|| UnitError::Overflow(self.to_string()))
    }
}

impl FromStr for ValueWithUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(UnitError::Empty);
        }

        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, suffix) = s.split_at(split);
        if digits.is_empty() {
            return Err(UnitError::InvalidNumber(s.to_string()));
        }

        let unit = Unit::from_suffix(suffix).ok_or_else(|| UnitError::UnknownUnit {
            value: s.to_string(),
            unit: suffix.to_string(),
        })?;
        let magnitude = digits
            .parse::<u64>()
            .map_err(|_| UnitError::Overflow(s.to_string()))?;

        Ok(Self { magnitude, unit })
    }
}

impl fmt::Display for ValueWithUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.unit {
            Unit::Byte => "",
            Unit::Kilo => "K",
            Unit::Mega => "M",
            Unit::Giga => "G",
        };
        write!(f, "{}{suffix}", self.magnitude)
    }
}

/// Parse a storage limit: a value with unit, or `unlimited`
///
/// # Errors
///
/// See [`ValueWithUnit::parse`]
pub fn parse_storage_limit(s: &str) -> Result<Magnitude, UnitError> {
    if s.eq_ignore_ascii_case(UNLIMITED) {
        return Ok(Magnitude::Unlimited);
    }
    ValueWithUnit::parse(s).map(Magnitude::Known)
}

/// Parse a message-count limit: a plain integer, or `unlimited`
///
/// # Errors
///
/// Fails on empty or non-numeric input
pub fn parse_count_limit(s: &str) -> Result<Magnitude, UnitError> {
    if s.is_empty() {
        return Err(UnitError::Empty);
    }
    if s.eq_ignore_ascii_case(UNLIMITED) {
        return Ok(Magnitude::Unlimited);
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UnitError::InvalidNumber(s.to_string()));
    }
    s.parse::<u64>()
        .map(Magnitude::Known)
        .map_err(|_| UnitError::Overflow(s.to_string()))
}
