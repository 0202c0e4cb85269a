use std::fmt;
use std::str::FromStr;

use nom::{
    character::complete::{digit1, one_of},
    combinator::{all_consuming, opt},
    sequence::pair,
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::{QuotaEngineError, Result};

pub const MEGABYTES_PER_GIGABYTE: u64 = 1024;

/// A parsed quota value, always held in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotaMagnitude(u64);

impl QuotaMagnitude {
    pub fn megabytes(self) -> u64 {
        self.0
    }

    /// Converts the magnitude into a signed allocation.
    pub fn to_allocation_mb(self) -> Result<i64> {
        i64::try_from(self.0).map_err(|_| {
            QuotaEngineError::AllocationOverflow(format!(
                "{} MB exceeds the allocation range",
                self.0
            ))
        })
    }
}

impl fmt::Display for QuotaMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MB", self.0)
    }
}

impl FromStr for QuotaMagnitude {
    type Err = QuotaEngineError;

    fn from_str(s: &str) -> Result<Self> {
        parse_magnitude(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Megabytes,
    Gigabytes,
}

impl Unit {
    fn from_suffix(suffix: Option<char>) -> Self {
        match suffix {
            Some('g') => Unit::Gigabytes,
            _ => Unit::Megabytes,
        }
    }

    fn scale(self) -> u64 {
        match self {
            Unit::Megabytes => 1,
            Unit::Gigabytes => MEGABYTES_PER_GIGABYTE,
        }
    }
}

fn magnitude_parser(input: &str) -> IResult<&str, (&str, Option<char>)> {
    all_consuming(pair(digit1, opt(one_of("gm"))))(input)
}

/// Parses a quota token into megabytes.
///
/// Accepts one or more ASCII digits optionally followed by `g` (gigabytes) or
/// `m` (megabytes). The suffix is case-sensitive and surrounding whitespace is
/// not trimmed.
pub fn parse_magnitude(token: &str) -> Result<QuotaMagnitude> {
    let (_, (digits, suffix)) = magnitude_parser(token).map_err(|_| {
        parse_error(token, "expected digits optionally followed by 'g' or 'm'")
    })?;

    let value: u64 = digits
        .parse()
        .map_err(|_| parse_error(token, "number is too large"))?;
    let megabytes = value
        .checked_mul(Unit::from_suffix(suffix).scale())
        .ok_or_else(|| parse_error(token, "number is too large"))?;

    Ok(QuotaMagnitude(megabytes))
}

fn parse_error(token: &str, message: &str) -> QuotaEngineError {
    QuotaEngineError::ParseError {
        token: token.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_scales_only_gigabytes() {
        assert_eq!(Unit::from_suffix(Some('g')).scale(), 1024);
        assert_eq!(Unit::from_suffix(Some('m')).scale(), 1);
        assert_eq!(Unit::from_suffix(None).scale(), 1);
    }

    #[test]
    fn display_uses_megabytes() {
        let magnitude: QuotaMagnitude = "2g".parse().unwrap();
        assert_eq!(magnitude.to_string(), "2048 MB");
    }
}
