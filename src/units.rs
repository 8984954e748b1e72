use core::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    static ref SIZE_PATTERN: Regex = Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(m|ft|km|nm)\s*$").unwrap();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    Meters,
    Feet,
    Kilometers,
    NauticalMiles,
}

impl Unit {
    /// Kilometers per one unit.
    pub fn factor(&self) -> f64 {
        match self {
            Unit::Meters => 0.001,
            Unit::Feet => 0.0003048,
            Unit::Kilometers => 1.0,
            Unit::NauticalMiles => 1.852,
        }
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "m" => Ok(Unit::Meters),
            "ft" => Ok(Unit::Feet),
            "km" => Ok(Unit::Kilometers),
            "nm" => Ok(Unit::NauticalMiles),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::Meters => "m",
            Unit::Feet => "ft",
            Unit::Kilometers => "km",
            Unit::NauticalMiles => "nm",
        };
        write!(f, "{}", s)
    }
}

/// Parses a distance such as `"10m"`, `"0.5 km"` or `"2NM"` into kilometers.
pub fn parse_buffer_size(input: &str) -> Result<f64> {
    let lower = input.to_lowercase();
    let captures = SIZE_PATTERN
        .captures(&lower)
        .ok_or_else(|| Error::InvalidFormat(input.to_string()))?;
    let value: f64 = captures[1]
        .parse()
        .map_err(|_| Error::InvalidFormat(input.to_string()))?;
    let unit: Unit = captures[2].parse()?;
    Ok(value * unit.factor())
}

pub fn format_buffer_size(value: f64, unit: Unit) -> String {
    format!("{}{}", value, unit)
}

/// Lenient batch parsing: invalid entries are logged and dropped.
/// Returns `(label, kilometers)` pairs in input order.
pub fn parse_buffer_sizes<S: AsRef<str>>(inputs: &[S]) -> Vec<(String, f64)> {
    inputs
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| match parse_buffer_size(s) {
            Ok(km) => Some((s.to_string(), km)),
            Err(e) => {
                log::warn!("skipping buffer size: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_units() {
        assert!(close(parse_buffer_size("10m").unwrap(), 0.01));
        assert!(close(parse_buffer_size("100ft").unwrap(), 0.03048));
        assert!(close(parse_buffer_size("0.5km").unwrap(), 0.5));
        assert!(close(parse_buffer_size("2nm").unwrap(), 3.704));
    }

    #[test]
    fn test_case_and_whitespace() {
        assert!(close(parse_buffer_size("  10 M ").unwrap(), 0.01));
        assert!(close(parse_buffer_size("1.5KM").unwrap(), 1.5));
        assert!(close(parse_buffer_size("3 Nm").unwrap(), 5.556));
    }

    #[test]
    fn test_round_trip() {
        let units = [
            Unit::Meters,
            Unit::Feet,
            Unit::Kilometers,
            Unit::NauticalMiles,
        ];
        for unit in units {
            for value in [0.0, 1.0, 12.5, 250.0, 3.75] {
                let s = format_buffer_size(value, unit);
                let km = parse_buffer_size(&s).unwrap();
                assert!((km - value * unit.factor()).abs() < 1e-9, "{}", s);
            }
        }
    }

    #[test]
    fn test_invalid() {
        for s in ["10xyz", "", "km", "abc m", "-5m", "10", "1.km", "10 m m"] {
            match parse_buffer_size(s) {
                Err(Error::InvalidFormat(_)) => {}
                other => panic!("{:?} parsed as {:?}", s, other),
            }
        }
    }

    #[test]
    fn test_batch_skips_invalid() {
        let parsed = parse_buffer_sizes(&["10m", "10xyz", " ", "0.1km"]);
        let labels: Vec<_> = parsed.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["10m", "0.1km"]);
        assert!(!labels.contains(&"10xyz"));
    }
}
