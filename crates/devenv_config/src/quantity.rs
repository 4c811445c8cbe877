//! Resource quantity normalization.
//!
//! Converts the dynamically-typed `cpu` and `memory` values of a
//! configuration into canonical integers:
//!
//! - CPU in **millicores** (`"500m"` → 500, `2` → 2000, `"1.5"` → 1500)
//! - Memory in **mebibytes** (`"512Mi"` → 512, `"1.5Gi"` → 1536, `"500M"` → 477)
//!
//! Each pipeline has two pure stages. [`normalize_quantity`] turns the raw
//! value into trimmed text (or `None` when absent), and the `canonicalize_*`
//! functions turn that text into an integer. Absent values canonicalize to 0,
//! which the merger treats as "unspecified".
//!
//! A memory value without a unit suffix, including a native YAML number, is
//! read as **gibibytes**, not bytes: `memory: 8` means 8Gi.
//!
//! # Examples
//!
//! ```rust
//! use devenv_config::quantity::{parse_cpu, parse_memory};
//! use devenv_config::RawValue;
//!
//! assert_eq!(parse_cpu(&RawValue::from("500m"))?, 500);
//! assert_eq!(parse_cpu(&RawValue::Integer(2))?, 2000);
//! assert_eq!(parse_memory(&RawValue::from("1.5Gi"))?, 1536);
//! assert_eq!(parse_memory(&RawValue::Integer(8))?, 8192);
//! # Ok::<(), devenv_config::ConfigurationError>(())
//! ```

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::raw_value::RawValue;

pub const CPU_FIELD: &str = "resources.cpu";
pub const MEMORY_FIELD: &str = "resources.memory";

const BYTES_PER_MIB: i128 = 1024 * 1024;

/// Unit a memory suffix scales by, relative to one mebibyte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemoryUnit {
    /// 1024^exponent Mi; `Ki` is exponent -1.
    Binary(i32),
    /// 1000^exponent bytes.
    Decimal(u32),
}

impl MemoryUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        let unit = match suffix.to_ascii_lowercase().as_str() {
            // Bare numbers are gibibytes.
            "" => MemoryUnit::Binary(1),
            "ki" => MemoryUnit::Binary(-1),
            "mi" => MemoryUnit::Binary(0),
            "gi" => MemoryUnit::Binary(1),
            "ti" => MemoryUnit::Binary(2),
            "pi" => MemoryUnit::Binary(3),
            "ei" => MemoryUnit::Binary(4),
            "k" => MemoryUnit::Decimal(1),
            "m" => MemoryUnit::Decimal(2),
            "g" => MemoryUnit::Decimal(3),
            "t" => MemoryUnit::Decimal(4),
            "p" => MemoryUnit::Decimal(5),
            "e" => MemoryUnit::Decimal(6),
            _ => return None,
        };
        Some(unit)
    }
}

/// A non-negative decimal number as written in the source text.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Whole(i128),
    Fraction(f64),
}

/// Normalizes a raw quantity into trimmed text.
///
/// Returns `None` for absent values and for empty strings. Native numbers
/// are rendered without an exponent so the text stage sees a plain decimal.
///
/// # Errors
///
/// Returns `ConfigurationError::InvalidQuantity` for non-finite floats and for
/// shapes that cannot hold a quantity (booleans, lists, mappings).
pub fn normalize_quantity(field: &str, raw: &RawValue) -> ConfigurationResult<Option<String>> {
    match raw {
        RawValue::Absent => Ok(None),
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        RawValue::Integer(i) => Ok(Some(i.to_string())),
        RawValue::Float(f) if f.is_finite() => Ok(Some(f.to_string())),
        RawValue::Float(f) => Err(ConfigurationError::quantity(
            field,
            &f.to_string(),
            "value must be a finite number",
        )),
        other => Err(ConfigurationError::quantity(
            field,
            &other.describe(),
            format!(
                "unsupported type {}, expected a string or a number",
                other.kind()
            ),
        )),
    }
}

/// Parses a raw CPU value into millicores.
///
/// # Errors
///
/// Returns `ConfigurationError::InvalidQuantity` for negative, non-finite,
/// malformed or overflowing values and for unsupported types.
pub fn parse_cpu(raw: &RawValue) -> ConfigurationResult<i64> {
    match normalize_quantity(CPU_FIELD, raw)? {
        Some(text) => canonicalize_cpu(&text),
        None => Ok(0),
    }
}

/// Parses a raw memory value into mebibytes.
///
/// # Errors
///
/// Returns `ConfigurationError::InvalidQuantity` for negative, non-finite,
/// malformed or overflowing values, unknown suffixes and unsupported types.
pub fn parse_memory(raw: &RawValue) -> ConfigurationResult<i64> {
    match normalize_quantity(MEMORY_FIELD, raw)? {
        Some(text) => canonicalize_memory(&text),
        None => Ok(0),
    }
}

/// Converts normalized CPU text into millicores.
///
/// Text ending in `m` (either case) is already in millicores and must be a
/// plain digit string. Anything else is a number of cores, written as a
/// decimal (`"1.5"`) or in exponent notation (`"1e3"`), matching how YAML
/// reads an unquoted `cpu: 1e3`.
pub fn canonicalize_cpu(text: &str) -> ConfigurationResult<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    if text.starts_with('-') {
        return Err(ConfigurationError::quantity(
            CPU_FIELD,
            text,
            "negative values are not allowed",
        ));
    }

    if let Some(digits) = text.strip_suffix(|c: char| c == 'm' || c == 'M') {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigurationError::quantity(
                CPU_FIELD,
                text,
                "millicore values must be a whole number followed by 'm'",
            ));
        }
        return digits.parse::<i64>().map_err(|_| {
            ConfigurationError::quantity(CPU_FIELD, text, "value is too large")
        });
    }

    let cores = parse_number(text).or_else(|| parse_exponent(text)).ok_or_else(|| {
        ConfigurationError::quantity(
            CPU_FIELD,
            text,
            "expected a number of cores (e.g. \"2\", \"0.5\") or millicores (e.g. \"500m\")",
        )
    })?;

    match cores {
        Number::Whole(n) => n
            .checked_mul(1000)
            .and_then(|m| i64::try_from(m).ok())
            .ok_or_else(|| ConfigurationError::quantity(CPU_FIELD, text, "value is too large")),
        Number::Fraction(f) => round_to_i64(CPU_FIELD, text, f * 1000.0),
    }
}

/// Converts normalized memory text into mebibytes.
///
/// Recognizes the binary suffixes `Ki Mi Gi Ti Pi Ei` and the decimal
/// suffixes `k M G T P E` case-insensitively. Decimal suffixes count bytes.
/// A bare number is gibibytes. Results round to the nearest mebibyte.
/// Exponent notation is not accepted, since `E` is the exabyte suffix.
pub fn canonicalize_memory(text: &str) -> ConfigurationResult<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    if text.starts_with('-') {
        return Err(ConfigurationError::quantity(
            MEMORY_FIELD,
            text,
            "negative values are not allowed",
        ));
    }

    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number_text, suffix) = text.split_at(split);
    let suffix = suffix.trim();

    let number = parse_number(number_text).ok_or_else(|| {
        ConfigurationError::quantity(
            MEMORY_FIELD,
            text,
            "expected a number optionally followed by a unit (e.g. \"512Mi\", \"8Gi\")",
        )
    })?;
    let unit = MemoryUnit::from_suffix(suffix).ok_or_else(|| {
        ConfigurationError::quantity(
            MEMORY_FIELD,
            text,
            format!(
                "unknown unit '{}', expected one of Ki, Mi, Gi, Ti, Pi, Ei, k, M, G, T, P, E",
                suffix
            ),
        )
    })?;

    match number {
        Number::Whole(n) => whole_to_mebibytes(n, unit)
            .and_then(|mi| i64::try_from(mi).ok())
            .ok_or_else(|| ConfigurationError::quantity(MEMORY_FIELD, text, "value is too large")),
        Number::Fraction(f) => {
            let mebibytes = match unit {
                MemoryUnit::Binary(exponent) => f * 1024f64.powi(exponent),
                MemoryUnit::Decimal(exponent) => {
                    f * 1000f64.powi(exponent as i32) / BYTES_PER_MIB as f64
                }
            };
            round_to_i64(MEMORY_FIELD, text, mebibytes)
        }
    }
}

/// Formats millicores the way Kubernetes manifests expect them.
pub fn format_cpu(millicores: i64) -> String {
    format!("{}m", millicores)
}

/// Formats mebibytes, preferring `Gi` when the value is a whole number of
/// gibibytes.
pub fn format_memory(mebibytes: i64) -> String {
    if mebibytes > 0 && mebibytes % 1024 == 0 {
        format!("{}Gi", mebibytes / 1024)
    } else {
        format!("{}Mi", mebibytes)
    }
}

fn whole_to_mebibytes(n: i128, unit: MemoryUnit) -> Option<i128> {
    match unit {
        MemoryUnit::Binary(-1) => n.checked_add(512).map(|v| v / 1024),
        MemoryUnit::Binary(exponent) => n.checked_mul(1024i128.checked_pow(exponent as u32)?),
        MemoryUnit::Decimal(exponent) => {
            let bytes = n.checked_mul(1000i128.checked_pow(exponent)?)?;
            bytes
                .checked_add(BYTES_PER_MIB / 2)
                .map(|v| v / BYTES_PER_MIB)
        }
    }
}

/// Parses an unsigned decimal made of digits and at most one dot.
fn parse_number(text: &str) -> Option<Number> {
    if !text.bytes().any(|b| b.is_ascii_digit())
        || !text.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        || text.bytes().filter(|&b| b == b'.').count() > 1
    {
        return None;
    }

    if text.contains('.') {
        text.parse::<f64>().ok().map(Number::Fraction)
    } else {
        // More digits than i128 holds is reported as an overflow by the caller.
        Some(Number::Whole(text.parse::<i128>().unwrap_or(i128::MAX)))
    }
}

/// Parses `<decimal>e<exponent>` with an optionally signed exponent.
fn parse_exponent(text: &str) -> Option<Number> {
    let (mantissa, exponent) = text.split_once(|c: char| c == 'e' || c == 'E')?;
    let digits = exponent
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(exponent);
    if parse_number(mantissa).is_none()
        || digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    text.parse::<f64>().ok().map(Number::Fraction)
}

fn round_to_i64(field: &str, text: &str, value: f64) -> ConfigurationResult<i64> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < 0.0 {
        return Err(ConfigurationError::quantity(
            field,
            text,
            "value must be a finite, non-negative number",
        ));
    }
    // i64::MAX is not representable; 2^63 is the first value that overflows.
    if rounded >= 9_223_372_036_854_775_808.0 {
        return Err(ConfigurationError::quantity(field, text, "value is too large"));
    }
    Ok(rounded as i64)
}

#[cfg(test)]
#[path = "quantity_tests.rs"]
mod tests;
