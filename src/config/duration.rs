//! Duration Text Parsing
//!
//! Accepts the two notations used in TTL configuration:
//! - suffixed shorthand: `1500ms`, `30s`, `3m`, `12h`, `1d` (a bare number is milliseconds)
//! - ISO-8601 durations: `PT3M`, `PT1.5S`, `P1DT2H`

use std::time::Duration;

use crate::error::{CacheError, Result};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// Parses a duration from its textual form.
///
/// Units are case-insensitive. Negative, empty and fractional shorthand
/// values are rejected; only the ISO seconds field may carry a fraction.
pub fn parse_duration(text: &str) -> Result<Duration> {
    let text = text.trim();
    if text.is_empty() {
        return Err(invalid(text, "empty duration"));
    }

    if text.starts_with(['P', 'p']) {
        parse_iso8601(text)
    } else {
        parse_shorthand(text)
    }
}

// == Shorthand ==
fn parse_shorthand(text: &str) -> Result<Duration> {
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, unit) = text.split_at(split);
    if digits.is_empty() {
        return Err(invalid(text, "expected a number"));
    }

    let amount: u64 = digits
        .parse()
        .map_err(|_| invalid(text, "number out of range"))?;

    let duration = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "ms" => Duration::from_millis(amount),
        "ns" => Duration::from_nanos(amount),
        "us" => Duration::from_micros(amount),
        "s" => Duration::from_secs(amount),
        "m" => scaled_secs(text, amount, SECS_PER_MINUTE)?,
        "h" => scaled_secs(text, amount, SECS_PER_HOUR)?,
        "d" => scaled_secs(text, amount, SECS_PER_DAY)?,
        other => return Err(invalid(text, &format!("unknown unit '{}'", other))),
    };
    Ok(duration)
}

// == ISO-8601 ==
fn parse_iso8601(text: &str) -> Result<Duration> {
    let upper = text.to_ascii_uppercase();
    let body = &upper[1..];
    let (date, time) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    if date.is_empty() && time.map_or(true, str::is_empty) {
        return Err(invalid(text, "no duration fields"));
    }
    if time == Some("") {
        return Err(invalid(text, "time designator without fields"));
    }

    let mut total = parse_iso_section(text, date, &['D'])?;
    if let Some(time) = time {
        let time_part = parse_iso_section(text, time, &['H', 'M', 'S'])?;
        total = total
            .checked_add(time_part)
            .ok_or_else(|| invalid(text, "duration overflows"))?;
    }
    Ok(total)
}

/// Parses one `nXnY` run where the designators must appear in `units` order.
fn parse_iso_section(original: &str, section: &str, units: &[char]) -> Result<Duration> {
    let mut total = Duration::ZERO;
    let mut number = String::new();
    let mut last_unit: Option<usize> = None;

    for c in section.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }

        let position = units
            .iter()
            .position(|unit| *unit == c)
            .ok_or_else(|| invalid(original, &format!("unexpected designator '{}'", c)))?;
        if number.is_empty() {
            return Err(invalid(original, "designator without a value"));
        }
        if last_unit.is_some_and(|last| position <= last) {
            return Err(invalid(original, "designators out of order"));
        }
        last_unit = Some(position);

        let part = if c == 'S' {
            let secs: f64 = number
                .parse()
                .map_err(|_| invalid(original, "malformed seconds"))?;
            Duration::try_from_secs_f64(secs).map_err(|_| invalid(original, "seconds out of range"))?
        } else {
            let amount: u64 = number
                .parse()
                .map_err(|_| invalid(original, "malformed number"))?;
            let unit_secs = match c {
                'D' => SECS_PER_DAY,
                'H' => SECS_PER_HOUR,
                _ => SECS_PER_MINUTE,
            };
            scaled_secs(original, amount, unit_secs)?
        };

        total = total
            .checked_add(part)
            .ok_or_else(|| invalid(original, "duration overflows"))?;
        number.clear();
    }

    if !number.is_empty() {
        return Err(invalid(original, "trailing number without designator"));
    }
    Ok(total)
}

fn scaled_secs(original: &str, amount: u64, unit_secs: u64) -> Result<Duration> {
    amount
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| invalid(original, "duration overflows"))
}

fn invalid(text: &str, reason: &str) -> CacheError {
    CacheError::InvalidConfig(format!("invalid duration '{}': {}", text, reason))
}
