//! Coercion of raw values to their most specific semantic type
//!
//! Text is run through an ordered ladder of parsers and the first one that
//! accepts it wins: datetime, integer, decimal, float, boolean. Anything the
//! ladder rejects stays a string. Values that arrive already typed from a
//! decoder keep their type, with native floats narrowed to exact decimals
//! whenever their shortest text form allows it.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::model::{RawValue, TypedValue};

/// Characters that separate the parts of a written date
const DATE_SEPARATORS: &[char] = &['\\', '-', '.', '/', ' '];

/// Lengths of all-digit strings that read as compact dates:
/// YYYY, YYYYMM, YYYYMMDD, YYYYMMDDHHMM, YYYYMMDDHHMMSS, YYYYMMDDHHMMSSfff
const COMPACT_DATE_LENGTHS: &[usize] = &[4, 6, 8, 12, 14, 17];

/// Largest number of fractional digits a decimal holds
const MAX_SCALE: u32 = 28;

/// Accepted years lie strictly between these bounds
const MIN_YEAR: i32 = 1700;
const MAX_YEAR: i32 = 2150;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

// %B also accepts the abbreviated month name when parsing
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%Y %B %d",
];

const FALSE_WORDS: &[&str] = &["0", "false", "f", "n", "no"];
const TRUE_WORDS: &[&str] = &["1", "true", "t", "y", "yes"];

type Rung = fn(&Coercer, &str) -> Option<TypedValue>;

/// Parsers tried on text, most specific first
const TEXT_LADDER: [Rung; 5] = [
    Coercer::try_datetime,
    Coercer::try_integer,
    Coercer::try_decimal,
    Coercer::try_float,
    Coercer::try_bool,
];

/// Coerce a raw value using the local clock for the current date.
pub fn coerce(raw: &RawValue) -> TypedValue {
    Coercer::new().coerce(raw)
}

/// Value coercer with a fixed notion of "today"
#[derive(Debug, Clone, Copy)]
pub struct Coercer {
    today: NaiveDate,
}

impl Default for Coercer {
    fn default() -> Self {
        Self::new()
    }
}

impl Coercer {
    pub fn new() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    /// Values parsing to this date are not taken as datetimes
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Coerce a raw value to its most specific type. Never fails.
    pub fn coerce(&self, raw: &RawValue) -> TypedValue {
        match raw {
            RawValue::Null => TypedValue::Null,
            RawValue::Float(f) if f.is_nan() => TypedValue::Null,
            RawValue::Bool(b) => TypedValue::Bool(*b),
            RawValue::Integer(i) => TypedValue::Integer(*i),
            RawValue::Decimal(d) => TypedValue::Decimal(*d),
            RawValue::Float(f) => narrow_float(*f),
            RawValue::Timestamp(dt) => TypedValue::DateTime(*dt),
            RawValue::Nested(value) => TypedValue::String(value.to_string()),
            RawValue::Text(text) => self.coerce_text(text),
        }
    }

    fn coerce_text(&self, text: &str) -> TypedValue {
        TEXT_LADDER
            .iter()
            .find_map(|rung| rung(self, text))
            .unwrap_or_else(|| TypedValue::String(text.to_string()))
    }

    fn try_datetime(&self, text: &str) -> Option<TypedValue> {
        let text = text.trim();
        let cleaned = text
            .trim_start_matches('-')
            .trim_start_matches('0')
            .trim_end_matches('.');

        let all_digits = !cleaned.is_empty() && cleaned.bytes().all(|b| b.is_ascii_digit());
        let separators = cleaned.chars().filter(|c| DATE_SEPARATORS.contains(c)).count();
        if separators < 2 && !(all_digits && COMPACT_DATE_LENGTHS.contains(&cleaned.len())) {
            return None;
        }

        let parsed = if text.bytes().all(|b| b.is_ascii_digit()) {
            parse_compact(text.trim_start_matches('0'))
        } else {
            parse_written(text)
        }?;

        let year = parsed.year();
        if parsed.date() == self.today || year <= MIN_YEAR || year >= MAX_YEAR {
            return None;
        }
        Some(TypedValue::DateTime(parsed))
    }

    fn try_integer(&self, text: &str) -> Option<TypedValue> {
        text.trim().parse::<i64>().ok().map(TypedValue::Integer)
    }

    fn try_decimal(&self, text: &str) -> Option<TypedValue> {
        exact_decimal(text.trim()).map(TypedValue::Decimal)
    }

    fn try_float(&self, text: &str) -> Option<TypedValue> {
        text.trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(TypedValue::Float)
    }

    fn try_bool(&self, text: &str) -> Option<TypedValue> {
        let lowered = text.trim().to_lowercase();
        if FALSE_WORDS.contains(&lowered.as_str()) {
            Some(TypedValue::Bool(false))
        } else if TRUE_WORDS.contains(&lowered.as_str()) {
            Some(TypedValue::Bool(true))
        } else {
            None
        }
    }
}

/// Native floats become decimals when their shortest text form fits one
fn narrow_float(f: f64) -> TypedValue {
    if !f.is_finite() {
        return TypedValue::Float(f);
    }
    match exact_decimal(&f.to_string()) {
        Some(d) => TypedValue::Decimal(d),
        None => TypedValue::Float(f),
    }
}

/// Parse a decimal without rounding. Text with more digits than a decimal
/// holds, or with a scale beyond [`MAX_SCALE`], is rejected.
fn exact_decimal(text: &str) -> Option<Decimal> {
    let Some((mantissa, exponent)) = text.split_once(['e', 'E']) else {
        return Decimal::from_str_exact(text).ok();
    };
    let exponent = exponent.parse::<i64>().ok()?;
    let fraction_digits = mantissa.split_once('.').map_or(0, |(_, f)| f.len()) as i64;
    if fraction_digits - exponent > i64::from(MAX_SCALE) {
        return None;
    }
    Decimal::from_str_exact(mantissa).ok()?;
    Decimal::from_scientific(text).ok()
}

/// Parse an all-digit compact timestamp such as `20141010` or `201410101530`
fn parse_compact(digits: &str) -> Option<NaiveDateTime> {
    let field = |from: usize, to: usize| digits.get(from..to)?.parse::<u32>().ok();

    let year = digits.get(0..4)?.parse::<i32>().ok()?;
    let (month, day) = match digits.len() {
        4 => (1, 1),
        6 => (field(4, 6)?, 1),
        _ => (field(4, 6)?, field(6, 8)?),
    };
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    match digits.len() {
        4 | 6 | 8 => date.and_hms_opt(0, 0, 0),
        12 => date.and_hms_opt(field(8, 10)?, field(10, 12)?, 0),
        14 => date.and_hms_opt(field(8, 10)?, field(10, 12)?, field(12, 14)?),
        17 => date.and_hms_milli_opt(
            field(8, 10)?,
            field(10, 12)?,
            field(12, 14)?,
            field(14, 17)?,
        ),
        _ => None,
    }
}

/// Parse a written date or timestamp in one of the common notations
fn parse_written(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
