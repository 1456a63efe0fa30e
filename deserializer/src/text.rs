//! XML Schema lexical forms of the primitive types.

use chrono::{NaiveDate, NaiveDateTime};
use replay_model::{
    value::{DateTime, DateTimeKind, Decimal, QualifiedName, TimeSpan, Uri},
    Primitive, Value,
};
use replay_util::xml::XmlElement;
use uuid::Uuid;

const TICKS_PER_SECOND: i64 = 10_000_000;
const TICKS_PER_MINUTE: i64 = TICKS_PER_SECOND * 60;
const TICKS_PER_HOUR: i64 = TICKS_PER_MINUTE * 60;
const TICKS_PER_DAY: i64 = TICKS_PER_HOUR * 24;

/// Reads `text` as `primitive`. `context` resolves prefixes in qualified
/// names.
pub fn parse_primitive(primitive: Primitive, text: &str, context: &XmlElement) -> Option<Value> {
    let trimmed = text.trim();

    let value = match primitive {
        Primitive::Boolean => Value::Boolean(parse_boolean(trimmed)?),
        Primitive::Byte => Value::Byte(trimmed.parse().ok()?),
        Primitive::SByte => Value::SByte(trimmed.parse().ok()?),
        Primitive::Int16 => Value::Int16(trimmed.parse().ok()?),
        Primitive::UInt16 => Value::UInt16(trimmed.parse().ok()?),
        Primitive::Int32 => Value::Int32(trimmed.parse().ok()?),
        Primitive::UInt32 => Value::UInt32(trimmed.parse().ok()?),
        Primitive::Int64 => Value::Int64(trimmed.parse().ok()?),
        Primitive::UInt64 => Value::UInt64(trimmed.parse().ok()?),
        Primitive::Single => Value::Single(parse_double(trimmed)? as f32),
        Primitive::Double => Value::Double(parse_double(trimmed)?),
        Primitive::Decimal => Value::Decimal(trimmed.parse::<Decimal>().ok()?),
        Primitive::Char => Value::Char(char::from_u32(trimmed.parse().ok()?)?),
        Primitive::String => Value::String(text.to_owned()),
        Primitive::DateTime => Value::DateTime(parse_date_time(trimmed)?),
        Primitive::TimeSpan => Value::TimeSpan(parse_duration(trimmed)?),
        Primitive::Guid => Value::Guid(Uuid::parse_str(trimmed).ok()?),
        Primitive::Uri => Value::Uri(Uri::parse(trimmed)),
        Primitive::QualifiedName => {
            let (namespace, name) = context.resolve_qname(trimmed);
            Value::QualifiedName(QualifiedName::new(name, namespace.unwrap_or_default()))
        }
    };

    Some(value)
}

fn parse_boolean(text: &str) -> Option<bool> {
    match text {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_double(text: &str) -> Option<f64> {
    match text {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => text.parse().ok(),
    }
}

/// `Z` marks a UTC time, a numeric offset a local time and no suffix an
/// unspecified one. The clock reading is kept as written.
pub fn parse_date_time(text: &str) -> Option<DateTime> {
    let (clock, kind) = if let Some(clock) = text.strip_suffix('Z') {
        (clock, DateTimeKind::Utc)
    } else if has_offset(text) {
        (text.get(..text.len() - 6)?, DateTimeKind::Local)
    } else {
        (text, DateTimeKind::Unspecified)
    };

    let value = NaiveDateTime::parse_from_str(clock, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(clock, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)
        })?;

    Some(DateTime::new(value, kind))
}

fn has_offset(text: &str) -> bool {
    let bytes = text.as_bytes();
    let length = bytes.len();

    length > 6
        && text.contains('T')
        && matches!(bytes[length - 6], b'+' | b'-')
        && bytes[length - 3] == b':'
}

/// `xs:duration`, with years and months counted as 365 and 30 days.
pub fn parse_duration(text: &str) -> Option<TimeSpan> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let rest = rest.strip_prefix('P')?;
    let (date, time) = match rest.split_once('T') {
        Some((date, time)) if !time.is_empty() => (date, Some(time)),
        Some(..) => return None,
        None => (rest, None),
    };

    let mut ticks: i64 = 0;
    let mut components = 0;

    for (number, unit) in designators(date)? {
        let number = unsigned(number)?;
        let scale = match unit {
            'Y' => 365 * TICKS_PER_DAY,
            'M' => 30 * TICKS_PER_DAY,
            'D' => TICKS_PER_DAY,
            _ => return None,
        };

        ticks = ticks.checked_add(number.checked_mul(scale)?)?;
        components += 1;
    }

    for (number, unit) in time.map(designators).unwrap_or(Some(Vec::new()))? {
        let component = match unit {
            'H' => unsigned(number)?.checked_mul(TICKS_PER_HOUR)?,
            'M' => unsigned(number)?.checked_mul(TICKS_PER_MINUTE)?,
            'S' => seconds_to_ticks(number)?,
            _ => return None,
        };

        ticks = ticks.checked_add(component)?;
        components += 1;
    }

    if components == 0 {
        return None;
    }

    let ticks = if negative { ticks.checked_neg()? } else { ticks };
    Some(TimeSpan::from_ticks(ticks))
}

fn designators(text: &str) -> Option<Vec<(&str, char)>> {
    let mut result = Vec::new();
    let mut start = 0;

    for (index, character) in text.char_indices() {
        if character.is_ascii_alphabetic() {
            let number = &text[start..index];
            if number.is_empty() {
                return None;
            }

            result.push((number, character));
            start = index + 1;
        }
    }

    if start != text.len() {
        return None;
    }

    Some(result)
}

/// A run of decimal digits; signs are not allowed inside a duration.
fn unsigned(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    text.parse().ok()
}

fn seconds_to_ticks(text: &str) -> Option<i64> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if !fraction.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let whole = if whole.is_empty() { 0 } else { unsigned(whole)? };

    // Ticks are 100ns, so seven fractional digits.
    let mut digits: String = fraction.chars().take(7).collect();
    while digits.len() < 7 {
        digits.push('0');
    }

    whole
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(digits.parse::<i64>().ok()?)
}
