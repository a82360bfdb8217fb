//! InfluxDB line protocol record source
//!
//! Each line reads `measurement[,tag=value...] field=value[,field=value...] [timestamp]`.
//! A record carries `time` first, then the tags, then the fields. The
//! measurement name is not part of the record.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{ContentType, RawValue, Record};
use crate::sample::Sample;

use super::RecordSource;

/// Decodes line protocol, skipping lines that do not parse
pub struct LineProtocolSource;

impl RecordSource for LineProtocolSource {
    fn read_records(
        &self,
        sample: &Sample,
        limit: usize,
        _address: Option<&str>,
    ) -> Result<Vec<Record>> {
        let text = String::from_utf8_lossy(sample.bytes());
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for line in text.lines().map(str::trim) {
            if records.len() >= limit {
                break;
            }
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    skipped += 1;
                    warn!(line, %reason, "Skipping invalid line protocol item");
                }
            }
        }

        debug!(records = records.len(), skipped, "Decoded line protocol");
        Ok(records)
    }

    fn supports(&self, content_type: ContentType) -> bool {
        content_type == ContentType::LineProtocol
    }
}

fn parse_line(line: &str) -> std::result::Result<Record, String> {
    let sections = split_unescaped(line, ' ', 3, true);
    let (series, fields) = match sections.as_slice() {
        [series, fields, ..] => (*series, *fields),
        _ => return Err("missing field set".to_string()),
    };

    let time = match sections.get(2).map(|t| t.trim()) {
        Some(ts) if !ts.is_empty() => RawValue::Integer(
            ts.parse::<i64>()
                .map_err(|_| format!("invalid timestamp '{}'", ts))?,
        ),
        _ => RawValue::Null,
    };

    let mut record = Record::new();
    record.insert("time".to_string(), time);

    let mut series_parts = split_unescaped(series, ',', usize::MAX, false).into_iter();
    if series_parts.next().map_or(true, str::is_empty) {
        return Err("missing measurement".to_string());
    }
    for tag in series_parts {
        let (key, value) = key_value(tag)?;
        record.insert(key, RawValue::Text(unescape(value)));
    }

    let mut field_count = 0;
    for field in split_unescaped(fields, ',', usize::MAX, true) {
        let (key, value) = key_value(field)?;
        record.insert(key, field_value(value)?);
        field_count += 1;
    }
    if field_count == 0 {
        return Err("missing field set".to_string());
    }

    Ok(record)
}

/// Split on `separator`, honoring backslash escapes and, optionally, double
/// quotes. At most `limit` parts are returned; the last one keeps the rest.
fn split_unescaped(text: &str, separator: char, limit: usize, quotes: bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    let mut quoted = false;

    for (idx, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' if quotes => quoted = !quoted,
            c if c == separator && !quoted && parts.len() + 1 < limit => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn key_value(pair: &str) -> std::result::Result<(String, &str), String> {
    match split_unescaped(pair, '=', 2, false).as_slice() {
        [key, value] if !key.is_empty() && !value.is_empty() => Ok((unescape(key), *value)),
        _ => Err(format!("invalid key/value pair '{}'", pair)),
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn field_value(value: &str) -> std::result::Result<RawValue, String> {
    if let Some(inner) = value.strip_prefix('"') {
        return inner
            .strip_suffix('"')
            .map(|s| RawValue::Text(unescape(s)))
            .ok_or_else(|| format!("unterminated string '{}'", value));
    }
    if let Some(digits) = value.strip_suffix('i') {
        return digits
            .parse::<i64>()
            .map(RawValue::Integer)
            .map_err(|_| format!("invalid integer '{}'", value));
    }
    if let Some(digits) = value.strip_suffix('u') {
        let unsigned = digits
            .parse::<u64>()
            .map_err(|_| format!("invalid unsigned integer '{}'", value))?;
        return Ok(match i64::try_from(unsigned) {
            Ok(i) => RawValue::Integer(i),
            Err(_) => RawValue::Decimal(Decimal::from(unsigned)),
        });
    }
    match value {
        "t" | "T" | "true" | "True" | "TRUE" => return Ok(RawValue::Bool(true)),
        "f" | "F" | "false" | "False" | "FALSE" => return Ok(RawValue::Bool(false)),
        _ => {}
    }
    value
        .parse::<f64>()
        .map(RawValue::Float)
        .map_err(|_| format!("invalid field value '{}'", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(data: &str, limit: usize) -> Vec<Record> {
        let sample = Sample::new(data.as_bytes().to_vec(), false, ContentType::LineProtocol);
        LineProtocolSource.read_records(&sample, limit, None).unwrap()
    }

    #[test]
    fn test_record_layout() {
        let records = read(
            "market,fruits=apple name=\"Golden\",id=1i,price=0.42 1556813561098000000\n",
            10,
        );
        assert_eq!(records.len(), 1);
        let record = &records[0];
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["time", "fruits", "name", "id", "price"]);
        assert_eq!(record["time"], RawValue::Integer(1556813561098000000));
        assert_eq!(record["fruits"], RawValue::Text("apple".into()));
        assert_eq!(record["name"], RawValue::Text("Golden".into()));
        assert_eq!(record["id"], RawValue::Integer(1));
        assert_eq!(record["price"], RawValue::Float(0.42));
    }

    #[test]
    fn test_escapes_and_quoted_spaces() {
        let records = read(
            "weather,location=New\\ York,kind=a\\,b note=\"hot \\\"day\\\", really\",ok=t\n",
            10,
        );
        let record = &records[0];
        assert_eq!(record["location"], RawValue::Text("New York".into()));
        assert_eq!(record["kind"], RawValue::Text("a,b".into()));
        assert_eq!(record["note"], RawValue::Text("hot \"day\", really".into()));
        assert_eq!(record["ok"], RawValue::Bool(true));
        assert_eq!(record["time"], RawValue::Null);
    }

    #[test]
    fn test_invalid_lines_are_skipped() {
        let data = "\
# comment
cpu usage=1.5 1000
garbage
cpu usage=oops 1001
cpu,host usage=2 1002
cpu usage=2.5 notatime
cpu usage=3.5 1003
";
        let records = read(data, 10);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["time"], RawValue::Integer(1003));
    }

    #[test]
    fn test_unsigned_and_limit() {
        let data = "m v=1u 1\nm v=18446744073709551615u 2\nm v=3u 3\n";
        let records = read(data, 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["v"], RawValue::Integer(1));
        assert_eq!(records[1]["v"], RawValue::Decimal(Decimal::from(u64::MAX)));
    }
}
