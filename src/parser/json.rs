//! JSON document and newline-delimited JSON record sources

use serde_json::Value;
use tracing::debug;

use crate::error::{InferError, Result};
use crate::model::{ContentType, Record};
use crate::sample::{first_json_records, json_object_to_record, Sample};

use super::RecordSource;

/// Decodes a JSON document: an array of objects, or a single object
pub struct JsonSource;

impl RecordSource for JsonSource {
    fn read_records(
        &self,
        sample: &Sample,
        limit: usize,
        _address: Option<&str>,
    ) -> Result<Vec<Record>> {
        first_json_records(sample.bytes(), limit)
    }

    fn supports(&self, content_type: ContentType) -> bool {
        content_type == ContentType::Json
    }
}

/// Decodes one JSON object per line (NDJSON, JSONL, LDJSON)
pub struct NdjsonSource;

impl RecordSource for NdjsonSource {
    fn read_records(
        &self,
        sample: &Sample,
        limit: usize,
        _address: Option<&str>,
    ) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let lines = sample
            .bytes()
            .split(|b| *b == b'\n')
            .enumerate()
            .filter(|(_, line)| !line.iter().all(u8::is_ascii_whitespace));

        for (line_num, line) in lines.take(limit) {
            let value: Value = serde_json::from_slice(line).map_err(|e| {
                InferError::malformed(format!("invalid JSON on line {}: {}", line_num + 1, e))
            })?;
            match value {
                Value::Object(object) => records.push(json_object_to_record(object)),
                other => {
                    return Err(InferError::malformed(format!(
                        "line {} is not a JSON object: {}",
                        line_num + 1,
                        other
                    )))
                }
            }
        }

        debug!(records = records.len(), "Decoded NDJSON");
        Ok(records)
    }

    fn supports(&self, content_type: ContentType) -> bool {
        content_type.is_ndjson()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawValue;

    fn ndjson(data: &str, limit: usize) -> Result<Vec<Record>> {
        let sample = Sample::new(data.as_bytes().to_vec(), false, ContentType::Ndjson);
        NdjsonSource.read_records(&sample, limit, None)
    }

    #[test]
    fn test_document() {
        let sample = Sample::new(
            br#"[{"id": 1}, {"id": 2}, {"id": 3}]"#.to_vec(),
            false,
            ContentType::Json,
        );
        let records = JsonSource.read_records(&sample, 2, None).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["id"], RawValue::Integer(2));
    }

    #[test]
    fn test_ndjson_lines() {
        let records = ndjson("{\"a\": 1, \"b\": \"x\"}\n\n{\"a\": 2}\r\n", 10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["b"], RawValue::Text("x".into()));
        assert!(!records[1].contains_key("b"));
    }

    #[test]
    fn test_ndjson_limit() {
        let records = ndjson("{\"a\": 1}\n{\"a\": 2}\n{\"a\": 3}\n", 2).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_ndjson_rejects_non_objects() {
        let err = ndjson("{\"a\": 1}\n[1, 2]\n", 10).unwrap_err();
        assert!(matches!(err, InferError::MalformedSample { .. }));

        let err = ndjson("{\"a\": \n", 10).unwrap_err();
        assert!(matches!(err, InferError::MalformedSample { .. }));
    }

    #[test]
    fn test_supported_aliases() {
        assert!(NdjsonSource.supports(ContentType::Jsonl));
        assert!(NdjsonSource.supports(ContentType::Ldjson));
        assert!(!NdjsonSource.supports(ContentType::Json));
        assert!(JsonSource.supports(ContentType::Json));
    }
}
