//! CSV record source

use tracing::debug;

use crate::error::{InferError, Result};
use crate::model::{ContentType, RawValue, Record};
use crate::sample::Sample;

use super::RecordSource;

/// Decodes CSV with a header row. Every cell is text.
pub struct CsvSource;

impl RecordSource for CsvSource {
    fn read_records(
        &self,
        sample: &Sample,
        limit: usize,
        _address: Option<&str>,
    ) -> Result<Vec<Record>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(sample.reader());

        let headers = csv_reader
            .headers()
            .map_err(|e| InferError::malformed(format!("failed to read CSV headers: {}", e)))?
            .clone();

        let mut records = Vec::new();
        for (line_num, result) in csv_reader.records().take(limit).enumerate() {
            // +2 for 1-indexing and header
            let row = result.map_err(|e| {
                InferError::malformed(format!("failed to read CSV row {}: {}", line_num + 2, e))
            })?;

            // Short rows omit their trailing fields
            let record: Record = headers
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.to_string(), RawValue::from(cell)))
                .collect();
            records.push(record);
        }

        debug!(records = records.len(), columns = headers.len(), "Decoded CSV");
        Ok(records)
    }

    fn supports(&self, content_type: ContentType) -> bool {
        content_type == ContentType::Csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(data: &str, limit: usize) -> Result<Vec<Record>> {
        let sample = Sample::new(data.as_bytes().to_vec(), false, ContentType::Csv);
        CsvSource.read_records(&sample, limit, None)
    }

    #[test]
    fn test_cells_are_text() {
        let records = read("id,name,amount\n1,foo,2.5\n", 10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], RawValue::Text("1".into()));
        assert_eq!(records[0]["amount"], RawValue::Text("2.5".into()));
        let keys: Vec<&str> = records[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "name", "amount"]);
    }

    #[test]
    fn test_short_rows_omit_fields() {
        let records = read("a,b,c\n1,2,3\n4\n", 10).unwrap();
        assert_eq!(records[1].len(), 1);
        assert!(!records[1].contains_key("b"));
    }

    #[test]
    fn test_empty_cells_are_blank_text() {
        let records = read("a,b\n,x\n", 10).unwrap();
        assert!(records[0]["a"].is_blank());
    }

    #[test]
    fn test_limit() {
        let records = read("n\n1\n2\n3\n4\n", 2).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_header_only() {
        assert!(read("a,b\n", 10).unwrap().is_empty());
        assert!(read("", 10).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let sample = Sample::new(b"a\n\xff\xfe\n".to_vec(), false, ContentType::Csv);
        let err = CsvSource.read_records(&sample, 10, None).unwrap_err();
        assert!(matches!(err, InferError::MalformedSample { .. }));
    }
}
