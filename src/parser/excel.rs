//! Spreadsheet record source (xlsx, ods)

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{InferError, Result};
use crate::model::{ContentType, RawValue, Record};
use crate::sample::Sample;

use super::RecordSource;

/// Decodes one worksheet. The first row is the header.
pub struct ExcelSource;

impl RecordSource for ExcelSource {
    fn read_records(
        &self,
        sample: &Sample,
        limit: usize,
        address: Option<&str>,
    ) -> Result<Vec<Record>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(sample.bytes().to_vec()))
            .map_err(|e| InferError::malformed(format!("failed to open workbook: {}", e)))?;

        let sheet_name = resolve_sheet(&workbook.sheet_names(), address)?;
        debug!(sheet = %sheet_name, "Reading worksheet");

        let range: Range<Data> = workbook.worksheet_range(&sheet_name).map_err(|e| {
            InferError::malformed(format!("failed to read sheet {}: {}", sheet_name, e))
        })?;

        Ok(range_to_records(&range, limit))
    }

    fn supports(&self, content_type: ContentType) -> bool {
        matches!(content_type, ContentType::Xlsx | ContentType::Ods)
    }
}

/// Pick a sheet by name or zero-based index; the first sheet by default.
fn resolve_sheet(sheets: &[String], address: Option<&str>) -> Result<String> {
    let Some(address) = address else {
        return sheets
            .first()
            .cloned()
            .ok_or_else(|| InferError::malformed("no sheets found in workbook"));
    };

    if let Some(name) = sheets.iter().find(|name| name.as_str() == address) {
        return Ok(name.clone());
    }
    address
        .parse::<usize>()
        .ok()
        .and_then(|idx| sheets.get(idx).cloned())
        .ok_or_else(|| {
            InferError::malformed(format!(
                "no sheet '{}' in workbook, available: {}",
                address,
                sheets.join(", ")
            ))
        })
}

fn range_to_records(range: &Range<Data>, limit: usize) -> Vec<Record> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };

    let names: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = cell_to_string(cell);
            if name.trim().is_empty() {
                format!("Column{}", i + 1)
            } else {
                name
            }
        })
        .collect();

    rows.take(limit)
        .map(|row| {
            names
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.clone(), convert_cell(cell)))
                .collect()
        })
        .collect()
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

fn convert_cell(cell: &Data) -> RawValue {
    match cell {
        // Blank cells read as empty text, like a loosely typed reader would
        Data::Empty => RawValue::Text(String::new()),
        Data::String(s) => RawValue::Text(s.clone()),
        Data::Float(f) => {
            // Check if it's actually an integer
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                RawValue::Integer(*f as i64)
            } else {
                RawValue::Float(*f)
            }
        }
        Data::Int(i) => RawValue::Integer(*i),
        Data::Bool(b) => RawValue::Bool(*b),
        Data::DateTime(dt) => match serial_to_datetime(dt.as_f64()) {
            Some(datetime) => RawValue::Timestamp(datetime),
            None => RawValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
        Data::Error(e) => RawValue::Text(format!("#{:?}", e)),
    }
}

/// Spreadsheet serial dates count days since 1899-12-30
fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let millis = ((serial - serial.trunc()) * 86_400_000.0).round() as i64;
    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::milliseconds(millis))
}
