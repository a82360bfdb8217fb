//! Parquet record source

use arrow::array::{
    Array, ArrayRef, ArrowPrimitiveType, BooleanArray, LargeStringArray, PrimitiveArray,
    StringArray,
};
use arrow::datatypes::{
    DataType as ArrowType, Date32Type, Date64Type, Decimal128Type, Float32Type, Float64Type,
    Int16Type, Int32Type, Int64Type, Int8Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::temporal_conversions::{
    date32_to_datetime, date64_to_datetime, timestamp_ms_to_datetime, timestamp_ns_to_datetime,
    timestamp_s_to_datetime, timestamp_us_to_datetime,
};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{InferError, Result};
use crate::model::{ContentType, RawValue, Record};
use crate::sample::Sample;

use super::RecordSource;

/// Decodes the leading rows of a Parquet file
pub struct ParquetSource;

impl RecordSource for ParquetSource {
    fn read_records(
        &self,
        sample: &Sample,
        limit: usize,
        _address: Option<&str>,
    ) -> Result<Vec<Record>> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(sample.bytes().to_vec()))
            .map_err(|e| InferError::malformed(format!("failed to create Parquet reader: {}", e)))?;

        let schema = builder.schema().clone();
        let reader = builder
            .with_batch_size(limit.max(1))
            .with_limit(limit)
            .build()
            .map_err(|e| InferError::malformed(format!("failed to build Parquet reader: {}", e)))?;

        let mut records = Vec::new();
        for batch_result in reader {
            let batch = batch_result
                .map_err(|e| InferError::malformed(format!("failed to read Parquet batch: {}", e)))?;

            for row_idx in 0..batch.num_rows() {
                if records.len() >= limit {
                    break;
                }
                let record: Record = schema
                    .fields()
                    .iter()
                    .zip(batch.columns())
                    .map(|(field, column)| (field.name().clone(), extract_value(column, row_idx)))
                    .collect();
                records.push(record);
            }
        }

        debug!(records = records.len(), columns = schema.fields().len(), "Decoded Parquet");
        Ok(records)
    }

    fn supports(&self, content_type: ContentType) -> bool {
        content_type == ContentType::Parquet
    }
}

fn primitive<T: ArrowPrimitiveType>(array: &ArrayRef, row_idx: usize) -> Option<T::Native> {
    array
        .as_any()
        .downcast_ref::<PrimitiveArray<T>>()
        .map(|arr| arr.value(row_idx))
}

fn extract_value(array: &ArrayRef, row_idx: usize) -> RawValue {
    if array.is_null(row_idx) {
        return RawValue::Null;
    }

    let value = match array.data_type() {
        ArrowType::Boolean => array
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|arr| RawValue::Bool(arr.value(row_idx))),
        ArrowType::Int8 => primitive::<Int8Type>(array, row_idx).map(|v| RawValue::Integer(v.into())),
        ArrowType::Int16 => {
            primitive::<Int16Type>(array, row_idx).map(|v| RawValue::Integer(v.into()))
        }
        ArrowType::Int32 => {
            primitive::<Int32Type>(array, row_idx).map(|v| RawValue::Integer(v.into()))
        }
        ArrowType::Int64 => primitive::<Int64Type>(array, row_idx).map(RawValue::Integer),
        ArrowType::UInt8 => {
            primitive::<UInt8Type>(array, row_idx).map(|v| RawValue::Integer(v.into()))
        }
        ArrowType::UInt16 => {
            primitive::<UInt16Type>(array, row_idx).map(|v| RawValue::Integer(v.into()))
        }
        ArrowType::UInt32 => {
            primitive::<UInt32Type>(array, row_idx).map(|v| RawValue::Integer(v.into()))
        }
        ArrowType::UInt64 => primitive::<UInt64Type>(array, row_idx).map(|v| {
            i64::try_from(v)
                .map(RawValue::Integer)
                .unwrap_or_else(|_| RawValue::Decimal(Decimal::from(v)))
        }),
        // Go through the shortest text form so 0.42f32 stays 0.42
        ArrowType::Float32 => primitive::<Float32Type>(array, row_idx)
            .map(|v| RawValue::Float(v.to_string().parse().unwrap_or(f64::from(v)))),
        ArrowType::Float64 => primitive::<Float64Type>(array, row_idx).map(RawValue::Float),
        ArrowType::Decimal128(_, scale) if *scale >= 0 => {
            primitive::<Decimal128Type>(array, row_idx).and_then(|v| {
                Decimal::try_from_i128_with_scale(v, *scale as u32)
                    .ok()
                    .map(RawValue::Decimal)
            })
        }
        ArrowType::Utf8 => array
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|arr| RawValue::Text(arr.value(row_idx).to_string())),
        ArrowType::LargeUtf8 => array
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .map(|arr| RawValue::Text(arr.value(row_idx).to_string())),
        ArrowType::Date32 => {
            primitive::<Date32Type>(array, row_idx).and_then(date32_to_datetime).map(RawValue::Timestamp)
        }
        ArrowType::Date64 => {
            primitive::<Date64Type>(array, row_idx).and_then(date64_to_datetime).map(RawValue::Timestamp)
        }
        ArrowType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => primitive::<TimestampSecondType>(array, row_idx)
                    .and_then(timestamp_s_to_datetime),
                TimeUnit::Millisecond => primitive::<TimestampMillisecondType>(array, row_idx)
                    .and_then(timestamp_ms_to_datetime),
                TimeUnit::Microsecond => primitive::<TimestampMicrosecondType>(array, row_idx)
                    .and_then(timestamp_us_to_datetime),
                TimeUnit::Nanosecond => primitive::<TimestampNanosecondType>(array, row_idx)
                    .and_then(timestamp_ns_to_datetime),
            };
            datetime.map(RawValue::Timestamp)
        }
        _ => None,
    };

    value.unwrap_or_else(|| format_value(array, row_idx))
}

/// Fallback: render the value as text
fn format_value(array: &ArrayRef, row_idx: usize) -> RawValue {
    match ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default()) {
        Ok(formatter) => RawValue::Text(formatter.value(row_idx).to_string()),
        Err(_) => RawValue::Null,
    }
}
