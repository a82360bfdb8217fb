//! Record sources decoding a sample into flat records

mod csv;
mod excel;
mod json;
mod lineprotocol;
mod parquet;

use crate::error::{InferError, Result};
use crate::model::{ContentType, Record};
use crate::sample::Sample;

pub use self::csv::CsvSource;
pub use self::excel::ExcelSource;
pub use self::json::{JsonSource, NdjsonSource};
pub use self::lineprotocol::LineProtocolSource;
pub use self::parquet::ParquetSource;

/// Trait for decoding a sampled input into records
pub trait RecordSource: Send + Sync {
    /// Decode at most `limit` records from the sample, preserving field order.
    /// `address` names a sub-resource such as a worksheet.
    fn read_records(
        &self,
        sample: &Sample,
        limit: usize,
        address: Option<&str>,
    ) -> Result<Vec<Record>>;

    /// Check if this source can decode the given content type
    fn supports(&self, content_type: ContentType) -> bool;
}

/// Factory for picking a record source by content type
pub struct RecordSourceFactory {
    sources: Vec<Box<dyn RecordSource>>,
}

impl Default for RecordSourceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSourceFactory {
    /// Create a new factory with all supported sources
    pub fn new() -> Self {
        Self {
            sources: vec![
                Box::new(CsvSource),
                Box::new(JsonSource),
                Box::new(NdjsonSource),
                Box::new(LineProtocolSource),
                Box::new(ExcelSource),
                Box::new(ParquetSource),
            ],
        }
    }

    /// Get the source for the given content type
    pub fn source_for(&self, content_type: ContentType) -> Result<&dyn RecordSource> {
        self.sources
            .iter()
            .find(|source| source.supports(content_type))
            .map(|source| source.as_ref())
            .ok_or(InferError::UnsupportedContentType(content_type))
    }

    /// Decode a sample using the appropriate source
    pub fn read_records(
        &self,
        sample: &Sample,
        limit: usize,
        address: Option<&str>,
    ) -> Result<Vec<Record>> {
        self.source_for(sample.content_type())?
            .read_records(sample, limit, address)
    }
}
