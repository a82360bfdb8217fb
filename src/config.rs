//! Configuration handling for schemapeek

use crate::model::ContentType;

/// How many lines/records to read from input data
pub const PEEK_LINES: usize = 100;

/// How many bytes to read from input data
pub const PEEK_BYTES: u64 = PEEK_LINES as u64 * 130;

/// Ceiling for inputs that must be read as a whole (spreadsheets, Parquet, JSON documents)
pub const MAX_DOCUMENT_BYTES: u64 = 256 * 1024 * 1024;

/// Output format for the inferred schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Configuration for one inference run
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit content type; overrides detection from the file name
    pub content_type: Option<ContentType>,
    /// Sub-resource address, e.g. a sheet name or index within a spreadsheet
    pub address: Option<String>,
    /// Table name; derived from the file name when absent
    pub table_name: Option<String>,
    /// Primary key; inferred from the data when absent
    pub primary_key: Option<String>,
    /// Maximum number of bytes sampled from line-oriented input
    pub peek_bytes: u64,
    /// Maximum number of lines/records sampled
    pub peek_lines: usize,
    /// Maximum number of bytes buffered for whole-document reads
    pub max_document_bytes: u64,
    /// Input is gzip compressed. Implied by a `.gz` file name.
    pub gzip: bool,
    /// Output format
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_type: None,
            address: None,
            table_name: None,
            primary_key: None,
            peek_bytes: PEEK_BYTES,
            peek_lines: PEEK_LINES,
            max_document_bytes: MAX_DOCUMENT_BYTES,
            gzip: false,
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Create a new Config with default sampling limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content type explicitly
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Address a sub-resource, like a sheet within a spreadsheet
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the table name
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    /// Set the primary key, skipping detection
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Set the byte budget for sampling
    pub fn with_peek_bytes(mut self, bytes: u64) -> Self {
        self.peek_bytes = bytes;
        self
    }

    /// Set the line/record budget for sampling
    pub fn with_peek_lines(mut self, lines: usize) -> Self {
        self.peek_lines = lines;
        self
    }

    /// Set the ceiling for whole-document reads
    pub fn with_max_document_bytes(mut self, bytes: u64) -> Self {
        self.max_document_bytes = bytes;
        self
    }

    /// Decompress the input with gzip before sampling
    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    /// Set output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.peek_lines, 100);
        assert_eq!(config.peek_bytes, 13_000);
        assert_eq!(config.content_type, None);
        assert!(!config.gzip);
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_content_type(ContentType::Xlsx)
            .with_address("Sheet2")
            .with_peek_lines(5)
            .with_gzip(true)
            .with_output_format(OutputFormat::Json);
        assert_eq!(config.content_type, Some(ContentType::Xlsx));
        assert_eq!(config.address.as_deref(), Some("Sheet2"));
        assert_eq!(config.peek_lines, 5);
        assert!(config.gzip);
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("html".parse::<OutputFormat>().is_err());
    }
}
