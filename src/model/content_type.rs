//! Content type classification
//!
//! The pipeline never inspects values to pick a decoder. Callers hand in an
//! explicit [`ContentType`], derived from a name, a MIME type or a file name.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InferError, Result};

/// Supported input content types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentType {
    Csv,
    Grib2,
    Json,
    NetCdf,
    Ndjson,
    LineProtocol,
    Ods,
    Parquet,
    Xlsx,
    // NDJSON aliases
    Jsonl,
    Ldjson,
    // Compressed container around one of the above
    Gzip,
}

impl ContentType {
    /// All content types, primary definitions first
    pub const ALL: [ContentType; 12] = [
        ContentType::Csv,
        ContentType::Grib2,
        ContentType::Json,
        ContentType::NetCdf,
        ContentType::Ndjson,
        ContentType::LineProtocol,
        ContentType::Ods,
        ContentType::Parquet,
        ContentType::Xlsx,
        ContentType::Jsonl,
        ContentType::Ldjson,
        ContentType::Gzip,
    ];

    /// Canonical upper-case name
    pub fn name(&self) -> &'static str {
        match self {
            ContentType::Csv => "CSV",
            ContentType::Grib2 => "GRIB2",
            ContentType::Json => "JSON",
            ContentType::NetCdf => "NETCDF",
            ContentType::Ndjson => "NDJSON",
            ContentType::LineProtocol => "LINEPROTOCOL",
            ContentType::Ods => "ODS",
            ContentType::Parquet => "PARQUET",
            ContentType::Xlsx => "XLSX",
            ContentType::Jsonl => "JSONL",
            ContentType::Ldjson => "LDJSON",
            ContentType::Gzip => "GZIP",
        }
    }

    /// MIME type. Several of these are not officially registered.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ContentType::Csv => "text/csv",
            ContentType::Grib2 => "application/x-grib2",
            ContentType::Json => "application/json",
            ContentType::NetCdf => "application/x-netcdf",
            ContentType::Ndjson | ContentType::Jsonl => "application/x-ndjson",
            ContentType::LineProtocol => "application/vnd.influxdata.lineprotocol",
            ContentType::Ods => "application/vnd.oasis.opendocument.spreadsheet",
            ContentType::Parquet => "application/vnd.apache.parquet",
            ContentType::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ContentType::Ldjson => "application/x-ldjson",
            ContentType::Gzip => "application/gzip",
        }
    }

    /// File name suffixes, the canonical one first
    pub fn suffixes(&self) -> &'static [&'static str] {
        match self {
            ContentType::Csv => &[".csv"],
            ContentType::Grib2 => &[".grib2"],
            ContentType::Json => &[".json"],
            ContentType::NetCdf => &[".nc", ".netcdf"],
            ContentType::Ndjson => &[".ndjson"],
            ContentType::LineProtocol => &[".lp", ".lineprotocol"],
            ContentType::Ods => &[".ods"],
            ContentType::Parquet => &[".parquet", ".parq", ".pq"],
            ContentType::Xlsx => &[".xlsx"],
            ContentType::Jsonl => &[".jsonl"],
            ContentType::Ldjson => &[".ldjson", ".ldj"],
            ContentType::Gzip => &[".gz"],
        }
    }

    /// Canonical file suffix. NDJSON aliases report `.ndjson`.
    pub fn suffix(&self) -> &'static str {
        if self.is_ndjson() {
            return ".ndjson";
        }
        self.suffixes()[0]
    }

    /// Derive a content type from its name or MIME type, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self> {
        let needle = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|ct| ct.name().eq_ignore_ascii_case(needle))
            .or_else(|| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|ct| ct.mime_type().eq_ignore_ascii_case(needle))
            })
            .ok_or_else(|| {
                InferError::UnknownContentType(format!(
                    "'{}' is not a valid content type or MIME type",
                    name
                ))
            })
    }

    /// Derive a content type from a file name extension.
    pub fn from_filename(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        Self::ALL
            .iter()
            .copied()
            .find(|ct| ct.suffixes().contains(&ext.as_str()))
            .ok_or_else(|| {
                InferError::UnknownContentType(format!(
                    "unable to guess content type from '{}'",
                    path.display()
                ))
            })
    }

    /// NDJSON and its aliases (JSON Lines, LDJSON)
    pub fn is_ndjson(&self) -> bool {
        matches!(
            self,
            ContentType::Ndjson | ContentType::Jsonl | ContentType::Ldjson
        )
    }

    /// Binary and self-describing formats that cannot be cut on line
    /// boundaries and must be read as a whole.
    pub fn requires_whole_read(&self) -> bool {
        matches!(
            self,
            ContentType::Grib2
                | ContentType::NetCdf
                | ContentType::Ods
                | ContentType::Xlsx
                | ContentType::Parquet
        )
    }

    /// Compressed containers. The content type of the payload cannot be
    /// derived from these and has to be given explicitly.
    pub fn is_container(&self) -> bool {
        matches!(self, ContentType::Gzip)
    }

    /// Shapes without a natural row identity, such as multi-dimensional grids.
    /// Primary key detection is skipped for these.
    pub fn no_autopk(&self) -> bool {
        matches!(self, ContentType::Grib2 | ContentType::NetCdf)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ContentType {
    type Err = InferError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(ContentType::from_name("csv").unwrap(), ContentType::Csv);
        assert_eq!(ContentType::from_name("CSV").unwrap(), ContentType::Csv);
        assert_eq!(ContentType::from_name("text/csv").unwrap(), ContentType::Csv);
        assert_eq!(
            ContentType::from_name("application/x-ldjson").unwrap(),
            ContentType::Ldjson
        );
        assert_eq!(
            ContentType::from_name("application/gzip").unwrap(),
            ContentType::Gzip
        );
        assert_eq!(
            ContentType::from_name("lineprotocol").unwrap(),
            ContentType::LineProtocol
        );
    }

    #[test]
    fn test_from_name_unknown() {
        let err = ContentType::from_name("xml").unwrap_err();
        assert!(matches!(err, InferError::UnknownContentType(_)));
    }

    #[test]
    fn test_from_filename() {
        assert_eq!(
            ContentType::from_filename(Path::new("foo.csv")).unwrap(),
            ContentType::Csv
        );
        assert_eq!(
            ContentType::from_filename(Path::new("data/air-sensor-data.lp")).unwrap(),
            ContentType::LineProtocol
        );
        assert_eq!(
            ContentType::from_filename(Path::new("DATA.PARQ")).unwrap(),
            ContentType::Parquet
        );
        assert_eq!(
            ContentType::from_filename(Path::new("sales.csv.gz")).unwrap(),
            ContentType::Gzip
        );
        assert!(ContentType::from_filename(Path::new("README")).is_err());
        assert!(ContentType::from_filename(Path::new("index.html")).is_err());
    }

    #[test]
    fn test_suffix_of_ndjson_aliases() {
        assert_eq!(ContentType::Jsonl.suffix(), ".ndjson");
        assert_eq!(ContentType::Ldjson.suffix(), ".ndjson");
        assert_eq!(ContentType::NetCdf.suffix(), ".nc");
    }

    #[test]
    fn test_groups() {
        assert!(ContentType::Xlsx.requires_whole_read());
        assert!(ContentType::Parquet.requires_whole_read());
        assert!(!ContentType::Csv.requires_whole_read());
        assert!(ContentType::Grib2.no_autopk());
        assert!(!ContentType::Json.no_autopk());
        assert!(ContentType::Jsonl.is_ndjson());
        assert!(!ContentType::Json.is_ndjson());
        assert!(ContentType::Gzip.is_container());
        assert!(!ContentType::Gzip.requires_whole_read());
        assert!(!ContentType::Csv.is_container());
    }
}
