//! The inference pipeline: sample, decode, profile, pick a primary key

mod coerce;
mod profile;

use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{InferError, ProfileWarning, Result};
use crate::model::{select_primary_key, ContentType, Schema};
use crate::parser::RecordSourceFactory;
use crate::sample::Sampler;

pub use self::coerce::{coerce, Coercer};
pub use self::profile::{profile_records, ColumnAccumulator, Profile, Profiler, UniqueTracker};

/// Everything learned from one input
#[derive(Debug, Clone)]
pub struct Inference {
    pub schema: Schema,
    pub content_type: ContentType,
    /// Number of records the schema was inferred from
    pub record_count: usize,
    /// Whether the input continued past the sampled window
    pub truncated: bool,
    pub warnings: Vec<ProfileWarning>,
}

/// Infers schemas from input streams.
///
/// One inferrer owns the counter used to name anonymous tables, so inputs
/// without a name get `table1`, `table2`, ... in the order they are seen.
pub struct SchemaInferrer {
    config: Config,
    sources: RecordSourceFactory,
    coercer: Coercer,
    anonymous_tables: usize,
}

impl SchemaInferrer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sources: RecordSourceFactory::new(),
            coercer: Coercer::new(),
            anonymous_tables: 0,
        }
    }

    /// Use a fixed coercer, e.g. one with a pinned current date
    pub fn with_coercer(mut self, coercer: Coercer) -> Self {
        self.coercer = coercer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Infer the schema of `reader`. `path` names the input, if it has a name.
    pub fn infer<R: Read>(&mut self, reader: R, path: Option<&Path>) -> Result<Schema> {
        self.infer_detailed(reader, path).map(|inference| inference.schema)
    }

    /// Like [`infer`](Self::infer), also reporting sampling details and
    /// profiling warnings.
    pub fn infer_detailed<R: Read>(&mut self, reader: R, path: Option<&Path>) -> Result<Inference> {
        let gzip = self.config.gzip || path.is_some_and(is_gzip_path);
        let content_type = self.resolve_content_type(path, gzip)?;
        info!(%content_type, gzip, "Inferring schema");

        let source = self.sources.source_for(content_type)?;
        let sampler = Sampler::from_config(&self.config);
        let sample = if gzip {
            sampler.sample(GzDecoder::new(reader), content_type)?
        } else {
            sampler.sample(reader, content_type)?
        };

        let records =
            source.read_records(&sample, self.config.peek_lines, self.config.address.as_deref())?;
        if records.is_empty() {
            return Err(InferError::EmptySample);
        }
        debug!(records = records.len(), "Decoded records");

        let profile = profile_records(&records, self.config.peek_lines, self.coercer);

        let primary_key = match &self.config.primary_key {
            Some(pk) => Some(pk.clone()),
            None => {
                let names: Vec<&str> = profile.columns.iter().map(|c| c.name.as_str()).collect();
                select_primary_key(&names, profile.columns.first(), content_type)
            }
        };

        let table_name = self.table_name(path, gzip);
        Ok(Inference {
            schema: Schema::new(table_name, profile.columns, primary_key),
            content_type,
            record_count: records.len(),
            truncated: sample.is_truncated(),
            warnings: profile.warnings,
        })
    }

    fn resolve_content_type(&self, path: Option<&Path>, gzip: bool) -> Result<ContentType> {
        let content_type = match (self.config.content_type, path) {
            (Some(content_type), _) => content_type,
            (None, _) if gzip => ContentType::Gzip,
            (None, Some(path)) => ContentType::from_filename(path)?,
            (None, None) => {
                return Err(InferError::UnknownContentType(
                    "no file name to detect it from".to_string(),
                ))
            }
        };
        if content_type.is_container() {
            return Err(InferError::UnknownContentType(format!(
                "the content type of {} input has to be given explicitly",
                content_type
            )));
        }
        Ok(content_type)
    }

    fn table_name(&mut self, path: Option<&Path>, gzip: bool) -> String {
        if let Some(name) = &self.config.table_name {
            return name.clone();
        }
        let mut stem = path.and_then(|p| p.file_stem());
        if gzip {
            // `sales.csv.gz` names the table `sales`
            stem = stem.and_then(|s| Path::new(s).file_stem());
        }
        let stem = stem.and_then(|s| s.to_str()).filter(|s| !s.is_empty());
        match stem {
            Some(stem) => stem.to_string(),
            None => {
                self.anonymous_tables += 1;
                format!("table{}", self.anonymous_tables)
            }
        }
    }
}

fn is_gzip_path(path: &Path) -> bool {
    matches!(ContentType::from_filename(path), Ok(ct) if ct.is_container())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TypedValue, ValueKind};
    use chrono::NaiveDate;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzipped(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn inferrer(config: Config) -> SchemaInferrer {
        SchemaInferrer::new(config)
            .with_coercer(Coercer::with_today(NaiveDate::from_ymd_opt(2020, 6, 15).unwrap()))
    }

    #[test]
    fn test_json_scenario() {
        let data = br#"[{"id":1,"name":"foo"},{"id":2,"name":"bar"}]"#;
        let schema = inferrer(Config::new())
            .infer(&data[..], Some(Path::new("people.json")))
            .unwrap();
        assert_eq!(schema.table_name, "people");
        assert_eq!(schema.primary_key.as_deref(), Some("id"));
        let id = schema.column("id").unwrap();
        assert_eq!(id.kind(), ValueKind::Integer);
        assert!(!id.nullable && id.unique);
        let name = schema.column("name").unwrap();
        assert_eq!(name.kind(), ValueKind::String);
        assert!(!name.nullable && name.unique);
    }

    #[test]
    fn test_duplicate_first_column_has_no_key() {
        let data = br#"[{"x":1},{"x":2},{"x":2}]"#;
        let schema = inferrer(Config::new())
            .infer(&data[..], Some(Path::new("x.json")))
            .unwrap();
        assert_eq!(schema.primary_key, None);
        assert!(!schema.columns[0].unique);
    }

    #[test]
    fn test_csv_input() {
        let data = b"code,amount,when\nA1,1.5,2014-10-31\nB2,-20.25,2014-11-01\n";
        let inference = inferrer(Config::new())
            .infer_detailed(&data[..], Some(Path::new("sales.csv")))
            .unwrap();
        assert_eq!(inference.content_type, ContentType::Csv);
        assert_eq!(inference.record_count, 2);
        assert!(!inference.truncated);

        let schema = inference.schema;
        assert_eq!(schema.column_names(), vec!["code", "amount", "when"]);
        assert_eq!(schema.columns[1].kind(), ValueKind::Decimal);
        assert_eq!(schema.columns[2].kind(), ValueKind::DateTime);
        assert_eq!(schema.primary_key.as_deref(), Some("code"));
    }

    #[test]
    fn test_csv_dates_with_leading_zeros() {
        let data = b"day,reading\n01.02.2014,0.5\n15.03.2014,1e-30\n07.04.2014,2.25\n";
        let schema = inferrer(Config::new())
            .infer(&data[..], Some(Path::new("readings.csv")))
            .unwrap();
        assert_eq!(schema.columns[0].kind(), ValueKind::DateTime);
        assert_eq!(schema.columns[1].kind(), ValueKind::Float);
        assert_eq!(schema.columns[1].representative, TypedValue::Float(1e-30));
    }

    #[test]
    fn test_gzip_input() {
        let data = gzipped(b"id,name\n1,foo\n2,bar\n");
        let inference = inferrer(Config::new().with_content_type(ContentType::Csv))
            .infer_detailed(&data[..], Some(Path::new("people.csv.gz")))
            .unwrap();
        assert_eq!(inference.content_type, ContentType::Csv);
        assert_eq!(inference.schema.table_name, "people");
        assert_eq!(inference.schema.primary_key.as_deref(), Some("id"));
        assert_eq!(inference.record_count, 2);

        // Compressed stdin is flagged explicitly
        let config = Config::new()
            .with_content_type(ContentType::Ndjson)
            .with_gzip(true);
        let schema = inferrer(config)
            .infer(&gzipped(b"{\"a\": 1}\n")[..], None)
            .unwrap();
        assert_eq!(schema.column_names(), vec!["a"]);
        assert_eq!(schema.table_name, "table1");
    }

    #[test]
    fn test_gzip_requires_content_type() {
        let data = gzipped(b"id\n1\n");
        let err = inferrer(Config::new())
            .infer(&data[..], Some(Path::new("people.csv.gz")))
            .unwrap_err();
        assert!(matches!(err, InferError::UnknownContentType(_)));

        let err = inferrer(Config::new().with_gzip(true))
            .infer(&data[..], None)
            .unwrap_err();
        assert!(matches!(err, InferError::UnknownContentType(_)));
    }

    #[test]
    fn test_overrides() {
        let data = br#"[{"id":1,"name":"foo"}]"#;
        let config = Config::new()
            .with_content_type(ContentType::Json)
            .with_table_name("people")
            .with_primary_key("name");
        let schema = inferrer(config).infer(&data[..], None).unwrap();
        assert_eq!(schema.table_name, "people");
        assert_eq!(schema.primary_key.as_deref(), Some("name"));
    }

    #[test]
    fn test_anonymous_tables_are_numbered() {
        let data = br#"{"a":"x"}"#;
        let mut inferrer = inferrer(Config::new().with_content_type(ContentType::Json));
        let first = inferrer.infer(&data[..], None).unwrap();
        let second = inferrer.infer(&data[..], None).unwrap();
        assert_eq!(first.table_name, "table1");
        assert_eq!(second.table_name, "table2");

        // A fresh inferrer starts over
        let mut other = SchemaInferrer::new(Config::new().with_content_type(ContentType::Json));
        assert_eq!(other.infer(&data[..], None).unwrap().table_name, "table1");
    }

    #[test]
    fn test_unknown_content_type() {
        let err = inferrer(Config::new()).infer(&b"a,b\n"[..], None).unwrap_err();
        assert!(matches!(err, InferError::UnknownContentType(_)));

        let err = inferrer(Config::new())
            .infer(&b"a,b\n"[..], Some(Path::new("data.bin")))
            .unwrap_err();
        assert!(matches!(err, InferError::UnknownContentType(_)));
    }

    #[test]
    fn test_empty_samples() {
        let err = inferrer(Config::new())
            .infer(&b"[]"[..], Some(Path::new("a.json")))
            .unwrap_err();
        assert!(matches!(err, InferError::EmptySample));

        let err = inferrer(Config::new())
            .infer(&b"id,name\n"[..], Some(Path::new("a.csv")))
            .unwrap_err();
        assert!(matches!(err, InferError::EmptySample));
    }

    #[test]
    fn test_unsupported_content_type() {
        let err = inferrer(Config::new())
            .infer(&b"CDF\x01"[..], Some(Path::new("climate.nc")))
            .unwrap_err();
        assert!(matches!(
            err,
            InferError::UnsupportedContentType(ContentType::NetCdf)
        ));
    }

    #[test]
    fn test_record_cap() {
        let mut data = String::from("n\n");
        for i in 0..50 {
            data.push_str(&format!("{}\n", i));
        }
        let inference = inferrer(Config::new().with_peek_lines(10))
            .infer_detailed(data.as_bytes(), Some(Path::new("n.csv")))
            .unwrap();
        assert!(inference.record_count <= 10);
        assert!(inference.truncated);
        assert!(inference.schema.columns[0].unique);
    }
}
