//! JSON output format

use std::io::Write;

use serde::Serialize;

use crate::error::{InferError, Result};
use crate::infer::Inference;
use crate::model::{ColumnProfile, ContentType};

use super::SchemaRenderer;

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonSchema<'a> {
    table_name: &'a str,
    content_type: ContentType,
    primary_key: Option<&'a str>,
    records_sampled: usize,
    truncated: bool,
    columns: &'a [ColumnProfile],
    warnings: Vec<String>,
}

impl SchemaRenderer for JsonOutput {
    fn render(&self, inference: &Inference, writer: &mut dyn Write) -> Result<()> {
        let schema = &inference.schema;
        let output = JsonSchema {
            table_name: &schema.table_name,
            content_type: inference.content_type,
            primary_key: schema.primary_key.as_deref(),
            records_sampled: inference.record_count,
            truncated: inference.truncated,
            columns: &schema.columns,
            warnings: inference.warnings.iter().map(ToString::to_string).collect(),
        };

        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &output)
        } else {
            serde_json::to_writer(&mut *writer, &output)
        };
        result.map_err(|e| InferError::Io(e.into()))?;
        writeln!(writer)?;
        Ok(())
    }
}
