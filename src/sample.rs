//! Bounded sampling of input streams
//!
//! Only a prefix of the input is ever read. Line-oriented content is cut at
//! a byte budget and then at a line budget, never in the middle of a line.
//! Content that cannot be cut on line boundaries is read as a whole, up to a
//! hard ceiling.

use std::fmt;
use std::io::{Cursor, ErrorKind, Read};

use serde::de::{self, value::MapAccessDeserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::{Config, MAX_DOCUMENT_BYTES};
use crate::error::{InferError, Result};
use crate::model::{ContentType, RawValue, Record};

/// A bounded prefix of an input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    data: Vec<u8>,
    truncated: bool,
    content_type: ContentType,
}

impl Sample {
    pub fn new(data: Vec<u8>, truncated: bool, content_type: ContentType) -> Self {
        Self {
            data,
            truncated,
            content_type,
        }
    }

    /// The sampled bytes
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// A fresh reader positioned at the start of the sample
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.data)
    }

    /// Whether the source had more data beyond the sampled window
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Reads bounded samples according to configured budgets
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    peek_bytes: u64,
    peek_lines: usize,
    max_document_bytes: u64,
}

impl Sampler {
    pub fn new(peek_bytes: u64, peek_lines: usize) -> Self {
        Self {
            peek_bytes,
            peek_lines,
            max_document_bytes: MAX_DOCUMENT_BYTES,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            peek_bytes: config.peek_bytes,
            peek_lines: config.peek_lines,
            max_document_bytes: config.max_document_bytes,
        }
    }

    pub fn with_max_document_bytes(mut self, bytes: u64) -> Self {
        self.max_document_bytes = bytes;
        self
    }

    /// Take a sample from `reader`. The reader is consumed up to the sample
    /// window plus one probe byte.
    pub fn sample<R: Read>(&self, reader: R, content_type: ContentType) -> Result<Sample> {
        if content_type.requires_whole_read() {
            warn!(%content_type, "Reading input as a whole, it cannot be split on line boundaries");
            return self.read_whole(reader, content_type);
        }
        if content_type == ContentType::Json {
            info!("Reading JSON document as a whole");
            return self.read_whole(reader, content_type);
        }
        self.read_lines(reader, content_type)
    }

    fn read_whole<R: Read>(&self, reader: R, content_type: ContentType) -> Result<Sample> {
        let mut data = Vec::new();
        reader
            .take(self.max_document_bytes.saturating_add(1))
            .read_to_end(&mut data)?;
        if data.len() as u64 > self.max_document_bytes {
            return Err(InferError::SampleTooLarge {
                content_type,
                limit: self.max_document_bytes,
            });
        }
        debug!(bytes = data.len(), "Read whole document");
        Ok(Sample::new(data, false, content_type))
    }

    fn read_lines<R: Read>(&self, mut reader: R, content_type: ContentType) -> Result<Sample> {
        info!(peek_bytes = self.peek_bytes, "Reading sample");
        let mut payload = Vec::new();
        reader
            .by_ref()
            .take(self.peek_bytes)
            .read_to_end(&mut payload)?;

        let partial_read = has_more_data(&mut reader)?;
        let mut lines: Vec<&[u8]> = payload.split_inclusive(|b| *b == b'\n').collect();

        // Strip the last line only if it is incomplete
        if partial_read && lines.last().is_some_and(|line| !line.ends_with(b"\n")) {
            lines.pop();
        }

        let truncated = partial_read || lines.len() > self.peek_lines;
        lines.truncate(self.peek_lines);
        info!(lines = lines.len(), truncated, "Received sample");

        Ok(Sample::new(lines.concat(), truncated, content_type))
    }
}

/// Take a sample using the default document ceiling.
pub fn sample<R: Read>(
    reader: R,
    content_type: ContentType,
    peek_bytes: u64,
    peek_lines: usize,
) -> Result<Sample> {
    Sampler::new(peek_bytes, peek_lines).sample(reader, content_type)
}

fn has_more_data<R: Read>(reader: &mut R) -> Result<bool> {
    let mut probe = [0u8; 1];
    loop {
        match reader.read(&mut probe) {
            Ok(n) => return Ok(n > 0),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read the first `limit` records of a JSON document.
///
/// A top-level array yields its first `limit` objects; the remaining
/// elements are skipped without being materialized. A top-level object is a
/// single record.
pub fn first_json_records(data: &[u8], limit: usize) -> Result<Vec<Record>> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(InferError::EmptySample);
    }

    let mut deserializer = serde_json::Deserializer::from_slice(data);
    let records = de::Deserializer::deserialize_any(&mut deserializer, FirstRecords { limit })
        .map_err(|e| InferError::malformed(format!("unable to parse JSON document: {}", e)))?;
    deserializer
        .end()
        .map_err(|e| InferError::malformed(format!("unable to parse JSON document: {}", e)))?;

    debug!(records = records.len(), "Read JSON document records");
    Ok(records)
}

/// Convert a decoded JSON object into a record, keeping field order
pub(crate) fn json_object_to_record(object: Map<String, Value>) -> Record {
    object
        .into_iter()
        .map(|(key, value)| (key, RawValue::from(value)))
        .collect()
}

struct FirstRecords {
    limit: usize,
}

impl<'de> Visitor<'de> for FirstRecords {
    type Value = Vec<Record>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of objects or a single object")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut records = Vec::new();
        while records.len() < self.limit {
            match seq.next_element::<Map<String, Value>>()? {
                Some(object) => records.push(json_object_to_record(object)),
                None => return Ok(records),
            }
        }
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(records)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<Self::Value, A::Error> {
        let object = Map::deserialize(MapAccessDeserializer::new(map))?;
        Ok(vec![json_object_to_record(object)])
    }
}
