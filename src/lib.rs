//! schemapeek - Infer relational schemas from a peek at tabular data
//!
//! Reads a bounded sample from CSV, JSON, NDJSON, line protocol, spreadsheet
//! or Parquet input, coerces every value to its most specific type, profiles
//! each column and picks a primary key.

pub mod config;
pub mod error;
pub mod infer;
pub mod model;
pub mod output;
pub mod parser;
pub mod sample;

pub use config::Config;
pub use error::{InferError, ProfileWarning, Result};
pub use infer::{coerce, Coercer, Inference, SchemaInferrer};
pub use model::{ColumnProfile, ContentType, Schema, TypedValue, ValueKind};
