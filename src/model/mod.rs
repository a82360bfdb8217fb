//! Data model for sampled records and inferred schemas

mod content_type;
mod key;
mod schema;
mod value;

pub use content_type::ContentType;
pub use key::{select_primary_key, PK_PRIMARY_NAMES, PK_PRIMARY_PREFIXES, PK_SECONDARY_NAMES};
pub use schema::{ColumnProfile, DecimalShape, Schema, ValueKind};
pub use value::{RawValue, Record, TypedValue};
