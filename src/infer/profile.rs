//! Per-column statistics gathered over a sample of records

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::error::ProfileWarning;
use crate::model::{ColumnProfile, DecimalShape, RawValue, Record, TypedValue};

use super::coerce::Coercer;

/// Tracks whether the values of a column are distinct.
///
/// The set never grows past its capacity; an insertion that would exceed it
/// collapses the tracker to "not unique". Numerically equal values count as
/// one, so `true`, `1` and `1.0` collide.
#[derive(Debug)]
pub struct UniqueTracker {
    seen: Option<FxHashSet<TypedValue>>,
    capacity: usize,
}

impl UniqueTracker {
    pub fn seeded(value: TypedValue, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut seen = FxHashSet::with_capacity_and_hasher(capacity, Default::default());
        seen.insert(identity(value));
        Self {
            seen: Some(seen),
            capacity,
        }
    }

    /// Record another value. Returns an error message when the set is full.
    pub fn insert(&mut self, value: TypedValue) -> Result<(), String> {
        let Some(seen) = self.seen.as_mut() else {
            return Ok(());
        };
        let value = identity(value);
        if seen.contains(&value) {
            self.seen = None;
            return Ok(());
        }
        if seen.len() >= self.capacity {
            self.seen = None;
            return Err(format!("capacity of {} values exceeded", self.capacity));
        }
        seen.insert(value);
        Ok(())
    }

    pub fn is_unique(&self) -> bool {
        self.seen.is_some()
    }

    /// Number of distinct values held
    pub fn len(&self) -> usize {
        self.seen.as_ref().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn identity(value: TypedValue) -> TypedValue {
    match value {
        TypedValue::Bool(b) => TypedValue::Decimal(Decimal::from(u8::from(b))),
        TypedValue::Integer(i) => TypedValue::Decimal(Decimal::from(i)),
        TypedValue::Decimal(d) => TypedValue::Decimal(d.normalize()),
        other => other,
    }
}

/// Running statistics for one column
#[derive(Debug)]
pub struct ColumnAccumulator {
    name: String,
    nullable: bool,
    unique: UniqueTracker,
    representative: TypedValue,
    max_raw_length: usize,
    decimal_shape: Option<DecimalShape>,
    comment: Option<String>,
    warnings: Vec<ProfileWarning>,
}

impl ColumnAccumulator {
    /// Begin a column at its first observation, made at `record_index`.
    pub fn start(
        name: impl Into<String>,
        record_index: usize,
        raw: &RawValue,
        capacity: usize,
        coercer: &Coercer,
    ) -> Self {
        let name = name.into();
        let mut warnings = Vec::new();
        let mut comment = None;
        let typed = typed_value(&name, raw, coercer, &mut comment, &mut warnings);

        let mut column = Self {
            nullable: !(record_index == 0 && !raw.is_blank()),
            unique: UniqueTracker::seeded(typed.clone(), capacity),
            representative: TypedValue::Null,
            max_raw_length: raw.display_len(),
            decimal_shape: None,
            comment,
            warnings,
            name,
        };
        column.absorb(typed);
        column
    }

    /// Fold one more raw value into the column
    pub fn observe(&mut self, raw: &RawValue, coercer: &Coercer) {
        self.max_raw_length = self.max_raw_length.max(raw.display_len());
        if raw.is_blank() {
            self.nullable = true;
        }

        let typed = typed_value(
            &self.name,
            raw,
            coercer,
            &mut self.comment,
            &mut self.warnings,
        );
        if let Err(reason) = self.unique.insert(typed.clone()) {
            warn!(column = %self.name, %reason, "Uniqueness check failed");
            self.warnings.push(ProfileWarning::UniquenessCheckFailure {
                column: self.name.clone(),
                reason,
            });
        }
        self.absorb(typed);
    }

    /// The record did not carry this column
    pub fn mark_missing(&mut self) {
        self.nullable = true;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn absorb(&mut self, typed: TypedValue) {
        if let TypedValue::Decimal(d) = &typed {
            let shape = DecimalShape::of(d);
            self.decimal_shape = Some(match self.decimal_shape {
                Some(current) => current.merge(shape),
                None => shape,
            });
        }
        let current = std::mem::replace(&mut self.representative, TypedValue::Null);
        self.representative = current.widen(typed);
    }

    pub fn finalize(self) -> (ColumnProfile, Vec<ProfileWarning>) {
        let profile = ColumnProfile {
            unique: self.unique.is_unique(),
            name: self.name,
            nullable: self.nullable,
            representative: self.representative,
            max_raw_length: self.max_raw_length,
            decimal_shape: self.decimal_shape,
            comment: self.comment,
        };
        (profile, self.warnings)
    }
}

/// Coerce a raw value for profiling.
///
/// Nested values are kept as their JSON text. Zero-padded text that would
/// become a decimal, or a datetime read from bare digits, keeps its original
/// form. Written dates such as `01.02.2014` are left alone.
fn typed_value(
    column: &str,
    raw: &RawValue,
    coercer: &Coercer,
    comment: &mut Option<String>,
    warnings: &mut Vec<ProfileWarning>,
) -> TypedValue {
    if let RawValue::Nested(value) = raw {
        let example = value.to_string();
        if comment.is_none() {
            warn!(column, example = %example, "Nested values are stored as text");
            *comment = Some(format!("nested values, example: {}", example));
            warnings.push(ProfileWarning::NestedValue {
                column: column.to_string(),
                example: example.clone(),
            });
        }
        return TypedValue::String(example);
    }

    let typed = coercer.coerce(raw);
    let keep_text = match (raw, &typed) {
        (RawValue::Text(text), TypedValue::Decimal(_)) => is_zero_padded(text),
        (RawValue::Text(text), TypedValue::DateTime(_)) => {
            is_zero_padded(text) && is_bare_digits(text)
        }
        _ => false,
    };
    match raw {
        RawValue::Text(text) if keep_text => {
            debug!(column, value = %text, "Keeping zero-padded value as text");
            TypedValue::String(text.clone())
        }
        _ => typed,
    }
}

/// Digits only, with an optional sign
fn is_bare_digits(text: &str) -> bool {
    let text = text.trim();
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit())
}

/// Text like `0704.0001` or `-020141010`: a leading zero followed by a digit
fn is_zero_padded(text: &str) -> bool {
    let text = text.trim();
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let mut chars = unsigned.chars();
    chars.next() == Some('0') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// Result of profiling a record sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Column profiles in first-seen order
    pub columns: Vec<ColumnProfile>,
    pub warnings: Vec<ProfileWarning>,
}

/// Folds records into column accumulators
#[derive(Debug)]
pub struct Profiler {
    coercer: Coercer,
    capacity: usize,
    columns: IndexMap<String, ColumnAccumulator>,
    records: usize,
}

impl Profiler {
    /// `capacity` bounds the distinct values tracked per column; use the
    /// record cap of the sample.
    pub fn new(capacity: usize) -> Self {
        Self::with_coercer(capacity, Coercer::new())
    }

    pub fn with_coercer(capacity: usize, coercer: Coercer) -> Self {
        Self {
            coercer,
            capacity,
            columns: IndexMap::new(),
            records: 0,
        }
    }

    pub fn observe(&mut self, record: &Record) {
        let record_index = self.records;
        for (name, raw) in record {
            match self.columns.get_mut(name) {
                Some(column) => column.observe(raw, &self.coercer),
                None => {
                    let column = ColumnAccumulator::start(
                        name.clone(),
                        record_index,
                        raw,
                        self.capacity,
                        &self.coercer,
                    );
                    self.columns.insert(name.clone(), column);
                }
            }
        }
        for column in self.columns.values_mut() {
            if !record.contains_key(column.name()) {
                column.mark_missing();
            }
        }
        self.records += 1;
    }

    /// Number of records observed so far
    pub fn record_count(&self) -> usize {
        self.records
    }

    pub fn finish(self) -> Profile {
        let mut warnings = Vec::new();
        let columns = self
            .columns
            .into_values()
            .map(|column| {
                let (profile, column_warnings) = column.finalize();
                warnings.extend(column_warnings);
                profile
            })
            .collect();
        Profile { columns, warnings }
    }
}

/// Profile a whole record sequence
pub fn profile_records<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    capacity: usize,
    coercer: Coercer,
) -> Profile {
    let mut profiler = Profiler::with_coercer(capacity, coercer);
    for record in records {
        profiler.observe(record);
    }
    debug!(records = profiler.record_count(), "Profiled records");
    profiler.finish()
}
