//! Raw and typed values

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::schema::ValueKind;

/// A flat record as produced by a decoder. Field order is first-seen order.
pub type Record = IndexMap<String, RawValue>;

/// A value as delivered by a record decoder, before coercion
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(Decimal),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    /// Arrays and objects; never coerced beyond opaque text
    Nested(serde_json::Value),
}

impl RawValue {
    /// Null, NaN, or text consisting only of whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Float(f) => f.is_nan(),
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, RawValue::Text(_))
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, RawValue::Nested(_))
    }

    /// Textual form, as a loosely typed reader would print it
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            RawValue::Null => Cow::Borrowed(""),
            RawValue::Bool(b) => Cow::Owned(b.to_string()),
            RawValue::Integer(i) => Cow::Owned(i.to_string()),
            RawValue::Decimal(d) => Cow::Owned(d.to_string()),
            RawValue::Float(f) => Cow::Owned(f.to_string()),
            RawValue::Text(s) => Cow::Borrowed(s.as_str()),
            RawValue::Timestamp(dt) => Cow::Owned(dt.to_string()),
            RawValue::Nested(v) => Cow::Owned(v.to_string()),
        }
    }

    /// Length of the textual form, in characters
    pub fn display_len(&self) -> usize {
        self.display().chars().count()
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Integer(i)
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Float(f)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl<T> From<Option<T>> for RawValue
where
    T: Into<RawValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => RawValue::Null,
        }
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RawValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    RawValue::Decimal(Decimal::from(u))
                } else if let Some(f) = n.as_f64() {
                    RawValue::Float(f)
                } else {
                    RawValue::Text(n.to_string())
                }
            }
            serde_json::Value::String(s) => RawValue::Text(s),
            nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                RawValue::Nested(nested)
            }
        }
    }
}

impl From<TypedValue> for RawValue {
    fn from(value: TypedValue) -> Self {
        match value {
            TypedValue::Null => RawValue::Null,
            TypedValue::Bool(b) => RawValue::Bool(b),
            TypedValue::Integer(i) => RawValue::Integer(i),
            TypedValue::Decimal(d) => RawValue::Decimal(d),
            TypedValue::Float(f) => RawValue::Float(f),
            TypedValue::DateTime(dt) => RawValue::Timestamp(dt),
            TypedValue::String(s) => RawValue::Text(s),
        }
    }
}

/// A value coerced to the most specific semantic type
#[derive(Debug, Clone)]
pub enum TypedValue {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(Decimal),
    Float(f64),
    DateTime(NaiveDateTime),
    String(String),
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypedValue::Null, TypedValue::Null) => true,
            (TypedValue::Bool(a), TypedValue::Bool(b)) => a == b,
            (TypedValue::Integer(a), TypedValue::Integer(b)) => a == b,
            (TypedValue::Decimal(a), TypedValue::Decimal(b)) => a == b,
            // Bitwise, so that Eq and Hash agree
            (TypedValue::Float(a), TypedValue::Float(b)) => a.to_bits() == b.to_bits(),
            (TypedValue::DateTime(a), TypedValue::DateTime(b)) => a == b,
            (TypedValue::String(a), TypedValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypedValue {}

impl Hash for TypedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            TypedValue::Null => {}
            TypedValue::Bool(b) => b.hash(state),
            TypedValue::Integer(i) => i.hash(state),
            TypedValue::Decimal(d) => d.hash(state),
            TypedValue::Float(f) => f.to_bits().hash(state),
            TypedValue::DateTime(dt) => dt.hash(state),
            TypedValue::String(s) => s.hash(state),
        }
    }
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// The semantic type of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Null => ValueKind::Null,
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::Integer(_) => ValueKind::Integer,
            TypedValue::Decimal(_) => ValueKind::Decimal,
            TypedValue::Float(_) => ValueKind::Float,
            TypedValue::DateTime(_) => ValueKind::DateTime,
            TypedValue::String(_) => ValueKind::String,
        }
    }

    pub fn display(&self) -> Cow<'_, str> {
        match self {
            TypedValue::Null => Cow::Borrowed("NULL"),
            TypedValue::Bool(b) => Cow::Owned(b.to_string()),
            TypedValue::Integer(i) => Cow::Owned(i.to_string()),
            TypedValue::Decimal(d) => Cow::Owned(d.to_string()),
            TypedValue::Float(f) => Cow::Owned(f.to_string()),
            TypedValue::DateTime(dt) => Cow::Owned(dt.to_string()),
            TypedValue::String(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Combine two values of one column into the one whose type represents
    /// both.
    ///
    /// The less specific type wins. Null and blank text leave the current
    /// value untouched. Ties are broken deterministically: decimals prefer
    /// more significant fractional digits and then magnitude, floats prefer
    /// magnitude, integers and strings prefer the longer text. Booleans and
    /// datetimes keep the current value.
    pub fn widen(self, other: TypedValue) -> TypedValue {
        if let TypedValue::String(ref s) = other {
            if s.trim().is_empty() {
                return self;
            }
        }
        if other.is_null() {
            return self;
        }
        if self.is_null() {
            return other;
        }

        let (rank_a, rank_b) = (self.kind().rank(), other.kind().rank());
        if rank_b > rank_a {
            return other;
        }
        if rank_b < rank_a {
            return self;
        }

        match (&self, &other) {
            (TypedValue::Decimal(a), TypedValue::Decimal(b)) => {
                let (scale_a, scale_b) = (a.normalize().scale(), b.normalize().scale());
                if scale_b > scale_a || (scale_b == scale_a && b.abs() > a.abs()) {
                    other
                } else {
                    self
                }
            }
            (TypedValue::Float(a), TypedValue::Float(b)) => {
                if b.abs() > a.abs() {
                    other
                } else {
                    self
                }
            }
            (TypedValue::Integer(_), TypedValue::Integer(_))
            | (TypedValue::String(_), TypedValue::String(_)) => {
                if other.display().chars().count() > self.display().chars().count() {
                    other
                } else {
                    self
                }
            }
            _ => self,
        }
    }
}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::String(s.to_string())
    }
}

impl From<i64> for TypedValue {
    fn from(i: i64) -> Self {
        TypedValue::Integer(i)
    }
}

impl From<Decimal> for TypedValue {
    fn from(d: Decimal) -> Self {
        TypedValue::Decimal(d)
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Bool(b)
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TypedValue", 2)?;
        state.serialize_field("type", &self.kind())?;
        match self {
            TypedValue::Null => state.serialize_field("value", &())?,
            TypedValue::Bool(b) => state.serialize_field("value", b)?,
            TypedValue::Integer(i) => state.serialize_field("value", i)?,
            TypedValue::Float(f) => state.serialize_field("value", f)?,
            TypedValue::String(s) => state.serialize_field("value", s)?,
            other => state.serialize_field("value", &other.display())?,
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> TypedValue {
        TypedValue::Decimal(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_raw_from_json() {
        let value: serde_json::Value =
            serde_json::from_str(r#"[null, true, 42, 0.5, "x", {"a": 1}]"#).unwrap();
        let raw: Vec<RawValue> = match value {
            serde_json::Value::Array(items) => items.into_iter().map(RawValue::from).collect(),
            _ => unreachable!(),
        };
        assert_eq!(raw[0], RawValue::Null);
        assert_eq!(raw[1], RawValue::Bool(true));
        assert_eq!(raw[2], RawValue::Integer(42));
        assert_eq!(raw[3], RawValue::Float(0.5));
        assert_eq!(raw[4], RawValue::Text("x".into()));
        assert!(raw[5].is_nested());
        assert_eq!(raw[5].display(), r#"{"a":1}"#);
    }

    #[test]
    fn test_raw_blank() {
        assert!(RawValue::Null.is_blank());
        assert!(RawValue::Text("  ".into()).is_blank());
        assert!(RawValue::Float(f64::NAN).is_blank());
        assert!(!RawValue::Text("0".into()).is_blank());
        assert!(!RawValue::Integer(0).is_blank());
    }

    #[test]
    fn test_widen_prefers_less_specific_type() {
        let widened = TypedValue::Integer(6).widen(dec("6.1"));
        assert_eq!(widened, dec("6.1"));

        let widened = TypedValue::Integer(7).widen(TypedValue::from("ruining everything"));
        assert_eq!(widened, TypedValue::from("ruining everything"));

        let widened = TypedValue::from("abc").widen(TypedValue::Bool(true));
        assert_eq!(widened, TypedValue::from("abc"));
    }

    #[test]
    fn test_widen_null_and_blank_are_identity() {
        assert_eq!(TypedValue::Integer(1).widen(TypedValue::Null), TypedValue::Integer(1));
        assert_eq!(TypedValue::Null.widen(TypedValue::Integer(1)), TypedValue::Integer(1));
        assert_eq!(
            TypedValue::Integer(1).widen(TypedValue::from(" ")),
            TypedValue::Integer(1)
        );
    }

    #[test]
    fn test_widen_ties() {
        assert_eq!(TypedValue::Integer(6).widen(TypedValue::Integer(123)), TypedValue::Integer(123));
        assert_eq!(TypedValue::Integer(-12).widen(TypedValue::Integer(9)), TypedValue::Integer(-12));
        assert_eq!(dec("762.1").widen(dec("-1.983")), dec("-1.983"));
        assert_eq!(dec("1.5").widen(dec("-10.5")), dec("-10.5"));
        assert_eq!(dec("1.50").widen(dec("1.5")), dec("1.50"));
        assert_eq!(
            TypedValue::Float(1e30).widen(TypedValue::Float(-2e30)),
            TypedValue::Float(-2e30)
        );
        assert_eq!(TypedValue::from("foo").widen(TypedValue::from("ba")), TypedValue::from("foo"));
    }

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(TypedValue::Float(1.5), TypedValue::Float(1.5));
        assert_ne!(TypedValue::Float(0.0), TypedValue::Float(-0.0));
        assert_ne!(TypedValue::Integer(1), TypedValue::Decimal(Decimal::ONE));
    }
}
