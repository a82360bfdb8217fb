//! Column profiles and the inferred schema

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value::TypedValue;

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    Null,
    DateTime,
    Bool,
    Integer,
    Decimal,
    Float,
    String,
}

impl ValueKind {
    /// Position in the specificity order, most specific first.
    /// Null sits before everything since it never wins a widening.
    pub fn rank(self) -> u8 {
        match self {
            ValueKind::Null => 0,
            ValueKind::DateTime => 1,
            ValueKind::Bool => 2,
            ValueKind::Integer => 3,
            ValueKind::Decimal => 4,
            ValueKind::Float => 5,
            ValueKind::String => 6,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Null => write!(f, "null"),
            ValueKind::DateTime => write!(f, "datetime"),
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::Decimal => write!(f, "decimal"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::String => write!(f, "string"),
        }
    }
}

/// Digits needed to hold every decimal value of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecimalShape {
    /// Digits before the decimal point
    pub integer_digits: u32,
    /// Digits after the decimal point
    pub fractional_digits: u32,
}

impl DecimalShape {
    pub fn of(value: &Decimal) -> Self {
        let scale = value.scale();
        let digits = value.mantissa().unsigned_abs().to_string().len() as u32;
        Self {
            integer_digits: digits.saturating_sub(scale),
            fractional_digits: scale,
        }
    }

    pub fn merge(self, other: DecimalShape) -> Self {
        Self {
            integer_digits: self.integer_digits.max(other.integer_digits),
            fractional_digits: self.fractional_digits.max(other.fractional_digits),
        }
    }

    /// Total number of digits, as used by `DECIMAL(precision, scale)`
    pub fn precision(&self) -> u32 {
        self.integer_digits + self.fractional_digits
    }

    pub fn scale(&self) -> u32 {
        self.fractional_digits
    }
}

/// Finalized statistics for one column of the sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    /// Column name, as found in the data
    pub name: String,
    /// Whether any sampled record had no value for this column
    pub nullable: bool,
    /// Whether every sampled value was distinct
    pub unique: bool,
    /// The value whose type represents the whole column
    pub representative: TypedValue,
    /// Longest textual form seen, in characters
    pub max_raw_length: usize,
    /// Digits needed for the decimal values seen, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_shape: Option<DecimalShape>,
    /// Free-form note, e.g. an example of nested values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnProfile {
    /// Semantic type of the column
    pub fn kind(&self) -> ValueKind {
        self.representative.kind()
    }
}

/// The inferred relational schema for one input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub table_name: String,
    pub columns: Vec<ColumnProfile>,
    pub primary_key: Option<String>,
}

impl Schema {
    pub fn new(
        table_name: impl Into<String>,
        columns: Vec<ColumnProfile>,
        primary_key: Option<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            primary_key,
        }
    }

    /// Get column by name
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names, in declared order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether the named column is the primary key
    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key.as_deref() == Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_rank_order() {
        let order = [
            ValueKind::DateTime,
            ValueKind::Bool,
            ValueKind::Integer,
            ValueKind::Decimal,
            ValueKind::Float,
            ValueKind::String,
        ];
        assert!(order.windows(2).all(|w| w[0].rank() < w[1].rank()));
    }

    #[test]
    fn test_decimal_shape() {
        let shape = DecimalShape::of(&Decimal::from_str("0.42").unwrap());
        assert_eq!(shape, DecimalShape { integer_digits: 0, fractional_digits: 2 });

        let shape = DecimalShape::of(&Decimal::from_str("-1854.60").unwrap());
        assert_eq!(shape.precision(), 6);
        assert_eq!(shape.scale(), 2);

        let merged = DecimalShape::of(&Decimal::from_str("762.1").unwrap())
            .merge(DecimalShape::of(&Decimal::from_str("-1.983").unwrap()));
        assert_eq!(merged, DecimalShape { integer_digits: 3, fractional_digits: 3 });
    }

    #[test]
    fn test_schema_lookup() {
        let column = ColumnProfile {
            name: "id".into(),
            nullable: false,
            unique: true,
            representative: TypedValue::Integer(2),
            max_raw_length: 1,
            decimal_shape: None,
            comment: None,
        };
        let schema = Schema::new("data", vec![column], Some("id".into()));
        assert_eq!(schema.column_names(), vec!["id"]);
        assert_eq!(schema.column("id").map(|c| c.kind()), Some(ValueKind::Integer));
        assert!(schema.is_primary_key("id"));
        assert!(!schema.is_primary_key("name"));
    }
}
