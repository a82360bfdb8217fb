//! Primary key detection

use tracing::{debug, info};

use super::content_type::ContentType;
use super::schema::{ColumnProfile, ValueKind};

/// Column name prefixes that mark a primary key right away
pub const PK_PRIMARY_PREFIXES: &[&str] = &["id"];

/// Absolute column names that mark a primary key
pub const PK_PRIMARY_NAMES: &[&str] = &["pk", "key"];

/// Secondary absolute names: symbolic, English and German synonyms
pub const PK_SECONDARY_NAMES: &[&str] = &[
    "#",
    "number",
    "nr",
    "nummer",
    "no",
    "kennung",
    "bezeichner",
    "identifikator",
];

/// Select a primary key column.
///
/// Tiers are evaluated in order, each scanning the columns in declared
/// order: an `id` prefix, then the absolute names, then the secondary
/// names. As a last resort the first column is used when its sampled values
/// are unique and its type is neither float nor datetime.
pub fn select_primary_key(
    column_names: &[&str],
    first_column: Option<&ColumnProfile>,
    content_type: ContentType,
) -> Option<String> {
    if content_type.no_autopk() {
        info!(%content_type, "Not inferring primary key");
        return None;
    }

    let pk = select_by_name(column_names).or_else(|| select_first_unique(first_column));
    info!(primary_key = ?pk, "Inferred primary key");
    pk
}

fn select_by_name(column_names: &[&str]) -> Option<String> {
    let lowered: Vec<String> = column_names.iter().map(|c| c.to_lowercase()).collect();
    let find = |matches: &dyn Fn(&str) -> bool| {
        lowered
            .iter()
            .position(|name| matches(name))
            .map(|idx| column_names[idx].to_string())
    };

    find(&|name: &str| PK_PRIMARY_PREFIXES.iter().any(|p| name.starts_with(p)))
        .or_else(|| find(&|name: &str| PK_PRIMARY_NAMES.contains(&name)))
        .or_else(|| find(&|name: &str| PK_SECONDARY_NAMES.contains(&name)))
}

fn select_first_unique(first_column: Option<&ColumnProfile>) -> Option<String> {
    let column = first_column?;
    if matches!(column.kind(), ValueKind::Float | ValueKind::DateTime) {
        debug!(column = %column.name, kind = %column.kind(), "First column type unsuitable as primary key");
        return None;
    }
    column.unique.then(|| column.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypedValue;

    fn profile(name: &str, unique: bool, representative: TypedValue) -> ColumnProfile {
        ColumnProfile {
            name: name.into(),
            nullable: false,
            unique,
            representative,
            max_raw_length: 3,
            decimal_shape: None,
            comment: None,
        }
    }

    #[test]
    fn test_prefix_tier() {
        let pk = select_primary_key(&["Identifier", "name"], None, ContentType::Json);
        assert_eq!(pk.as_deref(), Some("Identifier"));

        let pk = select_primary_key(&["name", "id_user", "pk"], None, ContentType::Csv);
        assert_eq!(pk.as_deref(), Some("id_user"));
    }

    #[test]
    fn test_absolute_tier() {
        let pk = select_primary_key(&["PK", "name"], None, ContentType::Json);
        assert_eq!(pk.as_deref(), Some("PK"));

        let pk = select_primary_key(&["name", "Key", "nr"], None, ContentType::Json);
        assert_eq!(pk.as_deref(), Some("Key"));
    }

    #[test]
    fn test_secondary_tier() {
        let pk = select_primary_key(&["Kennung", "name"], None, ContentType::Json);
        assert_eq!(pk.as_deref(), Some("Kennung"));

        let pk = select_primary_key(&["name", "#"], None, ContentType::Csv);
        assert_eq!(pk.as_deref(), Some("#"));

        // Secondary names must match exactly
        let pk = select_primary_key(&["numbers", "name"], None, ContentType::Csv);
        assert_eq!(pk, None);
    }

    #[test]
    fn test_first_column_fallback() {
        let first = profile("ідентифікатор", true, TypedValue::Integer(2));
        let pk = select_primary_key(&["ідентифікатор", "name"], Some(&first), ContentType::Json);
        assert_eq!(pk.as_deref(), Some("ідентифікатор"));

        let first = profile("ідентифікатор", false, TypedValue::Integer(2));
        let pk = select_primary_key(&["ідентифікатор", "name"], Some(&first), ContentType::Json);
        assert_eq!(pk, None);
    }

    #[test]
    fn test_first_column_fallback_rejects_float_and_datetime() {
        let first = profile("value", true, TypedValue::Float(1e30));
        assert_eq!(select_primary_key(&["value"], Some(&first), ContentType::Csv), None);

        let when = chrono::NaiveDate::from_ymd_opt(2014, 10, 31)
            .and_then(|d| d.and_hms_opt(9, 22, 56))
            .unwrap();
        let first = profile("when", true, TypedValue::DateTime(when));
        assert_eq!(select_primary_key(&["when"], Some(&first), ContentType::Csv), None);
    }

    #[test]
    fn test_no_autopk_content_types() {
        let first = profile("id", true, TypedValue::Integer(1));
        assert_eq!(select_primary_key(&["id"], Some(&first), ContentType::NetCdf), None);
        assert_eq!(select_primary_key(&["id"], Some(&first), ContentType::Grib2), None);
    }
}
