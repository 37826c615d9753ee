//! Projection of server responses into front matter
//!
//! [`FIELD_TABLE`] lists every response field that is written back to a
//! document, where it goes and whether it is forced. Values are coerced
//! into YAML scalars by [`coerce`] before being written. After the table is
//! applied the top-level keys are re-sorted so repeated syncs produce the
//! same key order.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use serde_yaml::{Mapping, Value as YamlValue};
use thiserror::Error;

use kankasync_core::domain::FrontMatter;

/// Front matter key holding the nested server-managed fields
pub const NAMESPACE: &str = "kanka";

/// Errors raised while projecting a response into front matter
#[derive(Debug, Error)]
pub enum MergeError {
    /// The namespace key holds something other than a mapping
    #[error("Front matter key '{key}' must be a mapping, found {found}")]
    NamespaceNotMapping { key: String, found: String },

    /// A response value could not be represented as YAML
    #[error("Field '{field}' cannot be written to front matter: {message}")]
    UnsupportedValue { field: String, message: String },
}

// ============================================================================
// Field table
// ============================================================================

/// Where a field is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    TopLevel,
    /// Under the [`NAMESPACE`] mapping
    Nested,
}

/// One row of the projection table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub source: &'static str,
    pub placement: Placement,
    /// Written even when absent from the response (as null)
    pub forced: bool,
}

const fn field(source: &'static str, placement: Placement, forced: bool) -> FieldSpec {
    FieldSpec {
        source,
        placement,
        forced,
    }
}

pub const FIELD_TABLE: &[FieldSpec] = &[
    field("entity_id", Placement::TopLevel, true),
    field("EntityType", Placement::TopLevel, true),
    field("id", Placement::TopLevel, true),
    field("name", Placement::TopLevel, true),
    field("created_at", Placement::Nested, false),
    field("created_by", Placement::Nested, false),
    field("updated_at", Placement::Nested, false),
    field("updated_by", Placement::Nested, false),
    field("location_id", Placement::Nested, false),
    field("urls", Placement::Nested, false),
    field("is_private", Placement::TopLevel, false),
];

// ============================================================================
// Coercion
// ============================================================================

fn looks_like_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn coerce_string(s: &str) -> YamlValue {
    if looks_like_date(s) {
        return YamlValue::String(s.to_string());
    }
    if s.eq_ignore_ascii_case("true") {
        return YamlValue::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return YamlValue::Bool(false);
    }

    let trimmed = s.trim();
    if !trimmed.is_empty() {
        if let Ok(n) = trimmed.parse::<i64>() {
            return YamlValue::Number(n.into());
        }
        if let Ok(n) = trimmed.parse::<u64>() {
            return YamlValue::Number(n.into());
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return YamlValue::Number(n.into());
            }
        }
    }
    YamlValue::String(s.to_string())
}

/// Converts one response value into the YAML written to front matter
///
/// Objects and arrays pass through structurally. Strings are kept when they
/// parse as a date, become booleans for `true`/`false` (any case), become
/// numbers when they parse as a finite number, and are otherwise kept.
pub fn coerce(field: &str, value: &Value) -> Result<YamlValue, MergeError> {
    let coerced = match value {
        Value::Object(_) | Value::Array(_) => {
            serde_yaml::to_value(value).map_err(|e| MergeError::UnsupportedValue {
                field: field.to_string(),
                message: e.to_string(),
            })?
        }
        Value::String(s) => coerce_string(s),
        Value::Bool(b) => YamlValue::Bool(*b),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => YamlValue::Number(i.into()),
            (None, Some(u), _) => YamlValue::Number(u.into()),
            (None, None, Some(f)) if f.is_finite() => YamlValue::Number(f.into()),
            _ => YamlValue::String(n.to_string()),
        },
        Value::Null => YamlValue::Null,
    };
    Ok(coerced)
}

// ============================================================================
// Merge
// ============================================================================

fn key_text(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Rebuilds a mapping with its keys in lexicographic order
fn sorted(mapping: Mapping) -> Mapping {
    let mut entries: Vec<(YamlValue, YamlValue)> = mapping.into_iter().collect();
    entries.sort_by_cached_key(|(key, _)| key_text(key));
    entries.into_iter().collect()
}

/// Applies [`FIELD_TABLE`] to `front_matter`
///
/// `source` is the flattened server response, overlaid with the working
/// metadata. When `tags` is given, the `tags` key is replaced with those
/// names; an empty list is only written over an existing `tags` key.
///
/// # Errors
/// Fails if the namespace key exists but is not a mapping, or if a value
/// cannot be represented in YAML. Fields applied before the failure stay
/// applied.
pub fn merge(
    front_matter: &mut FrontMatter,
    source: &Map<String, Value>,
    tags: Option<Vec<String>>,
) -> Result<(), MergeError> {
    let ns_key = YamlValue::String(NAMESPACE.to_string());

    for row in FIELD_TABLE {
        let value = match source.get(row.source) {
            Some(Value::Null) | None if !row.forced => continue,
            Some(value) => coerce(row.source, value)?,
            None => YamlValue::Null,
        };
        let key = YamlValue::String(row.source.to_string());

        match row.placement {
            Placement::TopLevel => {
                front_matter.insert(key, value);
            }
            Placement::Nested => {
                let slot = front_matter
                    .entry(ns_key.clone())
                    .or_insert_with(|| YamlValue::Mapping(Mapping::new()));
                if slot.is_null() {
                    *slot = YamlValue::Mapping(Mapping::new());
                }
                match slot {
                    YamlValue::Mapping(nested) => {
                        nested.insert(key, value);
                    }
                    other => {
                        return Err(MergeError::NamespaceNotMapping {
                            key: NAMESPACE.to_string(),
                            found: key_text(other),
                        })
                    }
                }
            }
        }
    }

    if let Some(names) = tags {
        let key = YamlValue::String("tags".to_string());
        if !names.is_empty() || front_matter.contains_key(&key) {
            let names = names.into_iter().map(YamlValue::String).collect();
            front_matter.insert(key, YamlValue::Sequence(names));
        }
    }

    let current = std::mem::take(front_matter);
    *front_matter = sorted(current);
    Ok(())
}
