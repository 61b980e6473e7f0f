//! Field-level checks applied before any write reaches the database.

use rust_decimal::Decimal;
use std::{fmt::Display, str::FromStr};

use serde::{de, Deserialize, Deserializer};

use super::error::{ModelError, ModelResult};

pub const MAX_HANDLE_LEN: usize = 25;

/// Keep `Some(None)` for an explicit JSON null, distinct from an absent key.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query-string scalar where an empty value (`?minSalary=`) means absent.
///
/// Use with `#[serde(default, deserialize_with = "empty_as_none")]`.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(de::Error::custom),
    }
}

pub fn handle(field: &str, value: &str) -> ModelResult<()> {
    if value.is_empty() || value.len() > MAX_HANDLE_LEN {
        return Err(ModelError::validation(format!(
            "{} must be 1-{} characters",
            field, MAX_HANDLE_LEN
        )));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ModelError::validation(format!(
            "{} may only contain lowercase letters, digits and hyphens",
            field
        )));
    }
    Ok(())
}

pub fn non_blank(field: &str, value: &str) -> ModelResult<()> {
    if value.trim().is_empty() {
        return Err(ModelError::validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

pub fn non_negative(field: &str, value: Option<i32>) -> ModelResult<()> {
    match value {
        Some(n) if n < 0 => Err(ModelError::validation(format!("{} must be non-negative", field))),
        _ => Ok(()),
    }
}

pub fn equity(value: Option<Decimal>) -> ModelResult<()> {
    match value {
        Some(e) if e < Decimal::ZERO || e > Decimal::ONE => {
            Err(ModelError::validation("equity must be between 0 and 1"))
        }
        _ => Ok(()),
    }
}

pub fn url(field: &str, value: Option<&str>) -> ModelResult<()> {
    match value {
        Some(raw) => url::Url::parse(raw)
            .map(|_| ())
            .map_err(|_| ModelError::validation(format!("{} must be a valid URL", field))),
        None => Ok(()),
    }
}

/// Reject an explicit null for a column that does not accept one
pub fn not_null<T>(field: &str, value: &Option<Option<T>>) -> ModelResult<()> {
    match value {
        Some(None) => Err(ModelError::validation(format!("{} cannot be null", field))),
        _ => Ok(()),
    }
}

/// Lower bound must not exceed upper bound when both are given
pub fn range(min_field: &str, min: Option<i32>, max_field: &str, max: Option<i32>) -> ModelResult<()> {
    match (min, max) {
        (Some(lo), Some(hi)) if lo > hi => Err(ModelError::validation(format!(
            "{} cannot be greater than {}",
            min_field, max_field
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Bounds {
        #[serde(default, deserialize_with = "empty_as_none")]
        min: Option<i32>,
    }

    #[test]
    fn empty_values_deserialize_as_absent() {
        let parse = |v| serde_json::from_value::<Bounds>(v).map(|b| b.min);
        assert_eq!(parse(serde_json::json!({ "min": "" })).unwrap(), None);
        assert_eq!(parse(serde_json::json!({})).unwrap(), None);
        assert_eq!(parse(serde_json::json!({ "min": "7" })).unwrap(), Some(7));
        assert!(parse(serde_json::json!({ "min": "seven" })).is_err());
    }

    #[test]
    fn handles() {
        assert!(handle("handle", "c1").is_ok());
        assert!(handle("handle", "bauer-gallagher").is_ok());
        assert!(handle("handle", "").is_err());
        assert!(handle("handle", "Upper").is_err());
        assert!(handle("handle", "has space").is_err());
        assert!(handle("handle", &"a".repeat(26)).is_err());
    }

    #[test]
    fn ranges() {
        assert!(range("minSalary", Some(1), "maxSalary", Some(1)).is_ok());
        assert!(range("minSalary", None, "maxSalary", Some(1)).is_ok());
        let err = range("minEmployees", Some(5), "maxEmployees", Some(1)).unwrap_err();
        assert_eq!(err.to_string(), "minEmployees cannot be greater than maxEmployees");
    }

    #[test]
    fn equity_bounds() {
        assert!(equity(Some(Decimal::ONE)).is_ok());
        assert!(equity(Some(Decimal::new(4, 2))).is_ok());
        assert!(equity(Some(Decimal::new(11, 1))).is_err());
        assert!(equity(Some(Decimal::NEGATIVE_ONE)).is_err());
    }

    #[test]
    fn urls_and_nulls() {
        assert!(url("logoUrl", Some("http://c1.img")).is_ok());
        assert!(url("logoUrl", Some("not a url")).is_err());
        assert!(not_null::<String>("name", &Some(None)).is_err());
        assert!(not_null("name", &Some(Some("x"))).is_ok());
        assert!(not_null::<String>("name", &None).is_ok());
    }
}
