//! Parameterized SQL helpers shared by the data-access models.
//!
//! Values never reach query text: everything user-supplied travels as a
//! [`SqlValue`] bound to a `$n` placeholder.

use rust_decimal::Decimal;
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    FromRow, Postgres,
};

use crate::models::error::{ModelError, ModelResult};

/// A typed value bound to a positional placeholder.
///
/// Nulls carry their type so Postgres can assign them to the target column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(Option<bool>),
    Int(Option<i32>),
    Text(Option<String>),
    Decimal(Option<Decimal>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        match self {
            SqlValue::Bool(v) => v.is_none(),
            SqlValue::Int(v) => v.is_none(),
            SqlValue::Text(v) => v.is_none(),
            SqlValue::Decimal(v) => v.is_none(),
        }
    }
}

macro_rules! sql_value_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for SqlValue {
            fn from(value: $ty) -> Self {
                SqlValue::$variant(Some(value.into()))
            }
        }

        impl From<Option<$ty>> for SqlValue {
            fn from(value: Option<$ty>) -> Self {
                SqlValue::$variant(value.map(Into::into))
            }
        }
    };
}

sql_value_from!(Bool, bool);
sql_value_from!(Int, i32);
sql_value_from!(Text, String);
sql_value_from!(Text, &str);
sql_value_from!(Decimal, Decimal);

/// Sparse update: an ordered list of `(field, value)` pairs.
///
/// A field that is present is written (an explicit null included); a field
/// that is absent is left untouched. Order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest {
    fields: Vec<(String, SqlValue)>,
}

impl UpdateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`UpdateRequest::push`]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(field, value);
        self
    }

    /// Record a field change. Setting the same field twice keeps its
    /// original position and replaces the value.
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<SqlValue>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for UpdateRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut update = UpdateRequest::new();
        for (field, value) in iter {
            update.push(field, value);
        }
        update
    }
}

/// Domain field name to storage column name, for names that differ.
pub type FieldMap<'a> = &'a [(&'a str, &'a str)];

/// Output of [`sql_for_partial_update`]
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    /// `"col_a"=$1, "col_b"=$2, ...`
    pub set_cols: String,
    /// Bound to `$1..$n` in order
    pub values: Vec<SqlValue>,
}

impl SetClause {
    /// Placeholder for the first parameter after the SET values, typically
    /// the key in the WHERE clause.
    pub fn next_placeholder(&self) -> String {
        format!("${}", self.values.len() + 1)
    }
}

/// Translate a partial update into a parameterized SET clause.
///
/// `{firstName: "Aliya", age: 32}` with `firstName -> first_name` becomes
/// `"first_name"=$1, "age"=$2` bound to `["Aliya", 32]`.
pub fn sql_for_partial_update(update: &UpdateRequest, js_to_sql: FieldMap<'_>) -> ModelResult<SetClause> {
    if update.is_empty() {
        return Err(ModelError::validation("No data"));
    }

    let mut cols = Vec::with_capacity(update.len());
    let mut values = Vec::with_capacity(update.len());

    for (idx, (field, value)) in update.iter().enumerate() {
        let column = js_to_sql
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
            .unwrap_or(field);

        cols.push(format!("{}=${}", quote_identifier(column), idx + 1));
        values.push(value.clone());
    }

    Ok(SetClause { set_cols: cols.join(", "), values })
}

/// Quote SQL identifier to prevent injection
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Bind every value in order onto a `query_as`
pub fn bind_values<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    values: Vec<SqlValue>,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    for value in values {
        q = match value {
            SqlValue::Bool(v) => q.bind(v),
            SqlValue::Int(v) => q.bind(v),
            SqlValue::Text(v) => q.bind(v),
            SqlValue::Decimal(v) => q.bind(v),
        };
    }
    q
}

/// Emit generated SQL at debug level when query logging is enabled
pub fn log_sql(sql: &str, params: usize) {
    if crate::config::config().database.enable_query_logging {
        tracing::debug!(params, "{}", sql);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_FIELDS: FieldMap<'static> = &[
        ("firstName", "first_name"),
        ("lastName", "last_name"),
        ("isAdmin", "is_admin"),
    ];

    #[test]
    fn translates_all_fields_with_mapping() {
        let update = UpdateRequest::new()
            .set("firstName", "NewF")
            .set("lastName", "NewF")
            .set("email", "new@email.com")
            .set("isAdmin", true);

        let set = sql_for_partial_update(&update, USER_FIELDS).unwrap();
        assert_eq!(
            set.set_cols,
            r#""first_name"=$1, "last_name"=$2, "email"=$3, "is_admin"=$4"#
        );
        assert_eq!(
            set.values,
            vec![
                SqlValue::from("NewF"),
                SqlValue::from("NewF"),
                SqlValue::from("new@email.com"),
                SqlValue::from(true),
            ]
        );
    }

    #[test]
    fn translates_subset_of_fields() {
        let update = UpdateRequest::new().set("firstName", "NewF").set("isAdmin", true);

        let set = sql_for_partial_update(&update, USER_FIELDS).unwrap();
        assert_eq!(set.set_cols, r#""first_name"=$1, "is_admin"=$2"#);
        assert_eq!(set.values, vec![SqlValue::from("NewF"), SqlValue::from(true)]);
    }

    #[test]
    fn unmapped_fields_pass_through_verbatim() {
        let update: UpdateRequest = [("a", 1), ("b", 2)].into_iter().collect();

        let set = sql_for_partial_update(&update, &[]).unwrap();
        assert_eq!(set.set_cols, r#""a"=$1, "b"=$2"#);
        assert_eq!(set.values, vec![SqlValue::from(1), SqlValue::from(2)]);
        assert_eq!(set.next_placeholder(), "$3");
    }

    #[test]
    fn empty_update_is_rejected_for_any_map() {
        let empty: FieldMap<'static> = &[];
        for map in [USER_FIELDS, empty] {
            let err = sql_for_partial_update(&UpdateRequest::new(), map).unwrap_err();
            assert!(matches!(err, ModelError::Validation(ref msg) if msg == "No data"));
        }
    }

    #[test]
    fn order_follows_insertion_not_alphabet() {
        let update = UpdateRequest::new()
            .set("zeta", "z")
            .set("logoUrl", None::<String>)
            .set("alpha", 7);

        let set = sql_for_partial_update(&update, &[("logoUrl", "logo_url")]).unwrap();
        assert_eq!(set.set_cols, r#""zeta"=$1, "logo_url"=$2, "alpha"=$3"#);
        assert!(set.values[1].is_null());
        assert_eq!(set.values[2], SqlValue::Int(Some(7)));
    }

    #[test]
    fn placeholder_count_matches_values() {
        let update = UpdateRequest::new()
            .set("title", "t")
            .set("salary", 10)
            .set("equity", Decimal::new(5, 1))
            .set("title", "t2");

        let set = sql_for_partial_update(&update, &[]).unwrap();
        assert_eq!(set.values.len(), 3);
        for i in 1..=set.values.len() {
            assert_eq!(set.set_cols.matches(&format!("${}", i)).count(), 1);
        }
        // re-setting a field replaces its value in place
        assert_eq!(set.values[0], SqlValue::from("t2"));
    }

    #[test]
    fn quotes_embedded_quotes_in_identifiers() {
        assert_eq!(quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }
}
