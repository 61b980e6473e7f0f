use crate::database::sql::{quote_identifier, SqlValue};

/// Accumulates AND-ed predicates and the values bound to them.
///
/// Columns are static identifiers chosen by the caller; values always go
/// through a placeholder, numbered from `$1` in push order.
#[derive(Debug, Default)]
pub struct FilterWhere {
    conditions: Vec<String>,
    param_values: Vec<SqlValue>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring match, with LIKE wildcards in `needle`
    /// matched literally.
    pub fn ilike_contains(&mut self, column: &str, needle: &str) -> &mut Self {
        let pattern = format!("%{}%", escape_like(needle));
        let p = self.param(pattern.into());
        self.conditions.push(format!("{} ILIKE {}", quote_identifier(column), p));
        self
    }

    pub fn gte(&mut self, column: &str, value: impl Into<SqlValue>) -> &mut Self {
        self.compare(column, ">=", value.into())
    }

    pub fn lte(&mut self, column: &str, value: impl Into<SqlValue>) -> &mut Self {
        self.compare(column, "<=", value.into())
    }

    pub fn gt(&mut self, column: &str, value: impl Into<SqlValue>) -> &mut Self {
        self.compare(column, ">", value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// `("WHERE a AND b", params)`, or an empty clause when nothing was added
    pub fn build(self) -> (String, Vec<SqlValue>) {
        if self.conditions.is_empty() {
            return (String::new(), vec![]);
        }
        (format!("WHERE {}", self.conditions.join(" AND ")), self.param_values)
    }

    fn compare(&mut self, column: &str, op: &str, value: SqlValue) -> &mut Self {
        let p = self.param(value);
        self.conditions.push(format!("{} {} {}", quote_identifier(column), op, p));
        self
    }

    fn param(&mut self, value: SqlValue) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn empty_filter_has_no_where() {
        let (clause, params) = FilterWhere::new().build();
        assert_eq!(clause, "");
        assert!(params.is_empty());
    }

    #[test]
    fn numbers_placeholders_in_push_order() {
        let mut f = FilterWhere::new();
        f.ilike_contains("name", "net")
            .gte("num_employees", 10)
            .lte("num_employees", 500);

        let (clause, params) = f.build();
        assert_eq!(
            clause,
            r#"WHERE "name" ILIKE $1 AND "num_employees" >= $2 AND "num_employees" <= $3"#
        );
        assert_eq!(
            params,
            vec![SqlValue::from("%net%"), SqlValue::from(10), SqlValue::from(500)]
        );
    }

    #[test]
    fn user_text_never_reaches_query() {
        let mut f = FilterWhere::new();
        f.ilike_contains("title", "x' OR 1=1 --");

        let (clause, params) = f.build();
        assert!(!clause.contains("OR 1=1"));
        assert_eq!(params, vec![SqlValue::from("%x' OR 1=1 --%")]);
    }

    #[test]
    fn escapes_like_wildcards() {
        let mut f = FilterWhere::new();
        f.ilike_contains("title", r"100%_sure\");

        let (_, params) = f.build();
        assert_eq!(params, vec![SqlValue::from(r"%100\%\_sure\\%")]);
    }

    #[test]
    fn strict_greater_than() {
        let mut f = FilterWhere::new();
        f.gt("equity", Decimal::ZERO);
        assert!(!f.is_empty());

        let (clause, params) = f.build();
        assert_eq!(clause, r#"WHERE "equity" > $1"#);
        assert_eq!(params, vec![SqlValue::Decimal(Some(Decimal::ZERO))]);
    }
}
