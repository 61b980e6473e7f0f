use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::database::sql::{bind_values, log_sql, sql_for_partial_update, FieldMap, UpdateRequest};
use crate::filter::FilterWhere;

use super::error::{ModelError, ModelResult};
use super::validate::{self, double_option, empty_as_none};

const JOB_COLUMNS: &str = "id, title, salary, equity, company_handle";

// Every updatable job field already matches its column name
const JOB_FIELD_MAP: FieldMap<'static> = &[];

/// A job listing. `equity` is a NUMERIC fraction and serializes as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl NewJob {
    pub fn validate(&self) -> ModelResult<()> {
        validate::non_blank("title", &self.title)?;
        validate::non_negative("salary", self.salary)?;
        validate::equity(self.equity)
    }
}

/// Partial update. The owning company and id cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub equity: Option<Option<Decimal>>,
}

impl JobUpdate {
    pub fn validate(&self) -> ModelResult<()> {
        validate::not_null("title", &self.title)?;
        if let Some(Some(title)) = &self.title {
            validate::non_blank("title", title)?;
        }
        validate::non_negative("salary", self.salary.flatten())?;
        validate::equity(self.equity.flatten())
    }

    pub fn into_update_request(self) -> UpdateRequest {
        let mut update = UpdateRequest::new();
        if let Some(title) = self.title {
            update.push("title", title);
        }
        if let Some(salary) = self.salary {
            update.push("salary", salary);
        }
        if let Some(equity) = self.equity {
            update.push("equity", equity);
        }
        update
    }
}

/// Query-string filters for [`Job::find_all`]; all present filters are AND-ed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilter {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_salary: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub max_salary: Option<i32>,
    /// `true` restricts to jobs with non-zero equity; `false` is no constraint
    #[serde(default, deserialize_with = "empty_as_none")]
    pub has_equity: Option<bool>,
}

impl JobFilter {
    fn to_where(&self) -> ModelResult<FilterWhere> {
        validate::range("minSalary", self.min_salary, "maxSalary", self.max_salary)?;

        let mut filter = FilterWhere::new();
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            filter.ilike_contains("title", title);
        }
        if let Some(min) = self.min_salary {
            filter.gte("salary", min);
        }
        if let Some(max) = self.max_salary {
            filter.lte("salary", max);
        }
        if self.has_equity == Some(true) {
            filter.gt("equity", Decimal::ZERO);
        }
        Ok(filter)
    }
}

impl Job {
    /// Create a job under an existing company.
    ///
    /// Fails with `Referential` when `company_handle` does not exist. The
    /// existence check and the insert are separate statements; a company
    /// deleted in between is caught by the foreign key instead.
    pub async fn create(pool: &PgPool, data: NewJob) -> ModelResult<Job> {
        data.validate()?;

        // Malformed handles cannot belong to any company
        if validate::handle("companyHandle", &data.company_handle).is_err() {
            return Err(ModelError::Referential(format!("No such company: {}", data.company_handle)));
        }

        let parent: Option<String> = sqlx::query_scalar("SELECT handle FROM companies WHERE handle = $1")
            .bind(&data.company_handle)
            .fetch_optional(pool)
            .await?;
        if parent.is_none() {
            return Err(ModelError::Referential(format!("No such company: {}", data.company_handle)));
        }

        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) VALUES ($1, $2, $3, $4) RETURNING {}",
            JOB_COLUMNS
        );
        log_sql(&sql, 4);

        let handle = data.company_handle.clone();
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(data.title)
            .bind(data.salary)
            .bind(data.equity)
            .bind(data.company_handle)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                ModelError::from_write(e, |db| {
                    db.is_foreign_key_violation()
                        .then(|| ModelError::Referential(format!("No such company: {}", handle)))
                })
            })?;

        info!("Created job {} for {}", job.id, job.company_handle);
        Ok(job)
    }

    /// All jobs matching `filter`, ordered by title.
    pub async fn find_all(pool: &PgPool, filter: &JobFilter) -> ModelResult<Vec<Job>> {
        let (where_clause, params) = filter.to_where()?.build();

        let sql = format!("SELECT {} FROM jobs {} ORDER BY title, id", JOB_COLUMNS, where_clause);
        log_sql(&sql, params.len());

        let jobs = bind_values(sqlx::query_as::<_, Job>(&sql), params)
            .fetch_all(pool)
            .await?;
        Ok(jobs)
    }

    pub async fn get(pool: &PgPool, id: i32) -> ModelResult<Job> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ModelError::not_found(format!("No job: {}", id)))
    }

    /// Jobs belonging to one company, oldest first
    pub async fn for_company(pool: &PgPool, handle: &str) -> ModelResult<Vec<Job>> {
        let sql = format!("SELECT {} FROM jobs WHERE company_handle = $1 ORDER BY id", JOB_COLUMNS);
        let jobs = sqlx::query_as::<_, Job>(&sql).bind(handle).fetch_all(pool).await?;
        Ok(jobs)
    }

    /// Partial update; only the supplied fields change.
    pub async fn update(pool: &PgPool, id: i32, data: JobUpdate) -> ModelResult<Job> {
        data.validate()?;
        let set = sql_for_partial_update(&data.into_update_request(), JOB_FIELD_MAP)?;

        let sql = format!(
            "UPDATE jobs SET {} WHERE id = {} RETURNING {}",
            set.set_cols,
            set.next_placeholder(),
            JOB_COLUMNS
        );
        log_sql(&sql, set.values.len() + 1);

        bind_values(sqlx::query_as::<_, Job>(&sql), set.values)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| ModelError::from_write(e, |_| None))?
            .ok_or_else(|| ModelError::not_found(format!("No job: {}", id)))
    }

    pub async fn remove(pool: &PgPool, id: i32) -> ModelResult<()> {
        let deleted: Option<i32> = sqlx::query_scalar("DELETE FROM jobs WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match deleted {
            Some(_) => {
                info!("Deleted job {}", id);
                Ok(())
            }
            None => Err(ModelError::not_found(format!("No job: {}", id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::unreachable_pool;
    use axum::{extract::Query, http::Uri};
    use serde_json::json;

    fn new_job(company_handle: &str) -> NewJob {
        NewJob {
            title: "new".into(),
            salary: None,
            equity: None,
            company_handle: company_handle.into(),
        }
    }

    #[tokio::test]
    async fn malformed_company_handle_is_referential() {
        let pool = unreachable_pool();
        let too_long = "a".repeat(30);
        for handle in ["Not-A-Comp", "no such company", too_long.as_str()] {
            let err = Job::create(&pool, new_job(handle)).await.unwrap_err();
            assert!(
                matches!(err, ModelError::Referential(ref msg) if msg == &format!("No such company: {}", handle)),
                "{}: {:?}",
                handle,
                err
            );
        }
    }

    #[test]
    fn update_never_touches_company_handle_column() {
        let data: JobUpdate = serde_json::from_value(json!({ "title": "t", "salary": 1, "equity": "0.1" })).unwrap();
        let set = sql_for_partial_update(&data.into_update_request(), JOB_FIELD_MAP).unwrap();
        assert_eq!(set.set_cols, r#""title"=$1, "salary"=$2, "equity"=$3"#);
    }

    #[test]
    fn empty_numeric_query_values_are_absent() {
        let uri: Uri = "/jobs?title=&minSalary=&maxSalary=&hasEquity=".parse().unwrap();
        let Query(filter) = Query::<JobFilter>::try_from_uri(&uri).unwrap();
        assert_eq!(filter.min_salary, None);
        assert_eq!(filter.max_salary, None);
        assert_eq!(filter.has_equity, None);
        assert!(filter.to_where().unwrap().is_empty());

        let uri: Uri = "/jobs?minSalary=100&hasEquity=true".parse().unwrap();
        let Query(filter) = Query::<JobFilter>::try_from_uri(&uri).unwrap();
        assert_eq!(filter.min_salary, Some(100));
        assert_eq!(filter.has_equity, Some(true));

        let uri: Uri = "/jobs?minSalary=lots".parse().unwrap();
        assert!(Query::<JobFilter>::try_from_uri(&uri).is_err());
    }

    #[test]
    fn update_keeps_absent_and_null_apart() {
        let data: JobUpdate = serde_json::from_value(json!({ "salary": null, "title": "New" })).unwrap();
        assert_eq!(data.salary, Some(None));
        assert_eq!(data.equity, None);

        let update = data.into_update_request();
        let fields: Vec<&str> = update.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["title", "salary"]);
    }

    #[test]
    fn update_rejects_company_handle() {
        let res = serde_json::from_value::<JobUpdate>(json!({ "companyHandle": "c1-new" }));
        assert!(res.is_err());
    }

    #[test]
    fn update_rejects_null_title() {
        let data: JobUpdate = serde_json::from_value(json!({ "title": null })).unwrap();
        assert!(matches!(data.validate(), Err(ModelError::Validation(_))));
    }

    #[test]
    fn equity_round_trips_as_string() {
        let job = Job {
            id: 1,
            title: "j1".into(),
            salary: Some(60000),
            equity: Some(Decimal::new(5, 1)),
            company_handle: "c1".into(),
        };
        let v = serde_json::to_value(&job).unwrap();
        assert_eq!(v["equity"], json!("0.5"));
        assert_eq!(v["companyHandle"], json!("c1"));
    }

    #[test]
    fn new_job_accepts_numeric_equity() {
        let data: NewJob = serde_json::from_value(json!({
            "title": "new", "salary": 75000, "equity": 0.5, "companyHandle": "c1"
        }))
        .unwrap();
        assert_eq!(data.equity, Some(Decimal::new(5, 1)));
        assert!(data.validate().is_ok());
    }

    #[test]
    fn filter_combines_every_present_field() {
        let filter = JobFilter {
            title: Some("eng".into()),
            min_salary: Some(1000),
            max_salary: None,
            has_equity: Some(true),
        };
        let (clause, params) = filter.to_where().unwrap().build();
        assert_eq!(
            clause,
            r#"WHERE "title" ILIKE $1 AND "salary" >= $2 AND "equity" > $3"#
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn has_equity_false_adds_no_constraint() {
        let filter = JobFilter { has_equity: Some(false), ..Default::default() };
        assert!(filter.to_where().unwrap().is_empty());
    }

    #[test]
    fn salary_range_is_checked() {
        let filter = JobFilter { min_salary: Some(10), max_salary: Some(5), ..Default::default() };
        assert!(matches!(filter.to_where(), Err(ModelError::Validation(_))));
    }
}
