use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::database::sql::{bind_values, log_sql, sql_for_partial_update, FieldMap, UpdateRequest};
use crate::filter::FilterWhere;

use super::error::{ModelError, ModelResult};
use super::job::Job;
use super::validate::{self, double_option, empty_as_none};

const COMPANY_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

const COMPANY_FIELD_MAP: FieldMap<'static> = &[
    ("numEmployees", "num_employees"),
    ("logoUrl", "logo_url"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// A company together with its job listings; `jobs` is omitted when empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl NewCompany {
    pub fn validate(&self) -> ModelResult<()> {
        validate::handle("handle", &self.handle)?;
        validate::non_blank("name", &self.name)?;
        validate::non_negative("numEmployees", self.num_employees)?;
        validate::url("logoUrl", self.logo_url.as_deref())
    }
}

/// Partial update. The handle is the key and cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub num_employees: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
}

impl CompanyUpdate {
    pub fn validate(&self) -> ModelResult<()> {
        validate::not_null("name", &self.name)?;
        validate::not_null("description", &self.description)?;
        if let Some(Some(name)) = &self.name {
            validate::non_blank("name", name)?;
        }
        validate::non_negative("numEmployees", self.num_employees.flatten())?;
        validate::url("logoUrl", self.logo_url.as_ref().and_then(|u| u.as_deref()))
    }

    /// Fields keyed by their JSON names; [`COMPANY_FIELD_MAP`] resolves columns.
    pub fn into_update_request(self) -> UpdateRequest {
        let mut update = UpdateRequest::new();
        if let Some(name) = self.name {
            update.push("name", name);
        }
        if let Some(description) = self.description {
            update.push("description", description);
        }
        if let Some(num_employees) = self.num_employees {
            update.push("numEmployees", num_employees);
        }
        if let Some(logo_url) = self.logo_url {
            update.push("logoUrl", logo_url);
        }
        update
    }
}

/// Query-string filters for [`Company::find_all`]; all present filters are AND-ed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyFilter {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_employees: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub max_employees: Option<i32>,
}

impl CompanyFilter {
    fn to_where(&self) -> ModelResult<FilterWhere> {
        validate::range("minEmployees", self.min_employees, "maxEmployees", self.max_employees)?;

        let mut filter = FilterWhere::new();
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            filter.ilike_contains("name", name);
        }
        if let Some(min) = self.min_employees {
            filter.gte("num_employees", min);
        }
        if let Some(max) = self.max_employees {
            filter.lte("num_employees", max);
        }
        Ok(filter)
    }
}

impl Company {
    /// Create a company.
    ///
    /// Fails with `Duplicate` when the handle is taken. A concurrent insert
    /// of the same handle slips past the lookup and is caught by the key.
    pub async fn create(pool: &PgPool, data: NewCompany) -> ModelResult<Company> {
        data.validate()?;

        let existing: Option<String> = sqlx::query_scalar("SELECT handle FROM companies WHERE handle = $1")
            .bind(&data.handle)
            .fetch_optional(pool)
            .await?;
        if existing.is_some() {
            return Err(ModelError::Duplicate(format!("Duplicate company: {}", data.handle)));
        }

        let sql = format!(
            "INSERT INTO companies ({}) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            COMPANY_COLUMNS, COMPANY_COLUMNS
        );
        log_sql(&sql, 5);

        let handle = data.handle.clone();
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(data.handle)
            .bind(data.name)
            .bind(data.description)
            .bind(data.num_employees)
            .bind(data.logo_url)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                ModelError::from_write(e, |db| {
                    db.is_unique_violation()
                        .then(|| ModelError::Duplicate(format!("Duplicate company: {}", handle)))
                })
            })?;

        info!("Created company {}", company.handle);
        Ok(company)
    }

    /// All companies matching `filter`, ordered by name.
    pub async fn find_all(pool: &PgPool, filter: &CompanyFilter) -> ModelResult<Vec<Company>> {
        let (where_clause, params) = filter.to_where()?.build();

        let sql = format!(
            "SELECT {} FROM companies {} ORDER BY name, handle",
            COMPANY_COLUMNS, where_clause
        );
        log_sql(&sql, params.len());

        let companies = bind_values(sqlx::query_as::<_, Company>(&sql), params)
            .fetch_all(pool)
            .await?;
        Ok(companies)
    }

    /// One company with its jobs.
    pub async fn get(pool: &PgPool, handle: &str) -> ModelResult<CompanyDetail> {
        let sql = format!("SELECT {} FROM companies WHERE handle = $1", COMPANY_COLUMNS);
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(handle)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ModelError::not_found(format!("No company: {}", handle)))?;

        let jobs = Job::for_company(pool, handle).await?;
        Ok(CompanyDetail { company, jobs })
    }

    /// Partial update; only the supplied fields change.
    pub async fn update(pool: &PgPool, handle: &str, data: CompanyUpdate) -> ModelResult<Company> {
        data.validate()?;
        let set = sql_for_partial_update(&data.into_update_request(), COMPANY_FIELD_MAP)?;

        let sql = format!(
            "UPDATE companies SET {} WHERE handle = {} RETURNING {}",
            set.set_cols,
            set.next_placeholder(),
            COMPANY_COLUMNS
        );
        log_sql(&sql, set.values.len() + 1);

        bind_values(sqlx::query_as::<_, Company>(&sql), set.values)
            .bind(handle)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                ModelError::from_write(e, |db| {
                    db.is_unique_violation()
                        .then(|| ModelError::Duplicate("Company name already in use".to_string()))
                })
            })?
            .ok_or_else(|| ModelError::not_found(format!("No company: {}", handle)))
    }

    /// Delete a company; its jobs go with it.
    pub async fn remove(pool: &PgPool, handle: &str) -> ModelResult<()> {
        let deleted: Option<String> = sqlx::query_scalar("DELETE FROM companies WHERE handle = $1 RETURNING handle")
            .bind(handle)
            .fetch_optional(pool)
            .await?;

        match deleted {
            Some(_) => {
                info!("Deleted company {}", handle);
                Ok(())
            }
            None => Err(ModelError::not_found(format!("No company: {}", handle))),
        }
    }
}
