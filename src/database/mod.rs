pub mod manager;
pub mod sql;

pub use manager::{DatabaseError, DatabaseManager};
pub use sql::{sql_for_partial_update, FieldMap, SetClause, SqlValue, UpdateRequest};
