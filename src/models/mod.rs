pub mod company;
pub mod error;
pub mod job;
pub mod validate;

pub use company::{Company, CompanyDetail, CompanyFilter, CompanyUpdate, NewCompany};
pub use error::{ModelError, ModelResult};
pub use job::{Job, JobFilter, JobUpdate, NewJob};
