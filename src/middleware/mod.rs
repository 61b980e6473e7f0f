pub mod auth;
pub mod extract;
pub mod response;

pub use auth::{authenticate_jwt, ensure_admin, AuthUser};
pub use extract::{ValidJson, ValidPath, ValidQuery};
pub use response::{ApiResponse, ApiResult};
