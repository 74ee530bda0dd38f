pub mod db;
pub mod response;

pub use db::DbPool;
pub use response::{ApiResponse, ApiResult};
