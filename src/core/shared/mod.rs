pub mod error;
pub mod schema;
pub mod state;
pub mod utils;

pub use error::{ApiError, ApiResult};
pub use utils::{run_blocking, DbPool, Pagination};
