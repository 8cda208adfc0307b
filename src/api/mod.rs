pub mod error;
pub mod handlers;
pub mod qr;
pub mod rate_limit;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_api_router;
