//! Billing endpoints - webhook and user subscription actions.

mod dto;
mod handlers;
mod routes;

pub use dto::*;
pub use handlers::*;
pub use routes::routes;
