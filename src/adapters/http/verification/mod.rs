//! Email-verification endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::*;
pub use handlers::*;
pub use routes::routes;
