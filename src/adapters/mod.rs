//! Adapters - Implementations of ports against real infrastructure.

pub mod email;
pub mod http;
pub mod memory;
pub mod redis;
pub mod stripe;
