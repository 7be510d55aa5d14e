//! Redis store adapters.
//!
//! One redis hash per document. `update` writes only the fields a patch
//! sets (HSET) or clears (HDEL), which gives the partial-merge semantics
//! the concurrency model requires without transactions.

mod record_store;
mod verification_store;

pub use record_store::RedisRecordStore;
pub use verification_store::RedisVerificationStore;
