//! Application layer - use-case orchestration.
//!
//! Command handlers wire the pure reconciliation engine to the ports.
//! Each handler owns the ports it needs behind `Arc<dyn _>` and exposes a
//! single `handle` method.

pub mod effects;
pub mod handlers;
pub mod normalizer;

pub use effects::{execute_effect, EffectOutcome, InvoiceSettlement};
pub use normalizer::{EventNormalizer, NormalizedEvent};
