//! Email-verification domain module.
//!
//! A deliberately small state machine next to the subscription lifecycle:
//! one record per account holding the pending one-time passcode.

mod errors;
mod record;

pub use errors::VerificationError;
pub use record::{generate_otp, VerificationRecord, OTP_VALIDITY_MINUTES};
