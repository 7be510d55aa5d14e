//! One-time-passcode verification record.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, Timestamp};

use super::errors::VerificationError;

/// How long an issued passcode stays valid.
pub const OTP_VALIDITY_MINUTES: i64 = 15;

/// Generates a 6-digit one-time passcode.
pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

/// Pending email verification for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub account_id: AccountId,
    pub email: String,
    /// Cleared once verification completes.
    pub otp: Option<String>,
    pub otp_expiry: Option<Timestamp>,
    pub verified: bool,
}

impl VerificationRecord {
    /// Issues a fresh code for the given email.
    pub fn issue(account_id: AccountId, email: impl Into<String>, otp: String, now: Timestamp) -> Self {
        Self {
            account_id,
            email: email.into(),
            otp: Some(otp),
            otp_expiry: Some(now.add_minutes(OTP_VALIDITY_MINUTES)),
            verified: false,
        }
    }

    /// True while a previously issued code has not yet expired.
    pub fn has_live_code(&self, now: Timestamp) -> bool {
        matches!(self.otp_expiry, Some(expiry) if now.is_before(&expiry)) && self.otp.is_some()
    }

    /// Checks a submitted code, consuming it on success.
    ///
    /// Expiry is checked before the code itself so an attacker cannot probe
    /// expired codes for correctness.
    pub fn verify(&mut self, submitted: &str, now: Timestamp) -> Result<(), VerificationError> {
        let expiry = self.otp_expiry.ok_or(VerificationError::NoPendingRequest)?;
        if now.is_after(&expiry) {
            return Err(VerificationError::Expired);
        }
        let stored = self
            .otp
            .as_deref()
            .ok_or(VerificationError::NoPendingRequest)?;
        if stored != submitted {
            return Err(VerificationError::InvalidCode);
        }

        self.verified = true;
        self.otp = None;
        self.otp_expiry = None;
        Ok(())
    }
}
