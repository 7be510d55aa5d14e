//! Email-verification error types.

use thiserror::Error;

/// Errors from the one-time-passcode flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// A required request field is missing.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The email is already verified under a different account.
    #[error("This email is already associated with another account")]
    EmailTaken,

    /// A previously issued code is still valid; no new one is sent.
    #[error("An OTP has already been sent. Please try again after 15 minutes")]
    CodeStillValid,

    /// No OTP request exists for the account.
    #[error("No OTP request found")]
    NoPendingRequest,

    /// The submitted code has expired.
    #[error("OTP has expired")]
    Expired,

    /// The submitted code does not match.
    #[error("Invalid OTP")]
    InvalidCode,

    /// Store or mail delivery failure.
    #[error("{0}")]
    Upstream(String),
}

impl VerificationError {
    /// Stable error code for API responses and logs.
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::MissingField(_) => "VALIDATION_FAILED",
            VerificationError::EmailTaken => "EMAIL_TAKEN",
            VerificationError::CodeStillValid => "OTP_STILL_VALID",
            VerificationError::NoPendingRequest => "OTP_NOT_FOUND",
            VerificationError::Expired => "OTP_EXPIRED",
            VerificationError::InvalidCode => "OTP_INVALID",
            VerificationError::Upstream(_) => "UPSTREAM_ERROR",
        }
    }
}
