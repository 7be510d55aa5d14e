//! HTTP DTOs for the email-verification endpoints.

use serde::{Deserialize, Serialize};

/// Request for a verification code.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestOtpRequest {
    pub uid: String,
    pub email: String,
}

/// Submission of a received code.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    pub uid: String,
    pub otp: String,
}

/// Success body for verification endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "newEmail", skip_serializing_if = "Option::is_none")]
    pub new_email: Option<String>,
}

/// Failure body for verification endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationErrorResponse {
    pub success: bool,
    pub error: String,
}

impl VerificationErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}
