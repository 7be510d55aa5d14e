//! HTTP handlers for the email-verification endpoints.

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::{RequestOtpCommand, VerifyOtpCommand};
use crate::domain::foundation::AccountId;
use crate::domain::verification::VerificationError;

use super::super::AppState;
use super::dto::{
    RequestOtpRequest, VerificationErrorResponse, VerificationResponse, VerifyOtpRequest,
};

fn parse_uid(uid: &str) -> Result<AccountId, VerificationApiError> {
    AccountId::new(uid).map_err(|_| VerificationApiError(VerificationError::MissingField("uid")))
}

/// POST /api/email/request-otp - issue a verification code.
pub async fn request_otp(
    State(state): State<AppState>,
    Json(request): Json<RequestOtpRequest>,
) -> Result<impl IntoResponse, VerificationApiError> {
    let handler = state.request_otp_handler();
    let cmd = RequestOtpCommand {
        account_id: parse_uid(&request.uid)?,
        email: request.email,
    };

    handler.handle(cmd).await?;

    Ok(Json(VerificationResponse {
        success: true,
        message: "OTP sent successfully".to_string(),
        new_email: None,
    }))
}

/// POST /api/email/verify-otp - verify a submitted code.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, VerificationApiError> {
    let handler = state.verify_otp_handler();
    let cmd = VerifyOtpCommand {
        account_id: parse_uid(&request.uid)?,
        otp: request.otp,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(VerificationResponse {
        success: true,
        message: "Email verified successfully".to_string(),
        new_email: Some(result.email),
    }))
}

/// API error type that converts verification errors to HTTP responses.
pub struct VerificationApiError(pub VerificationError);

impl From<VerificationError> for VerificationApiError {
    fn from(err: VerificationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for VerificationApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            VerificationError::MissingField(_)
            | VerificationError::EmailTaken
            | VerificationError::CodeStillValid
            | VerificationError::Expired
            | VerificationError::InvalidCode => StatusCode::BAD_REQUEST,
            VerificationError::NoPendingRequest => StatusCode::NOT_FOUND,
            VerificationError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::warn!(code = self.0.code(), error = %self.0, "Verification request failed");
        (
            status,
            Json(VerificationErrorResponse::new(self.0.to_string())),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_mapping_matches_contract() {
        let cases = [
            (VerificationError::MissingField("uid"), StatusCode::BAD_REQUEST),
            (VerificationError::EmailTaken, StatusCode::BAD_REQUEST),
            (VerificationError::CodeStillValid, StatusCode::BAD_REQUEST),
            (VerificationError::NoPendingRequest, StatusCode::NOT_FOUND),
            (VerificationError::Expired, StatusCode::BAD_REQUEST),
            (VerificationError::InvalidCode, StatusCode::BAD_REQUEST),
            (
                VerificationError::Upstream("mail down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let response = VerificationApiError(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
