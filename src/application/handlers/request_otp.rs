//! RequestOtpHandler - issues an email-verification passcode.

use std::sync::Arc;

use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::verification::{
    generate_otp, VerificationError, VerificationRecord, OTP_VALIDITY_MINUTES,
};
use crate::ports::{Mailer, OutboundEmail, VerificationStore};

/// Command to request a verification code.
#[derive(Debug, Clone)]
pub struct RequestOtpCommand {
    pub account_id: AccountId,
    pub email: String,
}

/// Result of a successful request.
#[derive(Debug, Clone)]
pub struct RequestOtpResult {
    pub email: String,
}

/// Handler for OTP issuance.
///
/// Rejects an email already claimed by a different account and refuses to
/// reissue while a previously sent code is still live.
pub struct RequestOtpHandler {
    store: Arc<dyn VerificationStore>,
    mailer: Arc<dyn Mailer>,
}

impl RequestOtpHandler {
    pub fn new(store: Arc<dyn VerificationStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    pub async fn handle(
        &self,
        cmd: RequestOtpCommand,
    ) -> Result<RequestOtpResult, VerificationError> {
        if cmd.email.trim().is_empty() {
            return Err(VerificationError::MissingField("email"));
        }
        let now = Timestamp::now();

        // 1. The email must not belong to another account.
        let claimed_by = self
            .store
            .find_account_for_email(&cmd.email)
            .await
            .map_err(|e| VerificationError::Upstream(e.to_string()))?;
        if matches!(claimed_by, Some(other) if other != cmd.account_id) {
            return Err(VerificationError::EmailTaken);
        }

        // 2. A live code blocks re-issuance.
        let existing = self
            .store
            .get(&cmd.account_id)
            .await
            .map_err(|e| VerificationError::Upstream(e.to_string()))?;
        if matches!(existing, Some(record) if record.has_live_code(now)) {
            return Err(VerificationError::CodeStillValid);
        }

        // 3. Issue and persist the new code before sending mail.
        let otp = generate_otp();
        let record =
            VerificationRecord::issue(cmd.account_id.clone(), cmd.email.clone(), otp.clone(), now);
        self.store
            .set(&record)
            .await
            .map_err(|e| VerificationError::Upstream(e.to_string()))?;

        // 4. Deliver.
        self.mailer
            .send(verification_email(&cmd.email, &otp))
            .await
            .map_err(|e| VerificationError::Upstream(e.to_string()))?;

        tracing::info!(account_id = %cmd.account_id, "Verification code sent");

        Ok(RequestOtpResult { email: cmd.email })
    }
}

fn verification_email(to: &str, otp: &str) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: "Email Verification OTP".to_string(),
        html: format!(
            "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
             <h2>Email Verification</h2>\
             <p>Your verification OTP is:</p>\
             <h1 style=\"background-color: #f0f0f0; padding: 10px; text-align: center; letter-spacing: 10px;\">{}</h1>\
             <p>This OTP will expire in {} minutes.</p>\
             </div>",
            otp, OTP_VALIDITY_MINUTES
        ),
        text: format!(
            "Your verification OTP is: {}. This OTP will expire in {} minutes.",
            otp, OTP_VALIDITY_MINUTES
        ),
    }
}
