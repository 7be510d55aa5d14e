//! Verification store port for the one-time-passcode flow.

use async_trait::async_trait;

use crate::domain::foundation::AccountId;
use crate::domain::verification::VerificationRecord;

use super::record_store::StoreError;

/// Port for email-verification record persistence.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Fetches the verification record for an account.
    async fn get(&self, account_id: &AccountId)
        -> Result<Option<VerificationRecord>, StoreError>;

    /// Writes (or replaces) the verification record for an account.
    async fn set(&self, record: &VerificationRecord) -> Result<(), StoreError>;

    /// Finds the account that currently claims an email address, if any.
    ///
    /// Used to reject a verification request for an email already attached
    /// to a different account.
    async fn find_account_for_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountId>, StoreError>;
}
