//! In-memory email-verification store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::AccountId;
use crate::domain::verification::VerificationRecord;
use crate::ports::{StoreError, VerificationStore};

/// Verification store backed by a process-local map.
#[derive(Default)]
pub struct InMemoryVerificationStore {
    records: RwLock<HashMap<AccountId, VerificationRecord>>,
}

impl InMemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationStore for InMemoryVerificationStore {
    async fn get(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self.records.read().await.get(account_id).cloned())
    }

    async fn set(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.account_id.clone(), record.clone());
        Ok(())
    }

    async fn find_account_for_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountId>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.email == email)
            .map(|r| r.account_id.clone()))
    }
}
