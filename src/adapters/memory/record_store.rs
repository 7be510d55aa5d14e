//! In-memory subscription record store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::AccountId;
use crate::domain::subscription::{RecordPatch, SubscriptionRecord};
use crate::ports::{RecordStore, StoreError};

/// Record store backed by a process-local map.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<AccountId, SubscriptionRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with an existing record.
    pub async fn with_record(record: SubscriptionRecord) -> Self {
        let store = Self::new();
        store
            .records
            .write()
            .await
            .insert(record.account_id.clone(), record);
        store
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, account_id: &AccountId) -> Result<Option<SubscriptionRecord>, StoreError> {
        Ok(self.records.read().await.get(account_id).cloned())
    }

    async fn set(&self, record: &SubscriptionRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.account_id.clone(), record.clone());
        Ok(())
    }

    async fn update(&self, account_id: &AccountId, patch: &RecordPatch) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let current = records
            .get(account_id)
            .ok_or_else(|| StoreError::MissingRecord {
                account: account_id.to_string(),
            })?;
        let next = current.apply(patch);
        records.insert(account_id.clone(), next);
        Ok(())
    }

    async fn exists(&self, account_id: &AccountId) -> Result<bool, StoreError> {
        Ok(self.records.read().await.contains_key(account_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::{SubscriptionStatus, Update};

    fn account() -> AccountId {
        AccountId::new("acct-1").unwrap()
    }

    fn record() -> SubscriptionRecord {
        SubscriptionRecord::pending(account(), "cus_1", "sub_1", "price_1")
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = InMemoryRecordStore::new();
        store.set(&record()).await.unwrap();

        let loaded = store.get(&account()).await.unwrap().unwrap();
        assert_eq!(loaded, record());
        assert!(store.exists(&account()).await.unwrap());
    }

    #[tokio::test]
    async fn update_merges_patch_fields() {
        let store = InMemoryRecordStore::with_record(record()).await;
        let patch = RecordPatch {
            status: Update::Set(SubscriptionStatus::Active),
            ..Default::default()
        };

        store.update(&account(), &patch).await.unwrap();

        let loaded = store.get(&account()).await.unwrap().unwrap();
        assert_eq!(loaded.status, SubscriptionStatus::Active);
        assert_eq!(loaded.plan_id.as_deref(), Some("price_1"));
    }

    #[tokio::test]
    async fn update_on_missing_record_errors() {
        let store = InMemoryRecordStore::new();
        let result = store.update(&account(), &RecordPatch::default()).await;
        assert!(matches!(result, Err(StoreError::MissingRecord { .. })));
    }
}
