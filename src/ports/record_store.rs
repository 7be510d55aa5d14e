//! Record store port for subscription state persistence.
//!
//! The store is a key-value document store keyed by account identifier.
//! `update` must merge only the fields the patch sets - concurrent handlers
//! writing disjoint fields must not clobber each other (there is no
//! cross-request transaction).

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::AccountId;
use crate::domain::subscription::{RecordPatch, SubscriptionRecord};

/// Errors from record store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backing store could not be reached or the call failed.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be decoded.
    #[error("Corrupt record for account {account}: {reason}")]
    Corrupt { account: String, reason: String },

    /// A merge targeted an account with no stored record.
    #[error("No stored record for account {account}")]
    MissingRecord { account: String },
}

/// Port for the subscription record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetches the record for an account, if one exists.
    async fn get(&self, account_id: &AccountId) -> Result<Option<SubscriptionRecord>, StoreError>;

    /// Writes a full record. Only used when the record is first created.
    async fn set(&self, record: &SubscriptionRecord) -> Result<(), StoreError>;

    /// Merges the patch into the stored record, writing only the fields the
    /// patch sets or clears.
    async fn update(&self, account_id: &AccountId, patch: &RecordPatch) -> Result<(), StoreError>;

    /// Existence check without decoding the record.
    async fn exists(&self, account_id: &AccountId) -> Result<bool, StoreError>;
}
