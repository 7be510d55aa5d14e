//! Redis email-verification store.
//!
//! One hash per account at `verification:{account_id}` plus a single
//! `verification_emails` hash as the email -> account index behind the
//! already-claimed check.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::verification::VerificationRecord;
use crate::ports::{StoreError, VerificationStore};

const EMAIL_INDEX_KEY: &str = "verification_emails";

/// Verification store backed by redis hashes.
pub struct RedisVerificationStore {
    connection: ConnectionManager,
}

impl RedisVerificationStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    fn key(account_id: &AccountId) -> String {
        format!("verification:{}", account_id)
    }
}

#[async_trait]
impl VerificationStore for RedisVerificationStore {
    async fn get(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        let mut conn = self.connection.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(Self::key(account_id))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if fields.is_empty() {
            return Ok(None);
        }
        record_from_fields(account_id, &fields).map(Some)
    }

    async fn set(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let key = Self::key(&record.account_id);

        // Drop a stale index entry when the email changed.
        let previous_email: Option<String> = conn
            .hget(&key, "email")
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        if let Some(previous) = previous_email.filter(|p| *p != record.email) {
            pipe.hdel(EMAIL_INDEX_KEY, previous);
        }
        pipe.del(&key)
            .hset_multiple(&key, &record_to_fields(record))
            .hset(EMAIL_INDEX_KEY, &record.email, record.account_id.as_str());
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn find_account_for_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountId>, StoreError> {
        let mut conn = self.connection.clone();
        let uid: Option<String> = conn
            .hget(EMAIL_INDEX_KEY, email)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        uid.map(|uid| {
            AccountId::new(uid).map_err(|_| StoreError::Corrupt {
                account: email.to_string(),
                reason: "empty account id in email index".to_string(),
            })
        })
        .transpose()
    }
}

fn record_to_fields(record: &VerificationRecord) -> Vec<(String, String)> {
    let mut fields = vec![
        ("email".to_string(), record.email.clone()),
        ("verified".to_string(), record.verified.to_string()),
    ];
    if let Some(otp) = &record.otp {
        fields.push(("otp".to_string(), otp.clone()));
    }
    if let Some(expiry) = record.otp_expiry {
        fields.push(("otp_expiry".to_string(), expiry.to_rfc3339()));
    }
    fields
}

fn record_from_fields(
    account_id: &AccountId,
    fields: &HashMap<String, String>,
) -> Result<VerificationRecord, StoreError> {
    let email = fields.get("email").cloned().ok_or_else(|| StoreError::Corrupt {
        account: account_id.to_string(),
        reason: "missing email".to_string(),
    })?;
    let otp_expiry = fields
        .get("otp_expiry")
        .map(|s| Timestamp::parse_rfc3339(s))
        .transpose()
        .map_err(|_| StoreError::Corrupt {
            account: account_id.to_string(),
            reason: "invalid otp expiry".to_string(),
        })?;

    Ok(VerificationRecord {
        account_id: account_id.clone(),
        email,
        otp: fields.get("otp").cloned(),
        otp_expiry,
        verified: fields.get("verified").map(|s| s == "true").unwrap_or(false),
    })
}
