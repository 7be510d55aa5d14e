//! Redis subscription record store.
//!
//! Each record is a hash at `subscription:{account_id}`; every record
//! field is its own hash field so concurrent partial updates never touch
//! each other's fields.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::subscription::{
    RecordPatch, SubscriptionRecord, SubscriptionStatus, Update,
};
use crate::ports::{RecordStore, StoreError};

/// Record store backed by redis hashes.
pub struct RedisRecordStore {
    connection: ConnectionManager,
}

impl RedisRecordStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    fn key(account_id: &AccountId) -> String {
        format!("subscription:{}", account_id)
    }
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    async fn get(&self, account_id: &AccountId) -> Result<Option<SubscriptionRecord>, StoreError> {
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

    async fn set(&self, record: &SubscriptionRecord) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let key = Self::key(&record.account_id);
        let fields = record_to_fields(record);

        // Replace wholesale: this path only runs at record creation.
        redis::pipe()
            .atomic()
            .del(&key)
            .hset_multiple(&key, &fields)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn update(&self, account_id: &AccountId, patch: &RecordPatch) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let key = Self::key(account_id);

        let exists: bool = conn
            .exists(&key)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if !exists {
            return Err(StoreError::MissingRecord {
                account: account_id.to_string(),
            });
        }

        let (sets, clears) = patch_to_fields(patch);
        if sets.is_empty() && clears.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        if !sets.is_empty() {
            pipe.hset_multiple(&key, &sets);
        }
        for field in clears {
            pipe.hdel(&key, field);
        }
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn exists(&self, account_id: &AccountId) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        conn.exists(Self::key(account_id))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Field mapping
// ════════════════════════════════════════════════════════════════════════════

fn record_to_fields(record: &SubscriptionRecord) -> Vec<(String, String)> {
    let mut fields = vec![
        ("status".to_string(), record.status.as_str().to_string()),
        (
            "cancel_at_period_end".to_string(),
            record.cancel_at_period_end.to_string(),
        ),
    ];

    let mut push_opt = |name: &str, value: Option<String>| {
        if let Some(value) = value {
            fields.push((name.to_string(), value));
        }
    };

    push_opt("plan_id", record.plan_id.clone());
    push_opt("subscription_id", record.subscription_id.clone());
    push_opt("customer_id", record.customer_id.clone());
    push_opt("payment_method_id", record.payment_method_id.clone());
    push_opt(
        "current_period_start",
        record.current_period_start.map(|t| t.to_rfc3339()),
    );
    push_opt(
        "current_period_end",
        record.current_period_end.map(|t| t.to_rfc3339()),
    );
    push_opt("cancelled_at", record.cancelled_at.map(|t| t.to_rfc3339()));
    push_opt("cancel_reason", record.cancel_reason.clone());
    push_opt("created_at", record.created_at.map(|t| t.to_rfc3339()));
    push_opt(
        "last_payment_date",
        record.last_payment_date.map(|t| t.to_rfc3339()),
    );
    push_opt(
        "last_payment_amount",
        record.last_payment_amount.map(|a| a.to_string()),
    );
    push_opt("last_invoice_url", record.last_invoice_url.clone());
    push_opt(
        "last_failed_payment_date",
        record.last_failed_payment_date.map(|t| t.to_rfc3339()),
    );
    push_opt(
        "payment_method_updated_at",
        record.payment_method_updated_at.map(|t| t.to_rfc3339()),
    );
    push_opt(
        "subscription_synced_at",
        record.subscription_synced_at.map(|v| v.to_string()),
    );
    push_opt(
        "payment_synced_at",
        record.payment_synced_at.map(|v| v.to_string()),
    );

    fields
}

/// Splits a patch into HSET pairs and HDEL field names.
fn patch_to_fields(patch: &RecordPatch) -> (Vec<(String, String)>, Vec<&'static str>) {
    let mut sets: Vec<(String, String)> = Vec::new();
    let mut clears: Vec<&'static str> = Vec::new();

    fn apply_string(
        sets: &mut Vec<(String, String)>,
        clears: &mut Vec<&'static str>,
        name: &'static str,
        update: &Update<String>,
    ) {
        match update {
            Update::Keep => {}
            Update::Set(v) => sets.push((name.to_string(), v.clone())),
            Update::Clear => clears.push(name),
        }
    }

    fn apply_timestamp(
        sets: &mut Vec<(String, String)>,
        clears: &mut Vec<&'static str>,
        name: &'static str,
        update: &Update<Timestamp>,
    ) {
        match update {
            Update::Keep => {}
            Update::Set(v) => sets.push((name.to_string(), v.to_rfc3339())),
            Update::Clear => clears.push(name),
        }
    }

    fn apply_i64(
        sets: &mut Vec<(String, String)>,
        clears: &mut Vec<&'static str>,
        name: &'static str,
        update: &Update<i64>,
    ) {
        match update {
            Update::Keep => {}
            Update::Set(v) => sets.push((name.to_string(), v.to_string())),
            Update::Clear => clears.push(name),
        }
    }

    if let Update::Set(status) = &patch.status {
        sets.push(("status".to_string(), status.as_str().to_string()));
    }
    if let Update::Set(flag) = &patch.cancel_at_period_end {
        sets.push(("cancel_at_period_end".to_string(), flag.to_string()));
    }

    apply_string(&mut sets, &mut clears, "plan_id", &patch.plan_id);
    apply_string(
        &mut sets,
        &mut clears,
        "subscription_id",
        &patch.subscription_id,
    );
    apply_string(&mut sets, &mut clears, "customer_id", &patch.customer_id);
    apply_string(
        &mut sets,
        &mut clears,
        "payment_method_id",
        &patch.payment_method_id,
    );
    apply_timestamp(
        &mut sets,
        &mut clears,
        "current_period_start",
        &patch.current_period_start,
    );
    apply_timestamp(
        &mut sets,
        &mut clears,
        "current_period_end",
        &patch.current_period_end,
    );
    apply_timestamp(&mut sets, &mut clears, "cancelled_at", &patch.cancelled_at);
    apply_string(&mut sets, &mut clears, "cancel_reason", &patch.cancel_reason);
    apply_timestamp(&mut sets, &mut clears, "created_at", &patch.created_at);
    apply_timestamp(
        &mut sets,
        &mut clears,
        "last_payment_date",
        &patch.last_payment_date,
    );
    apply_i64(
        &mut sets,
        &mut clears,
        "last_payment_amount",
        &patch.last_payment_amount,
    );
    apply_string(
        &mut sets,
        &mut clears,
        "last_invoice_url",
        &patch.last_invoice_url,
    );
    apply_timestamp(
        &mut sets,
        &mut clears,
        "last_failed_payment_date",
        &patch.last_failed_payment_date,
    );
    apply_timestamp(
        &mut sets,
        &mut clears,
        "payment_method_updated_at",
        &patch.payment_method_updated_at,
    );
    apply_i64(
        &mut sets,
        &mut clears,
        "subscription_synced_at",
        &patch.subscription_synced_at,
    );
    apply_i64(
        &mut sets,
        &mut clears,
        "payment_synced_at",
        &patch.payment_synced_at,
    );

    (sets, clears)
}

fn record_from_fields(
    account_id: &AccountId,
    fields: &HashMap<String, String>,
) -> Result<SubscriptionRecord, StoreError> {
    let corrupt = |reason: &str| StoreError::Corrupt {
        account: account_id.to_string(),
        reason: reason.to_string(),
    };

    let status = fields
        .get("status")
        .and_then(|s| SubscriptionStatus::parse(s))
        .ok_or_else(|| corrupt("missing or invalid status"))?;

    let parse_ts = |name: &str| -> Result<Option<Timestamp>, StoreError> {
        fields
            .get(name)
            .map(|s| Timestamp::parse_rfc3339(s))
            .transpose()
            .map_err(|_| corrupt(&format!("invalid timestamp in {}", name)))
    };
    let parse_i64 = |name: &str| -> Result<Option<i64>, StoreError> {
        fields
            .get(name)
            .map(|s| s.parse::<i64>())
            .transpose()
            .map_err(|_| corrupt(&format!("invalid integer in {}", name)))
    };

    Ok(SubscriptionRecord {
        account_id: account_id.clone(),
        status,
        plan_id: fields.get("plan_id").cloned(),
        subscription_id: fields.get("subscription_id").cloned(),
        customer_id: fields.get("customer_id").cloned(),
        payment_method_id: fields.get("payment_method_id").cloned(),
        current_period_start: parse_ts("current_period_start")?,
        current_period_end: parse_ts("current_period_end")?,
        cancel_at_period_end: fields
            .get("cancel_at_period_end")
            .map(|s| s == "true")
            .unwrap_or(false),
        cancelled_at: parse_ts("cancelled_at")?,
        cancel_reason: fields.get("cancel_reason").cloned(),
        created_at: parse_ts("created_at")?,
        last_payment_date: parse_ts("last_payment_date")?,
        last_payment_amount: parse_i64("last_payment_amount")?,
        last_invoice_url: fields.get("last_invoice_url").cloned(),
        last_failed_payment_date: parse_ts("last_failed_payment_date")?,
        payment_method_updated_at: parse_ts("payment_method_updated_at")?,
        subscription_synced_at: parse_i64("subscription_synced_at")?,
        payment_synced_at: parse_i64("payment_synced_at")?,
    })
}
