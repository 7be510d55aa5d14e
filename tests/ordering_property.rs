//! Property tests for event-ordering guarantees.
//!
//! For any sequence of update events with strictly increasing source
//! timestamps, the final record must reflect exactly the last event's
//! fields - and the same end state must be reached when the sequence is
//! delivered in any order, because stale events are dropped against the
//! per-group watermark.

use proptest::prelude::*;

use subtrack::domain::foundation::{AccountId, Timestamp};
use subtrack::domain::subscription::{
    reconcile_event, CanonicalEvent, EventKind, PaymentFailurePolicy, ReconcileOutcome,
    SubscriptionRecord, SubscriptionSnapshot, SubscriptionStatus,
};

#[derive(Debug, Clone)]
struct UpdateFields {
    status: String,
    plan: String,
    period_start: i64,
}

fn update_fields() -> impl Strategy<Value = UpdateFields> {
    (
        prop_oneof![Just("active".to_string()), Just("past_due".to_string())],
        "price_[a-z]{3}",
        1_000i64..1_000_000,
    )
        .prop_map(|(status, plan, period_start)| UpdateFields {
            status,
            plan,
            period_start,
        })
}

fn update_event(ts: i64, fields: &UpdateFields) -> CanonicalEvent {
    CanonicalEvent {
        event_id: format!("evt_{}", ts),
        account_id: AccountId::new("user-1").unwrap(),
        occurred_at: ts,
        kind: EventKind::SubscriptionUpdated(SubscriptionSnapshot {
            subscription_id: "sub_1".to_string(),
            customer_id: "cus_1".to_string(),
            status: fields.status.clone(),
            plan_id: fields.plan.clone(),
            current_period_start: Timestamp::from_unix_seconds(fields.period_start),
            current_period_end: Timestamp::from_unix_seconds(fields.period_start + 2_592_000),
            cancel_at_period_end: false,
            created: Timestamp::from_unix_seconds(fields.period_start),
        }),
    }
}

fn seed_record() -> SubscriptionRecord {
    SubscriptionRecord::pending(
        AccountId::new("user-1").unwrap(),
        "cus_1",
        "sub_1",
        "price_seed",
    )
}

fn apply_all(mut record: SubscriptionRecord, events: &[CanonicalEvent]) -> SubscriptionRecord {
    for event in events {
        match reconcile_event(
            &record,
            event,
            PaymentFailurePolicy::default(),
            Timestamp::from_unix_seconds(10_000_000),
        ) {
            ReconcileOutcome::Apply(patch) => record = record.apply(&patch),
            ReconcileOutcome::Ignored(_) => {}
        }
    }
    record
}

fn assert_reflects(record: &SubscriptionRecord, fields: &UpdateFields) {
    assert_eq!(record.status, SubscriptionStatus::from_processor(&fields.status));
    assert_eq!(record.plan_id.as_deref(), Some(fields.plan.as_str()));
    assert_eq!(
        record.current_period_start.unwrap().as_unix_seconds(),
        fields.period_start
    );
    assert_eq!(
        record.current_period_end.unwrap().as_unix_seconds(),
        fields.period_start + 2_592_000
    );
}

proptest! {
    /// In-order delivery: the final record equals the last event applied.
    #[test]
    fn increasing_timestamps_end_at_last_event(updates in prop::collection::vec(update_fields(), 1..12)) {
        let events: Vec<CanonicalEvent> = updates
            .iter()
            .enumerate()
            .map(|(i, fields)| update_event(1_000 + i as i64 * 100, fields))
            .collect();

        let record = apply_all(seed_record(), &events);

        assert_reflects(&record, updates.last().unwrap());
        prop_assert_eq!(
            record.subscription_synced_at,
            Some(1_000 + (updates.len() as i64 - 1) * 100)
        );
    }

    /// Arbitrary delivery order converges on the newest event's fields.
    #[test]
    fn shuffled_delivery_converges_on_newest_event(
        updates in prop::collection::vec(update_fields(), 1..12),
        seed in any::<u64>(),
    ) {
        let mut events: Vec<(i64, UpdateFields)> = updates
            .iter()
            .enumerate()
            .map(|(i, fields)| (1_000 + i as i64 * 100, fields.clone()))
            .collect();

        // Deterministic Fisher-Yates driven by the seed.
        let mut state = seed;
        for i in (1..events.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state % (i as u64 + 1)) as usize;
            events.swap(i, j);
        }

        let canonical: Vec<CanonicalEvent> = events
            .iter()
            .map(|(ts, fields)| update_event(*ts, fields))
            .collect();

        let record = apply_all(seed_record(), &canonical);

        assert_reflects(&record, updates.last().unwrap());
    }

    /// Replaying the whole sequence a second time changes nothing.
    #[test]
    fn replay_is_a_fixed_point(updates in prop::collection::vec(update_fields(), 1..8)) {
        let events: Vec<CanonicalEvent> = updates
            .iter()
            .enumerate()
            .map(|(i, fields)| update_event(1_000 + i as i64 * 100, fields))
            .collect();

        let once = apply_all(seed_record(), &events);
        let twice = apply_all(once.clone(), &events);

        prop_assert_eq!(once, twice);
    }
}
