//! Property-based tests for ledger period semantics
//!
//! These replay the exclusive-update close-out rule over arbitrary
//! activation histories and check the invariants the database constraint
//! ultimately guarantees:
//! - active periods of one account never overlap
//! - activating a new subscription ends the previous one exactly at the
//!   new period start
//! - storage package sizing always covers the reported usage

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use fieldhub_billing_core::min_storage_package_quantity;
use fieldhub_types::{
    AccountId, PlanId, Subscription, SubscriptionId, SubscriptionStatus,
};

fn ts(offset_minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(offset_minutes)
}

fn subscription(account_id: AccountId, active_since: DateTime<Utc>) -> Subscription {
    Subscription {
        id: SubscriptionId::new(),
        account_id,
        plan_id: PlanId::new(),
        status: SubscriptionStatus::ActivePaid,
        requested_cancel_at: None,
        active_since: Some(active_since),
        active_until: None,
        billing_cycle_anchor_at: None,
        current_period_since: None,
        current_period_until: None,
        created_at: active_since,
        updated_at: active_since,
    }
}

/// Replay of the exclusive update: activating a new subscription closes
/// every subscription of the account that is active at the new period
/// start.
fn activate(ledger: &mut Vec<Subscription>, account_id: AccountId, at: DateTime<Utc>) {
    for sub in ledger.iter_mut() {
        if sub.is_active_at(at) {
            sub.close_out(at);
        }
    }
    ledger.push(subscription(account_id, at));
}

/// Strictly increasing activation offsets, in minutes
fn arb_activation_offsets() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::btree_set(1i64..100_000, 1..20)
        .prop_map(|set| set.into_iter().collect())
}

proptest! {
    /// Property: no two periods of the same account ever overlap
    #[test]
    fn prop_activations_never_overlap(offsets in arb_activation_offsets()) {
        let account_id = AccountId::new();
        let mut ledger = Vec::new();
        for offset in &offsets {
            activate(&mut ledger, account_id, ts(*offset));
        }

        for (i, a) in ledger.iter().enumerate() {
            for b in ledger.iter().skip(i + 1) {
                let (pa, pb) = (a.active_period().unwrap(), b.active_period().unwrap());
                prop_assert!(
                    !pa.overlaps(&pb),
                    "periods overlap: {pa:?} and {pb:?}"
                );
            }
        }
    }

    /// Property: exactly one subscription stays open-ended, and each closed
    /// one ends at its successor's activation instant with a cancelled
    /// status
    #[test]
    fn prop_close_out_hands_over_at_activation_instant(offsets in arb_activation_offsets()) {
        let account_id = AccountId::new();
        let mut ledger = Vec::new();
        for offset in &offsets {
            activate(&mut ledger, account_id, ts(*offset));
        }

        let open: Vec<_> = ledger.iter().filter(|s| s.active_until.is_none()).collect();
        prop_assert_eq!(open.len(), 1);
        prop_assert_eq!(open[0].active_since, Some(ts(*offsets.last().unwrap())));

        for window in offsets.windows(2) {
            let closed = ledger
                .iter()
                .find(|s| s.active_since == Some(ts(window[0])))
                .unwrap();
            prop_assert_eq!(closed.active_until, Some(ts(window[1])));
            prop_assert_eq!(closed.status, SubscriptionStatus::InactiveCancelled);
        }
    }

    /// Property: strictly between activations, exactly one subscription is
    /// active
    #[test]
    fn prop_single_active_between_activations(offsets in arb_activation_offsets()) {
        let account_id = AccountId::new();
        let mut ledger = Vec::new();
        for offset in &offsets {
            activate(&mut ledger, account_id, ts(*offset));
        }

        let mut probes: Vec<DateTime<Utc>> = offsets
            .windows(2)
            .map(|w| ts(w[0]) + Duration::seconds((w[1] - w[0]) * 30))
            .collect();
        probes.push(ts(offsets.last().unwrap() + 1));

        for probe in probes {
            let active = ledger.iter().filter(|s| s.is_active_at(probe)).count();
            prop_assert_eq!(active, 1, "expected one active subscription at {}", probe);
        }
    }

    /// Property: the minimum storage package always covers the usage, and
    /// one package less never would
    #[test]
    fn prop_min_storage_quantity_is_minimal_cover(
        used in 0i64..1_000_000,
        included in 0i64..100_000,
        unit in 1i64..10_000,
    ) {
        let quantity = min_storage_package_quantity(used, included, unit);

        prop_assert!(quantity >= 0);
        prop_assert!(included + quantity * unit >= used);
        if quantity > 0 {
            prop_assert!(included + (quantity - 1) * unit < used);
        }
    }
}
