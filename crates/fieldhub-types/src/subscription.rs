//! Subscription types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InvalidChoice;
use crate::{AccountId, PlanId};

/// Unique subscription identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    /// Create a new random subscription ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a subscription ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SubscriptionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Status of a subscription.
///
/// A subscription starts as `InactiveDraft`. Transitions are driven by the
/// payment provider:
///
/// `InactiveDraft` -> `InactiveRequestedCreate` -> `InactiveAwaitsPayment`
/// -> `ActivePaid` <-> `ActivePastDue` -> `InactiveCancelled`
///
/// A draft that is superseded before payment short-circuits to
/// `InactiveDraftExpired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// The user drafted a subscription, initial status
    InactiveDraft,
    /// The draft expired (e.g. a new subscription was attempted)
    InactiveDraftExpired,
    /// Creation was requested at the payment provider
    InactiveRequestedCreate,
    /// Waiting for the first payment
    InactiveAwaitsPayment,
    /// Payment succeeded
    ActivePaid,
    /// Payment failed, but the subscription is still active
    ActivePastDue,
    /// Successfully cancelled
    InactiveCancelled,
}

impl SubscriptionStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [SubscriptionStatus; 7] = [
        Self::InactiveDraft,
        Self::InactiveDraftExpired,
        Self::InactiveRequestedCreate,
        Self::InactiveAwaitsPayment,
        Self::ActivePaid,
        Self::ActivePastDue,
        Self::InactiveCancelled,
    ];

    /// Acceptable wire values
    pub const ACCEPTABLE: &'static [&'static str] = &[
        "inactive_draft",
        "inactive_draft_expired",
        "inactive_requested_create",
        "inactive_awaits_payment",
        "active_paid",
        "active_past_due",
        "inactive_cancelled",
    ];

    /// Code stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InactiveDraft => "inactive_draft",
            Self::InactiveDraftExpired => "inactive_draft_expired",
            Self::InactiveRequestedCreate => "inactive_requested_create",
            Self::InactiveAwaitsPayment => "inactive_awaits_payment",
            Self::ActivePaid => "active_paid",
            Self::ActivePastDue => "active_past_due",
            Self::InactiveCancelled => "inactive_cancelled",
        }
    }

    /// Display label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InactiveDraft => "Inactive Draft",
            Self::InactiveDraftExpired => "Inactive Draft Expired",
            Self::InactiveRequestedCreate => "Inactive Requested Create",
            Self::InactiveAwaitsPayment => "Inactive Awaits Payment",
            Self::ActivePaid => "Active Paid",
            Self::ActivePastDue => "Active Past Due",
            Self::InactiveCancelled => "Inactive Cancelled",
        }
    }

    /// Whether the status counts as active (`active_` prefixed codes)
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::ActivePaid | Self::ActivePastDue)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidChoice::new("status", s, Self::ACCEPTABLE))
    }
}

/// Half-open time interval `[active_since, active_until)`, unbounded above
/// when `active_until` is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePeriod {
    /// Start of the period
    pub active_since: DateTime<Utc>,
    /// End of the period, `None` = open-ended
    pub active_until: Option<DateTime<Utc>>,
}

impl ActivePeriod {
    /// Whether the period is in effect at `at`.
    ///
    /// A record whose `active_until` equals `at` still counts as active;
    /// overlap between two records sharing a boundary instant is prevented
    /// by the half-open range semantics of [`ActivePeriod::overlaps`] and
    /// the database constraint.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.active_since <= at && self.active_until.is_none_or(|until| until >= at)
    }

    /// Whether two half-open periods overlap.
    ///
    /// Matches the `tstzrange(...) && tstzrange(...)` semantics of the
    /// database exclusion constraint: `[a, b)` and `[b, c)` do not overlap.
    pub fn overlaps(&self, other: &ActivePeriod) -> bool {
        let starts_before_other_ends = match other.active_until {
            Some(until) => self.active_since < until,
            None => true,
        };
        let other_starts_before_self_ends = match self.active_until {
            Some(until) => other.active_since < until,
            None => true,
        };
        starts_before_other_ends && other_starts_before_self_ends
    }
}

/// A subscription binding one account to one plan for an active period.
///
/// For a given account, active periods of distinct subscriptions never
/// overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID
    pub id: SubscriptionId,
    /// Account the subscription belongs to
    pub account_id: AccountId,
    /// The subscribed plan
    pub plan_id: PlanId,
    /// Lifecycle status
    pub status: SubscriptionStatus,
    /// When cancellation was requested, if it was
    pub requested_cancel_at: Option<DateTime<Utc>>,
    /// Start of the active period; `None` until first activation
    pub active_since: Option<DateTime<Utc>>,
    /// End of the active period; `None` = open-ended
    pub active_until: Option<DateTime<Utc>>,
    /// Anchor for billing-period calculations
    pub billing_cycle_anchor_at: Option<DateTime<Utc>>,
    /// Start of the current billing period
    pub current_period_since: Option<DateTime<Utc>>,
    /// End of the current billing period; used to schedule future package
    /// changes, ignored for validity checks
    pub current_period_until: Option<DateTime<Utc>>,
    /// When the subscription was created
    pub created_at: DateTime<Utc>,
    /// When the subscription was last updated
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// The subscription's active period, if it ever activated
    pub fn active_period(&self) -> Option<ActivePeriod> {
        self.active_since.map(|active_since| ActivePeriod {
            active_since,
            active_until: self.active_until,
        })
    }

    /// Whether the subscription is in effect at `at`
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.active_period()
            .is_some_and(|period| period.contains(at))
    }

    /// Close the subscription out in favor of one activating at `at`:
    /// the period ends at `at` and the status becomes cancelled.
    ///
    /// Mirrors the close-out the database layer applies to other active
    /// subscriptions of the same account inside an exclusive update.
    pub fn close_out(&mut self, at: DateTime<Utc>) {
        self.active_until = Some(at);
        self.status = SubscriptionStatus::InactiveCancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn subscription(active_since: DateTime<Utc>) -> Subscription {
        Subscription {
            id: SubscriptionId::new(),
            account_id: AccountId::new(),
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

    #[test]
    fn status_codes_round_trip() {
        for status in SubscriptionStatus::ALL {
            assert_eq!(
                status.as_str().parse::<SubscriptionStatus>().unwrap(),
                status
            );
        }
    }

    #[test]
    fn unknown_status_lists_acceptable_values() {
        let err = "paused".parse::<SubscriptionStatus>().unwrap_err();
        assert_eq!(err.acceptable, SubscriptionStatus::ACCEPTABLE);
    }

    #[test]
    fn only_active_prefixed_statuses_are_active() {
        for status in SubscriptionStatus::ALL {
            assert_eq!(status.is_active(), status.as_str().starts_with("active_"));
        }
    }

    #[test]
    fn period_contains_respects_bounds() {
        let period = ActivePeriod {
            active_since: at(2023, 1, 1),
            active_until: Some(at(2023, 6, 1)),
        };

        assert!(period.contains(at(2023, 1, 1)));
        assert!(period.contains(at(2023, 3, 15)));
        // `active_until` itself still counts as active
        assert!(period.contains(at(2023, 6, 1)));
        assert!(!period.contains(at(2023, 6, 2)));
        assert!(!period.contains(at(2022, 12, 31)));
    }

    #[test]
    fn open_ended_period_contains_any_later_instant() {
        let period = ActivePeriod {
            active_since: at(2023, 1, 1),
            active_until: None,
        };
        assert!(period.contains(at(2030, 1, 1)));
        assert!(!period.contains(at(2022, 1, 1)));
    }

    #[test]
    fn back_to_back_periods_do_not_overlap() {
        let first = ActivePeriod {
            active_since: at(2023, 1, 1),
            active_until: Some(at(2023, 6, 1)),
        };
        let second = ActivePeriod {
            active_since: at(2023, 6, 1),
            active_until: None,
        };

        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));

        let overlapping = ActivePeriod {
            active_since: at(2023, 5, 1),
            active_until: None,
        };
        assert!(first.overlaps(&overlapping));
    }

    #[test]
    fn close_out_ends_period_and_cancels() {
        // A active since 2023-01-01 with no end, B activated 2023-06-01
        let mut a = subscription(at(2023, 1, 1));
        let b_active_since = at(2023, 6, 1);

        a.close_out(b_active_since);

        assert_eq!(a.active_until, Some(at(2023, 6, 1)));
        assert_eq!(a.status, SubscriptionStatus::InactiveCancelled);
        assert_eq!(a.status.as_str(), "inactive_cancelled");
        assert!(!a
            .active_period()
            .unwrap()
            .overlaps(&ActivePeriod {
                active_since: b_active_since,
                active_until: None,
            }));
    }
}
