//! The subscription ledger
//!
//! A thin state-transition and query layer over the persisted subscription
//! and package records. Row-level locking in the repositories reduces race
//! likelihood; the database exclusion constraints are the authoritative
//! guarantee that active periods never overlap.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use fieldhub_db::{
    AccountRepository, CreateSubscription, PackageRepository, PackageTypeRepository,
    PlanRepository, Repositories, SubscriptionChange, SubscriptionRepository,
};
use fieldhub_types::{
    Account, AccountId, Package, PackageKind, PackageType, Plan, Subscription, SubscriptionId,
    SubscriptionStatus,
};

use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::webhook::{PaymentEvent, PaymentEventType, WebhookHandler};

/// Megabytes granted by `quantity` units of `unit_amount` MB each
pub fn package_mb(quantity: i64, unit_amount: i64) -> i64 {
    quantity * unit_amount
}

/// Minimum package quantity an account must hold so that
/// `included_mb + quantity * unit_amount >= used_mb`, floored at zero.
pub fn min_storage_package_quantity(used_mb: i64, included_mb: i64, unit_amount: i64) -> i64 {
    let deficit = used_mb - included_mb;
    if deficit <= 0 || unit_amount <= 0 {
        return 0;
    }
    (deficit + unit_amount - 1) / unit_amount
}

/// Outcome of a package quantity change
#[derive(Debug, Clone)]
pub struct PackageChange {
    /// The package that was closed, if one was active
    pub closed: Option<Package>,
    /// The newly opened package, when the quantity was positive
    pub created: Option<Package>,
}

/// Storage entitlement and usage for an account
#[derive(Debug, Clone)]
pub struct StorageSummary {
    /// Storage included in the plan, in MB
    pub plan_storage_mb: i64,
    /// Quantity of the currently active storage package
    pub active_package_quantity: i64,
    /// MB granted by the active storage package
    pub active_package_mb: i64,
    /// Total storage entitlement, in MB
    pub total_mb: i64,
    /// Quantity of the next scheduled storage package, if any
    pub future_package_quantity: i64,
    /// MB granted by the next scheduled storage package
    pub future_package_mb: i64,
    /// Storage currently consumed by the account, in MB
    pub used_mb: i64,
    /// Minimum package quantity covering the current usage
    pub min_package_quantity: i64,
}

/// The subscription ledger
pub struct SubscriptionLedger {
    repos: Repositories,
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
}

impl SubscriptionLedger {
    /// Create a new ledger on the system clock
    pub fn new(repos: Repositories, config: LedgerConfig) -> Self {
        Self::with_clock(repos, config, Arc::new(SystemClock))
    }

    /// Create a new ledger with an explicit clock
    pub fn with_clock(repos: Repositories, config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            config,
            clock,
        }
    }

    /// The ledger's current instant
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Look up an account
    pub async fn account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.repos
            .accounts
            .find_by_id(account_id.0)
            .await?
            .ok_or(LedgerError::AccountNotFound)?
            .into_account()
            .map_err(Into::into)
    }

    /// Look up a subscription's plan
    pub async fn plan(&self, subscription: &Subscription) -> Result<Plan, LedgerError> {
        self.repos
            .plans
            .find_by_id(subscription.plan_id.0)
            .await?
            .ok_or(LedgerError::PlanNotFound)?
            .into_plan()
            .map_err(Into::into)
    }

    /// Return the subscription whose active period contains now for the
    /// account, creating one on the account category's default plan when
    /// none exists.
    pub async fn get_or_create_active_subscription(
        &self,
        account_id: AccountId,
    ) -> Result<Subscription, LedgerError> {
        let now = self.clock.now();

        match self
            .repos
            .subscriptions
            .find_active_for_account(account_id.0, now)
            .await?
        {
            Some(row) => row.into_subscription().map_err(Into::into),
            None => self.create_default_subscription(account_id, Some(now)).await,
        }
    }

    /// Activate the default plan for an account.
    ///
    /// Fails with [`LedgerError::DoubleActivation`] when a subscription is
    /// already active at the requested instant.
    pub async fn create_default_subscription(
        &self,
        account_id: AccountId,
        active_since: Option<DateTime<Utc>>,
    ) -> Result<Subscription, LedgerError> {
        let active_since = active_since.unwrap_or_else(|| self.clock.now());

        if self
            .repos
            .subscriptions
            .find_active_for_account(account_id.0, active_since)
            .await?
            .is_some()
        {
            return Err(LedgerError::DoubleActivation);
        }

        let account = self.account(account_id).await?;
        let plan = self
            .repos
            .plans
            .find_default(account.category)
            .await?
            .ok_or(LedgerError::NoDefaultPlan(account.category))?
            .into_plan()?;

        let row = self
            .repos
            .subscriptions
            .create(CreateSubscription {
                id: Uuid::new_v4(),
                account_id: account_id.0,
                plan_id: plan.id.0,
                status: SubscriptionStatus::ActivePaid,
                active_since: Some(active_since),
                active_until: None,
            })
            .await?;

        tracing::info!(
            account_id = %account_id,
            plan = %plan.code,
            %active_since,
            "default subscription activated"
        );

        row.into_subscription().map_err(Into::into)
    }

    /// Apply a field change to a subscription under a row lock, closing
    /// every other currently-active subscription of the same account at
    /// `change.active_since`.
    ///
    /// At most one subscription of the account is active afterwards; the
    /// close-out and the update commit together or not at all.
    pub async fn update_subscription(
        &self,
        id: SubscriptionId,
        change: SubscriptionChange,
    ) -> Result<Subscription, LedgerError> {
        let now = self.clock.now();
        let status = change.status;

        let row = self
            .repos
            .subscriptions
            .update_exclusive(id.0, change, now)
            .await
            .map_err(|err| match err {
                fieldhub_db::DbError::NotFound => LedgerError::SubscriptionNotFound,
                other => other.into(),
            })?;

        tracing::info!(subscription_id = %id, status = %status, "subscription updated");

        row.into_subscription().map_err(Into::into)
    }

    /// Change the quantity of a package type on a subscription.
    ///
    /// Requires a premium plan. The currently active package is closed at
    /// `active_since` (default now) and, when `quantity > 0`, a new one is
    /// opened at the same instant. Pending future packages of the type are
    /// superseded.
    pub async fn set_package_quantity(
        &self,
        subscription_id: SubscriptionId,
        kind: PackageKind,
        quantity: i64,
        active_since: Option<DateTime<Utc>>,
    ) -> Result<PackageChange, LedgerError> {
        let now = self.clock.now();

        let subscription = self
            .repos
            .subscriptions
            .find_by_id(subscription_id.0)
            .await?
            .ok_or(LedgerError::SubscriptionNotFound)?
            .into_subscription()?;
        let plan = self.plan(&subscription).await?;

        if !plan.is_premium {
            return Err(LedgerError::NotPremiumPlan);
        }

        let package_type = self.package_type(kind).await?;
        if quantity < 0 || (quantity > 0 && !package_type.quantity_in_bounds(quantity)) {
            return Err(LedgerError::QuantityOutOfRange {
                quantity,
                min: package_type.min_quantity,
                max: package_type.max_quantity,
            });
        }

        let active_since = active_since.unwrap_or(now);
        let replacement = self
            .repos
            .packages
            .replace_active(subscription_id.0, package_type.id.0, quantity, active_since, now)
            .await?;

        tracing::info!(
            subscription_id = %subscription_id,
            kind = %kind,
            quantity,
            %active_since,
            "package quantity changed"
        );

        Ok(PackageChange {
            closed: replacement.closed.map(|row| row.into_package()),
            created: replacement.created.map(|row| row.into_package()),
        })
    }

    /// The package of `kind` active now for a subscription, if any
    pub async fn active_package(
        &self,
        subscription_id: SubscriptionId,
        kind: PackageKind,
    ) -> Result<Option<Package>, LedgerError> {
        let package_type = self.package_type(kind).await?;
        let row = self
            .repos
            .packages
            .find_active(subscription_id.0, package_type.id.0, self.clock.now())
            .await?;

        Ok(row.map(|row| row.into_package()))
    }

    /// Quantity of the package of `kind` active now, 0 when none
    pub async fn active_package_quantity(
        &self,
        subscription_id: SubscriptionId,
        kind: PackageKind,
    ) -> Result<i64, LedgerError> {
        Ok(self
            .active_package(subscription_id, kind)
            .await?
            .map_or(0, |package| package.quantity))
    }

    /// The next scheduled package of `kind` for a subscription, if any
    pub async fn future_package(
        &self,
        subscription_id: SubscriptionId,
        kind: PackageKind,
    ) -> Result<Option<Package>, LedgerError> {
        let package_type = self.package_type(kind).await?;
        let row = self
            .repos
            .packages
            .find_future(subscription_id.0, package_type.id.0, self.clock.now())
            .await?;

        Ok(row.map(|row| row.into_package()))
    }

    /// Storage entitlement and usage for an account.
    ///
    /// Creates the default subscription on the fly when the account has
    /// none active.
    pub async fn storage_summary(
        &self,
        account_id: AccountId,
    ) -> Result<StorageSummary, LedgerError> {
        let account = self.account(account_id).await?;
        let subscription = self.get_or_create_active_subscription(account_id).await?;
        let plan = self.plan(&subscription).await?;
        let package_type = self.package_type(PackageKind::Storage).await?;

        let now = self.clock.now();
        let active = self
            .repos
            .packages
            .find_active(subscription.id.0, package_type.id.0, now)
            .await?;
        let future = self
            .repos
            .packages
            .find_future(subscription.id.0, package_type.id.0, now)
            .await?;

        let active_package_quantity = active.map_or(0, |row| row.quantity);
        let future_package_quantity = future.map_or(0, |row| row.quantity);
        let active_package_mb = package_mb(active_package_quantity, package_type.unit_amount);

        Ok(StorageSummary {
            plan_storage_mb: plan.storage_mb,
            active_package_quantity,
            active_package_mb,
            total_mb: plan.storage_mb + active_package_mb,
            future_package_quantity,
            future_package_mb: package_mb(future_package_quantity, package_type.unit_amount),
            used_mb: account.storage_used_mb,
            min_package_quantity: min_storage_package_quantity(
                account.storage_used_mb,
                plan.storage_mb,
                package_type.unit_amount,
            ),
        })
    }

    /// Verify a signed payment-provider event and apply the transition it
    /// dictates. Returns the updated subscription, or `None` for event
    /// types the ledger does not act on.
    pub async fn process_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<Option<Subscription>, LedgerError> {
        let handler = WebhookHandler::new(&self.config.webhook_secret)
            .with_tolerance(self.config.webhook_tolerance);
        let event = handler.verify_and_parse(payload, signature, self.clock.now())?;

        self.apply_payment_event(&event).await
    }

    /// Apply a parsed payment event to its subscription.
    ///
    /// Events that activate or deactivate the subscription go through the
    /// exclusive update; bookkeeping transitions before first activation
    /// only touch the status.
    pub async fn apply_payment_event(
        &self,
        event: &PaymentEvent,
    ) -> Result<Option<Subscription>, LedgerError> {
        let subscription = self
            .repos
            .subscriptions
            .find_by_id(event.subscription_id.0)
            .await?
            .ok_or(LedgerError::SubscriptionNotFound)?
            .into_subscription()?;

        let updated = match event.event_type {
            PaymentEventType::CheckoutCreated => {
                self.set_status(&subscription, SubscriptionStatus::InactiveRequestedCreate)
                    .await?
            }
            PaymentEventType::PaymentPending => {
                self.set_status(&subscription, SubscriptionStatus::InactiveAwaitsPayment)
                    .await?
            }
            PaymentEventType::DraftExpired => {
                self.set_status(&subscription, SubscriptionStatus::InactiveDraftExpired)
                    .await?
            }
            PaymentEventType::PaymentSucceeded => {
                let active_since = subscription.active_since.unwrap_or(event.effective_at);
                let change = carryover(&subscription, SubscriptionStatus::ActivePaid, active_since);
                self.update_subscription(subscription.id, change).await?
            }
            PaymentEventType::PaymentFailed => {
                if subscription.active_since.is_some() {
                    let change = carryover(
                        &subscription,
                        SubscriptionStatus::ActivePastDue,
                        subscription.active_since.unwrap_or(event.effective_at),
                    );
                    self.update_subscription(subscription.id, change).await?
                } else {
                    tracing::warn!(
                        subscription_id = %subscription.id,
                        "payment failed before activation; leaving status untouched"
                    );
                    return Ok(None);
                }
            }
            PaymentEventType::SubscriptionCancelled => {
                if subscription.active_since.is_some() {
                    let active_since = subscription.active_since.unwrap_or(event.effective_at);
                    let mut change = carryover(
                        &subscription,
                        SubscriptionStatus::InactiveCancelled,
                        active_since,
                    );
                    change.active_until = Some(event.active_until.unwrap_or(event.effective_at));
                    change.requested_cancel_at = subscription
                        .requested_cancel_at
                        .or(Some(event.effective_at));
                    self.update_subscription(subscription.id, change).await?
                } else {
                    self.set_status(&subscription, SubscriptionStatus::InactiveCancelled)
                        .await?
                }
            }
            PaymentEventType::Unknown(ref kind) => {
                tracing::info!(event_id = %event.id, kind, "ignoring unknown payment event");
                return Ok(None);
            }
        };

        Ok(Some(updated))
    }

    async fn set_status(
        &self,
        subscription: &Subscription,
        status: SubscriptionStatus,
    ) -> Result<Subscription, LedgerError> {
        self.repos
            .subscriptions
            .update_status(subscription.id.0, status)
            .await?;

        tracing::info!(subscription_id = %subscription.id, status = %status, "subscription status updated");

        let mut updated = subscription.clone();
        updated.status = status;
        Ok(updated)
    }

    async fn package_type(&self, kind: PackageKind) -> Result<PackageType, LedgerError> {
        let row = match kind {
            PackageKind::Storage => self.repos.package_types.get_or_create_storage().await?,
        };

        row.into_package_type().map_err(Into::into)
    }
}

/// A change that keeps the subscription's period and billing bookkeeping
/// while moving it to `status`.
fn carryover(
    subscription: &Subscription,
    status: SubscriptionStatus,
    active_since: DateTime<Utc>,
) -> SubscriptionChange {
    SubscriptionChange {
        status,
        active_since: Some(active_since),
        active_until: subscription.active_until,
        requested_cancel_at: subscription.requested_cancel_at,
        billing_cycle_anchor_at: subscription.billing_cycle_anchor_at,
        current_period_since: subscription.current_period_since,
        current_period_until: subscription.current_period_until,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_storage_quantity_rounds_deficits_up() {
        // used 2500 MB against 1000 MB included, 1000 MB units
        assert_eq!(min_storage_package_quantity(2500, 1000, 1000), 2);
        // usage within the plan needs no package
        assert_eq!(min_storage_package_quantity(500, 1000, 1000), 0);
        // exact fit
        assert_eq!(min_storage_package_quantity(3000, 1000, 1000), 2);
        // one byte over an exact fit rounds up
        assert_eq!(min_storage_package_quantity(3001, 1000, 1000), 3);
        assert_eq!(min_storage_package_quantity(0, 0, 1000), 0);
    }

    #[test]
    fn package_mb_scales_by_unit_amount() {
        assert_eq!(package_mb(0, 1000), 0);
        assert_eq!(package_mb(3, 1000), 3000);
        assert_eq!(package_mb(2, 500), 1000);
    }
}
