//! Ledger errors

use thiserror::Error;

use fieldhub_db::DbError;
use fieldhub_types::UserCategory;

/// Ledger errors
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Account not found
    #[error("account not found")]
    AccountNotFound,

    /// Subscription not found
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// Plan not found
    #[error("plan not found")]
    PlanNotFound,

    /// No default plan configured for the account's category
    #[error("no default plan configured for {0} accounts")]
    NoDefaultPlan(UserCategory),

    /// A default subscription was requested while one is already active
    #[error("account already has an active subscription")]
    DoubleActivation,

    /// Extra packages require a premium plan
    #[error("only premium plans can carry extra packages")]
    NotPremiumPlan,

    /// Requested quantity outside the package type's bounds
    #[error("quantity {quantity} outside allowed range {min}..={max}")]
    QuantityOutOfRange {
        /// Requested quantity
        quantity: i64,
        /// Minimum purchasable quantity
        min: i64,
        /// Maximum purchasable quantity
        max: i64,
    },

    /// A concurrent writer produced overlapping active periods; the
    /// exclusion constraint rejected this write
    #[error("active periods overlap; the update lost a concurrent race")]
    Conflict,

    /// Webhook verification or processing error
    #[error("webhook error: {0}")]
    Webhook(String),

    /// Database error
    #[error("database error: {0}")]
    Database(DbError),
}

impl LedgerError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound | Self::SubscriptionNotFound | Self::PlanNotFound
        )
    }

    /// Check if this is a conflict the caller may retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict | Self::DoubleActivation)
    }
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ActivePeriodOverlap => Self::Conflict,
            other => Self::Database(other),
        }
    }
}
