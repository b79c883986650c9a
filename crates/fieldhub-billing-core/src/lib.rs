//! FieldHub Billing Core - Subscription ledger
//!
//! Maintains, per account, a sequence of time-bounded subscription and
//! extra-package records, keeps at most one subscription (and one package
//! of a given type) active per account at any instant, and answers
//! plan/quantity lookups. Lifecycle transitions are driven externally by
//! signed payment-provider events.
//!
//! # Example
//!
//! ```rust,ignore
//! use fieldhub_billing_core::{LedgerConfig, SubscriptionLedger};
//! use fieldhub_db::Repositories;
//!
//! let config = LedgerConfig::new("whsec_...");
//! let ledger = SubscriptionLedger::new(repos, config);
//!
//! let subscription = ledger.get_or_create_active_subscription(account_id).await?;
//! let storage = ledger.storage_summary(account_id).await?;
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod webhook;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::LedgerConfig;
pub use error::LedgerError;
pub use ledger::{
    min_storage_package_quantity, package_mb, PackageChange, StorageSummary, SubscriptionLedger,
};
pub use webhook::{PaymentEvent, PaymentEventType, WebhookHandler};
