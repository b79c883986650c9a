//! Application state for the FieldHub API service.

use std::sync::Arc;

use fieldhub_billing_core::SubscriptionLedger;
use fieldhub_db::pg::Repositories;
use fieldhub_db::DbPool;

use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Subscription ledger (plans, subscriptions, packages, webhooks)
    pub ledger: Arc<SubscriptionLedger>,
    /// Database repositories
    pub repos: Repositories,
    /// Database pool (for readiness checks)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        ledger: SubscriptionLedger,
        repos: Repositories,
        pool: DbPool,
        config: Config,
    ) -> Self {
        Self {
            ledger: Arc::new(ledger),
            repos,
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
