//! Ledger configuration

use std::time::Duration;

use fieldhub_types::UserCategory;

/// Subscription ledger configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Payment webhook signing secret
    pub webhook_secret: String,
    /// How far a webhook timestamp may drift from now
    pub webhook_tolerance: Duration,
    /// Code of the autocreated default plan for persons
    pub default_person_plan_code: String,
    /// Code of the autocreated default plan for organizations
    pub default_organization_plan_code: String,
}

impl LedgerConfig {
    /// Create a new ledger config
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            webhook_tolerance: Duration::from_secs(300),
            default_person_plan_code: "default_user".to_string(),
            default_organization_plan_code: "default_org".to_string(),
        }
    }

    /// Set the default plan codes
    pub fn with_default_plan_codes(
        mut self,
        person: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        self.default_person_plan_code = person.into();
        self.default_organization_plan_code = organization.into();
        self
    }

    /// Set the webhook timestamp tolerance
    pub fn with_webhook_tolerance(mut self, tolerance: Duration) -> Self {
        self.webhook_tolerance = tolerance;
        self
    }

    /// Default plan code for a user category
    pub fn default_plan_code(&self, category: UserCategory) -> &str {
        match category {
            UserCategory::Person => &self.default_person_plan_code,
            UserCategory::Organization => &self.default_organization_plan_code,
        }
    }
}
