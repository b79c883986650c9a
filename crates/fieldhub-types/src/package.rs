//! Extra package types
//!
//! Extra packages are purchasable add-ons layered on top of a premium
//! subscription for a bounded active period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InvalidChoice;
use crate::subscription::{ActivePeriod, SubscriptionId};

/// Unique package type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageTypeId(pub Uuid);

impl PackageTypeId {
    /// Create a new random package type ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PackageTypeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PackageTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PackageTypeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Unique package identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId(pub Uuid);

impl PackageId {
    /// Create a new random package ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PackageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PackageId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Kind of purchasable add-on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Extra storage
    Storage,
}

impl PackageKind {
    /// Acceptable wire values
    pub const ACCEPTABLE: &'static [&'static str] = &["storage"];

    /// Code stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Storage => "storage",
        }
    }

    /// Display label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Storage => "Storage",
        }
    }
}

impl std::fmt::Display for PackageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PackageKind {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "storage" => Ok(Self::Storage),
            other => Err(InvalidChoice::new("package kind", other, Self::ACCEPTABLE)),
        }
    }
}

/// A purchasable add-on kind with quantity bounds and unit sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageType {
    /// Package type ID
    pub id: PackageTypeId,
    /// Unique identifier of the package type
    pub code: String,
    /// Human-readable name
    pub display_name: String,
    /// Kind of add-on; unique per kind
    pub kind: PackageKind,
    /// Available for purchase by the general public
    pub is_public: bool,
    /// Minimum purchasable quantity per subscription
    pub min_quantity: i64,
    /// Maximum purchasable quantity per subscription
    pub max_quantity: i64,
    /// Size of one quantity unit, in `unit_label` units
    pub unit_amount: i64,
    /// Unit of measurement (e.g. MB, minute)
    pub unit_label: Option<String>,
    /// When the package type was created
    pub created_at: DateTime<Utc>,
    /// When the package type was last updated
    pub updated_at: DateTime<Utc>,
}

impl PackageType {
    /// Whether `quantity` falls within the purchasable bounds
    pub fn quantity_in_bounds(&self, quantity: i64) -> bool {
        quantity >= self.min_quantity && quantity <= self.max_quantity
    }
}

/// An add-on purchase bound to one subscription and one package type.
///
/// Changing quantity closes the current package record and opens a new one
/// at the same instant; periods of the same subscription and type never
/// overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Package ID
    pub id: PackageId,
    /// Owning subscription
    pub subscription_id: SubscriptionId,
    /// Package type
    pub type_id: PackageTypeId,
    /// Purchased quantity, at least 1
    pub quantity: i64,
    /// Start of the active period
    pub active_since: DateTime<Utc>,
    /// End of the active period, `None` = open-ended
    pub active_until: Option<DateTime<Utc>>,
    /// When the package was created
    pub created_at: DateTime<Utc>,
    /// When the package was last updated
    pub updated_at: DateTime<Utc>,
}

impl Package {
    /// The package's active period
    pub fn period(&self) -> ActivePeriod {
        ActivePeriod {
            active_since: self.active_since,
            active_until: self.active_until,
        }
    }

    /// Whether the package is in effect at `at`
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.period().contains(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn package_activity_follows_its_period() {
        let since = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        let package = Package {
            id: PackageId::new(),
            subscription_id: SubscriptionId::new(),
            type_id: PackageTypeId::new(),
            quantity: 3,
            active_since: since,
            active_until: Some(until),
            created_at: since,
            updated_at: since,
        };

        assert!(package.is_active_at(since));
        assert!(package.is_active_at(until));
        assert!(!package.is_active_at(until + chrono::Duration::seconds(1)));
        assert_eq!(package.period().active_until, Some(until));
    }

    #[test]
    fn quantity_bounds_are_inclusive() {
        let package_type = PackageType {
            id: PackageTypeId::new(),
            code: "storage_package".to_string(),
            display_name: "Storage".to_string(),
            kind: PackageKind::Storage,
            is_public: true,
            min_quantity: 0,
            max_quantity: 100,
            unit_amount: 1000,
            unit_label: Some("MB".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(package_type.quantity_in_bounds(0));
        assert!(package_type.quantity_in_bounds(100));
        assert!(!package_type.quantity_in_bounds(101));
        assert!(!package_type.quantity_in_bounds(-1));
    }
}
