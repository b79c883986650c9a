//! PostgreSQL repository implementations

mod account;
mod organization;
mod package;
mod package_type;
mod plan;
mod project;
mod subscription;

pub use account::PgAccountRepository;
pub use organization::PgOrganizationRepository;
pub use package::PgPackageRepository;
pub use package_type::PgPackageTypeRepository;
pub use plan::PgPlanRepository;
pub use project::PgProjectRepository;
pub use subscription::PgSubscriptionRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub accounts: PgAccountRepository,
    pub organizations: PgOrganizationRepository,
    pub projects: PgProjectRepository,
    pub plans: PgPlanRepository,
    pub package_types: PgPackageTypeRepository,
    pub subscriptions: PgSubscriptionRepository,
    pub packages: PgPackageRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            accounts: PgAccountRepository::new(pool.clone()),
            organizations: PgOrganizationRepository::new(pool.clone()),
            projects: PgProjectRepository::new(pool.clone()),
            plans: PgPlanRepository::new(pool.clone()),
            package_types: PgPackageTypeRepository::new(pool.clone()),
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            packages: PgPackageRepository::new(pool),
        }
    }
}
