//! PostgreSQL integration tests
//!
//! These exercise the transactional close-out, package supersession and
//! default-plan semantics against a real server, including the exclusion
//! constraints. They are ignored by default; run them with a PostgreSQL
//! server available:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/postgres cargo test -p fieldhub-db -- --ignored
//! ```
//!
//! Each test creates its own throwaway database.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use fieldhub_db::{
    AccountRepository, CreateAccount, CreatePlan, CreateSubscription, DbError, DbPool,
    PackageRepository, PackageTypeRepository, PlanRepository, Repositories, SubscriptionChange,
    SubscriptionRepository,
};
use fieldhub_types::{SubscriptionStatus, UserCategory};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn replace_db_name(url: &str, db_name: &str) -> String {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };
    let cut = base.rfind('/').expect("database url has a path");
    let mut replaced = format!("{}/{}", &base[..cut], db_name);
    if let Some(query) = query {
        replaced = format!("{replaced}?{query}");
    }
    replaced
}

async fn fresh_repos() -> (DbPool, Repositories) {
    let admin_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a PostgreSQL server");
    let db_name = format!("fieldhub_test_{}", Uuid::new_v4().simple());

    let admin = DbPool::connect(&admin_url).await.expect("connect admin db");
    sqlx::query(&format!(r#"CREATE DATABASE "{db_name}""#))
        .execute(&admin)
        .await
        .expect("create test database");

    let pool = fieldhub_db::create_pool(&replace_db_name(&admin_url, &db_name))
        .await
        .expect("connect test database");
    fieldhub_db::run_migrations(&pool).await.expect("migrate");

    (pool.clone(), Repositories::new(pool))
}

async fn seed_account(repos: &Repositories, category: UserCategory) -> Uuid {
    let id = Uuid::new_v4();
    repos
        .accounts
        .create(CreateAccount {
            id,
            username: format!("user_{}", id.simple()),
            category,
        })
        .await
        .expect("create account");
    id
}

async fn seed_plan(repos: &Repositories, premium: bool) -> Uuid {
    let mut plan = CreatePlan::new(
        format!("plan_{}", Uuid::new_v4().simple()),
        "Test Plan",
        UserCategory::Person,
    );
    plan.is_premium = premium;
    repos.plans.create(plan).await.expect("create plan").id
}

async fn seed_active_subscription(
    repos: &Repositories,
    account_id: Uuid,
    plan_id: Uuid,
    active_since: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    repos
        .subscriptions
        .create(CreateSubscription {
            id,
            account_id,
            plan_id,
            status: SubscriptionStatus::ActivePaid,
            active_since: Some(active_since),
            active_until: None,
        })
        .await
        .expect("create subscription");
    id
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server via DATABASE_URL"]
async fn activating_b_closes_a_at_b_activation_instant() {
    let (_pool, repos) = fresh_repos().await;
    let account = seed_account(&repos, UserCategory::Person).await;
    let plan = seed_plan(&repos, false).await;

    // A active since 2023-01-01 with no end
    let a = seed_active_subscription(&repos, account, plan, at(2023, 1, 1)).await;

    // B drafted, then activated 2023-06-01
    let b = Uuid::new_v4();
    repos
        .subscriptions
        .create(CreateSubscription {
            id: b,
            account_id: account,
            plan_id: plan,
            status: SubscriptionStatus::InactiveDraft,
            active_since: None,
            active_until: None,
        })
        .await
        .expect("create draft");

    let updated = repos
        .subscriptions
        .update_exclusive(
            b,
            SubscriptionChange::new(SubscriptionStatus::ActivePaid, at(2023, 6, 1)),
            at(2023, 6, 1),
        )
        .await
        .expect("activate B");

    assert_eq!(updated.status, "active_paid");
    assert_eq!(updated.active_since, Some(at(2023, 6, 1)));

    let closed = repos
        .subscriptions
        .find_by_id(a)
        .await
        .expect("query A")
        .expect("A exists");
    assert_eq!(closed.active_until, Some(at(2023, 6, 1)));
    assert_eq!(closed.status, "inactive_cancelled");

    // B is now the single active subscription
    let active = repos
        .subscriptions
        .find_active_for_account(account, at(2023, 7, 1))
        .await
        .expect("query active")
        .expect("one active subscription");
    assert_eq!(active.id, b);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server via DATABASE_URL"]
async fn overlapping_periods_are_rejected_by_the_constraint() {
    let (_pool, repos) = fresh_repos().await;
    let account = seed_account(&repos, UserCategory::Person).await;
    let plan = seed_plan(&repos, false).await;

    seed_active_subscription(&repos, account, plan, at(2023, 1, 1)).await;

    let overlapping = repos
        .subscriptions
        .create(CreateSubscription {
            id: Uuid::new_v4(),
            account_id: account,
            plan_id: plan,
            status: SubscriptionStatus::ActivePaid,
            active_since: Some(at(2023, 3, 1)),
            active_until: None,
        })
        .await;

    assert!(matches!(overlapping, Err(DbError::ActivePeriodOverlap)));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server via DATABASE_URL"]
async fn quantity_zero_closes_the_package_and_creates_none() {
    let (_pool, repos) = fresh_repos().await;
    let account = seed_account(&repos, UserCategory::Person).await;
    let plan = seed_plan(&repos, true).await;
    let subscription = seed_active_subscription(&repos, account, plan, at(2023, 1, 1)).await;
    let storage = repos
        .package_types
        .get_or_create_storage()
        .await
        .expect("storage package type");

    let opened = repos
        .packages
        .replace_active(subscription, storage.id, 3, at(2023, 2, 1), at(2023, 2, 1))
        .await
        .expect("open package");
    assert!(opened.closed.is_none());
    assert_eq!(opened.created.as_ref().map(|p| p.quantity), Some(3));

    let dropped = repos
        .packages
        .replace_active(subscription, storage.id, 0, at(2023, 5, 1), at(2023, 5, 1))
        .await
        .expect("drop package");
    assert_eq!(
        dropped.closed.as_ref().and_then(|p| p.active_until),
        Some(at(2023, 5, 1))
    );
    assert!(dropped.created.is_none());

    let active = repos
        .packages
        .find_active(subscription, storage.id, at(2023, 6, 1))
        .await
        .expect("query active package");
    assert!(active.is_none());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server via DATABASE_URL"]
async fn ensure_defaults_is_idempotent() {
    let (_pool, repos) = fresh_repos().await;

    repos
        .plans
        .ensure_defaults("default_user", "default_org")
        .await
        .expect("seed defaults");
    repos
        .plans
        .ensure_defaults("default_user", "default_org")
        .await
        .expect("seed defaults again");

    let plans = repos.plans.list_all().await.expect("list plans");
    assert_eq!(plans.len(), 2);

    for category in UserCategory::ALL {
        let defaults: Vec<_> = plans
            .iter()
            .filter(|p| p.user_category == category.code() && p.is_default)
            .collect();
        assert_eq!(defaults.len(), 1, "one default for {category}");
    }
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server via DATABASE_URL"]
async fn second_default_plan_unsets_the_first() {
    let (_pool, repos) = fresh_repos().await;

    let mut first = CreatePlan::new("community", "Community", UserCategory::Person);
    first.is_default = true;
    let first = repos.plans.create(first).await.expect("create first");

    let mut second = CreatePlan::new("pro", "Pro", UserCategory::Person);
    second.is_default = true;
    let second = repos.plans.create(second).await.expect("create second");

    // A default of the other category is untouched throughout
    let mut org = CreatePlan::new("team", "Team", UserCategory::Organization);
    org.is_default = true;
    let org = repos.plans.create(org).await.expect("create org plan");

    let reloaded_first = repos
        .plans
        .find_by_id(first.id)
        .await
        .expect("query first")
        .expect("first exists");
    assert!(!reloaded_first.is_default);
    assert!(second.is_default);

    // Flipping the default back also unsets the current one
    let restored = repos.plans.set_default(first.id).await.expect("set default");
    assert!(restored.is_default);

    let reloaded_second = repos
        .plans
        .find_by_id(second.id)
        .await
        .expect("query second")
        .expect("second exists");
    assert!(!reloaded_second.is_default);

    let reloaded_org = repos
        .plans
        .find_by_id(org.id)
        .await
        .expect("query org")
        .expect("org exists");
    assert!(reloaded_org.is_default);
}
