use crate::error::RepositoryError;
use crate::models::{AccountEntity, CarEntity, CarFilter, Role};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers and the workflow only
/// ever see `Arc<dyn Repository>`, so Postgres and the in-memory store are
/// interchangeable.
///
/// "Not found" is an `Ok(None)`, never an error; `RepositoryError` is reserved for
/// faults of the storage itself.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts ---
    async fn find_account_by_login(
        &self,
        login: &str,
    ) -> Result<Option<AccountEntity>, RepositoryError>;
    // Returns `None` when the login is already taken.
    async fn create_account(
        &self,
        account: AccountEntity,
    ) -> Result<Option<AccountEntity>, RepositoryError>;

    // --- Cars ---
    // Ignores any `id` on the input and returns the row with its assigned id.
    async fn save_car(&self, car: CarEntity) -> Result<CarEntity, RepositoryError>;
    async fn find_car_by_id(&self, id: i32) -> Result<Option<CarEntity>, RepositoryError>;
    // Inclusive range search, ordered by id ascending.
    async fn find_cars(&self, filter: CarFilter) -> Result<Vec<CarEntity>, RepositoryError>;
    // Sets `enabled = true`. Idempotent.
    async fn enable_car(&self, id: i32) -> Result<(), RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const CAR_COLUMNS: &str = "id, name, year, price, description, login, enabled";

fn parse_roles(tags: Vec<String>) -> Result<BTreeSet<Role>, RepositoryError> {
    tags.iter()
        .map(|tag| tag.parse::<Role>())
        .collect::<Result<BTreeSet<_>, _>>()
        .map_err(|e| RepositoryError::Corrupt(e.to_string()))
}

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// find_account_by_login
    ///
    /// Loads the account row, then its role tags. A tag outside the `Role` enum is
    /// reported as a corrupt row rather than silently dropped.
    async fn find_account_by_login(
        &self,
        login: &str,
    ) -> Result<Option<AccountEntity>, RepositoryError> {
        let row: Option<(i32, String)> =
            sqlx::query_as("SELECT id, login FROM accounts WHERE login = $1")
                .bind(login)
                .fetch_optional(&self.pool)
                .await?;

        let Some((id, login)) = row else {
            return Ok(None);
        };

        let tags: Vec<String> =
            sqlx::query_scalar("SELECT role FROM account_roles WHERE account_id = $1")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(AccountEntity {
            id: Some(id),
            login,
            roles: parse_roles(tags)?,
        }))
    }

    /// create_account
    ///
    /// Inserts the account and its roles in one transaction. `ON CONFLICT DO NOTHING`
    /// on the unique login turns a duplicate into `Ok(None)`.
    async fn create_account(
        &self,
        account: AccountEntity,
    ) -> Result<Option<AccountEntity>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: Option<i32> = sqlx::query_scalar(
            "INSERT INTO accounts (login) VALUES ($1) ON CONFLICT (login) DO NOTHING RETURNING id",
        )
        .bind(&account.login)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = id else {
            tx.rollback().await?;
            return Ok(None);
        };

        for role in &account.roles {
            sqlx::query("INSERT INTO account_roles (account_id, role) VALUES ($1, $2)")
                .bind(id)
                .bind(role.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Some(AccountEntity {
            id: Some(id),
            ..account
        }))
    }

    async fn save_car(&self, car: CarEntity) -> Result<CarEntity, RepositoryError> {
        let query = format!(
            "INSERT INTO cars (name, year, price, description, login, enabled) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CAR_COLUMNS}"
        );
        let saved = sqlx::query_as::<_, CarEntity>(&query)
            .bind(car.name)
            .bind(car.year)
            .bind(car.price)
            .bind(car.description)
            .bind(car.login)
            .bind(car.enabled)
            .fetch_one(&self.pool)
            .await?;
        Ok(saved)
    }

    async fn find_car_by_id(&self, id: i32) -> Result<Option<CarEntity>, RepositoryError> {
        let query = format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1");
        let car = sqlx::query_as::<_, CarEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(car)
    }

    /// find_cars
    ///
    /// Builds the WHERE clause with QueryBuilder so every bound is parameterized and an
    /// absent bound contributes no predicate at all.
    async fn find_cars(&self, filter: CarFilter) -> Result<Vec<CarEntity>, RepositoryError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {CAR_COLUMNS} FROM cars WHERE TRUE"));

        if let Some(year_from) = filter.year_from {
            builder.push(" AND year >= ");
            builder.push_bind(year_from);
        }
        if let Some(year_to) = filter.year_to {
            builder.push(" AND year <= ");
            builder.push_bind(year_to);
        }
        if let Some(price_from) = filter.price_from {
            builder.push(" AND price >= ");
            builder.push_bind(price_from);
        }
        if let Some(price_to) = filter.price_to {
            builder.push(" AND price <= ");
            builder.push_bind(price_to);
        }

        builder.push(" ORDER BY id ASC");

        let cars = builder
            .build_query_as::<CarEntity>()
            .fetch_all(&self.pool)
            .await?;
        Ok(cars)
    }

    async fn enable_car(&self, id: i32) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE cars SET enabled = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Default)]
struct MemoryStore {
    accounts: BTreeMap<String, AccountEntity>,
    cars: BTreeMap<i32, CarEntity>,
    last_account_id: i32,
    last_car_id: i32,
}

/// InMemoryRepository
///
/// `Repository` held entirely in process memory behind a tokio `RwLock`. Used when no
/// `DATABASE_URL` is configured and throughout the test suite. Ids are assigned from
/// counters starting at 1, mirroring a `SERIAL` column.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<MemoryStore>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_account_by_login(
        &self,
        login: &str,
    ) -> Result<Option<AccountEntity>, RepositoryError> {
        Ok(self.store.read().await.accounts.get(login).cloned())
    }

    async fn create_account(
        &self,
        account: AccountEntity,
    ) -> Result<Option<AccountEntity>, RepositoryError> {
        let mut store = self.store.write().await;
        if store.accounts.contains_key(&account.login) {
            return Ok(None);
        }
        store.last_account_id += 1;
        let created = AccountEntity {
            id: Some(store.last_account_id),
            ..account
        };
        store
            .accounts
            .insert(created.login.clone(), created.clone());
        Ok(Some(created))
    }

    async fn save_car(&self, car: CarEntity) -> Result<CarEntity, RepositoryError> {
        let mut store = self.store.write().await;
        store.last_car_id += 1;
        let id = store.last_car_id;
        let saved = CarEntity {
            id: Some(id),
            ..car
        };
        store.cars.insert(id, saved.clone());
        Ok(saved)
    }

    async fn find_car_by_id(&self, id: i32) -> Result<Option<CarEntity>, RepositoryError> {
        Ok(self.store.read().await.cars.get(&id).cloned())
    }

    async fn find_cars(&self, filter: CarFilter) -> Result<Vec<CarEntity>, RepositoryError> {
        // BTreeMap iteration is already id-ascending.
        Ok(self
            .store
            .read()
            .await
            .cars
            .values()
            .filter(|car| filter.matches(car))
            .cloned()
            .collect())
    }

    async fn enable_car(&self, id: i32) -> Result<(), RepositoryError> {
        if let Some(car) = self.store.write().await.cars.get_mut(&id) {
            car.enabled = true;
        }
        Ok(())
    }
}
