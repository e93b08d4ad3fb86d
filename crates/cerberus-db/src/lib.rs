//! # cerberus-db
//!
//! PostgreSQL persistence layer for cerberus identity resolution.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for programs, person mentions, stakeholders
//!   and merge groups
//! - A transaction boundary (`TxContext`) and advisory locking used by the
//!   merge workflow
//!
//! ## Example
//!
//! ```rust,ignore
//! use cerberus_db::{Database, StakeholderRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/cerberus").await?;
//!     let names = db.stakeholders.names(program_id).await?;
//!     println!("{} stakeholders", names.len());
//!     Ok(())
//! }
//! ```

pub mod mentions;
pub mod merge_groups;
pub mod pool;
pub mod programs;
pub mod stakeholder_query;
pub mod stakeholders;
pub mod transaction;

// Compiled unconditionally: tests/ in this crate and in cerberus-resolution seed data through it.
pub mod test_fixtures;

pub use cerberus_core::*;

pub use mentions::PgMentionRepository;
pub use merge_groups::{GroupResolution, PgMergeGroupRepository};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use programs::PgProgramRepository;
pub use stakeholder_query::{QueryParam, StakeholderListQuery, StakeholderUpdateQuery};
pub use stakeholders::PgStakeholderRepository;
pub use transaction::{advisory_xact_lock, grouping_lock_key, TxContext, TxFuture};

/// Combined database handle holding every repository.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Program lookups.
    pub programs: PgProgramRepository,
    /// Extracted person mentions.
    pub mentions: PgMentionRepository,
    /// Canonical stakeholders.
    pub stakeholders: PgStakeholderRepository,
    /// Proposed and resolved merge groups.
    pub merge_groups: PgMergeGroupRepository,
}

impl Database {
    /// Wrap an existing pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            programs: PgProgramRepository::new(pool.clone()),
            mentions: PgMentionRepository::new(pool.clone()),
            stakeholders: PgStakeholderRepository::new(pool.clone()),
            merge_groups: PgMergeGroupRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect with the default pool settings.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with explicit pool settings.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Transaction context over this database's pool.
    pub fn tx(&self) -> TxContext {
        TxContext::new(self.pool.clone())
    }
}
