//! Transaction boundary for multi-step mutations.
//!
//! `TxContext::execute` runs a closure against a fresh transaction and commits
//! only if the closure succeeds. Any error, or a dropped future, rolls back.

use std::future::Future;
use std::pin::Pin;

use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;

use cerberus_core::{Error, Result};

/// Boxed future returned by transaction closures.
pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Runs units of work inside a single database transaction.
///
/// # Examples
///
/// ```rust,ignore
/// let tx_ctx = TxContext::new(db.pool.clone());
/// let groups = db.merge_groups.clone();
/// tx_ctx.execute(move |tx| Box::pin(async move {
///     groups.set_status_tx(tx, group_id, MergeGroupStatus::Rejected).await
/// })).await?;
/// ```
#[derive(Clone)]
pub struct TxContext {
    pool: PgPool,
}

impl TxContext {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begin, run `f`, and commit. The transaction is rolled back when `f`
    /// returns an error.
    pub async fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut Transaction<'_, Postgres>) -> TxFuture<'a, T>,
    {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        match f(&mut tx).await {
            Ok(result) => {
                tx.commit().await.map_err(Error::Database)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        subsystem = "db",
                        component = "transaction",
                        op = "rollback",
                        error = %rollback_err,
                        "Rollback failed; connection will be discarded"
                    );
                }
                Err(e)
            }
        }
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Take a transaction-scoped advisory lock derived from `key`.
///
/// Blocks until the lock is free and releases it when the transaction ends.
pub async fn advisory_xact_lock(tx: &mut Transaction<'_, Postgres>, key: &str) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(key)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
    Ok(())
}

/// Advisory lock key serializing refresh-grouping runs of one program.
pub fn grouping_lock_key(program_id: uuid::Uuid) -> String {
    format!("merge_grouping:{}", program_id)
}
