//! Program lookups needed by identity resolution.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use cerberus_core::{Error, InternalOrgAliases, ProgramRepository, Result};

/// PostgreSQL implementation of ProgramRepository.
#[derive(Clone)]
pub struct PgProgramRepository {
    pool: Pool<Postgres>,
}

impl PgProgramRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Internal-organization aliases, read inside an existing transaction.
    pub async fn internal_aliases_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        program_id: Uuid,
    ) -> Result<InternalOrgAliases> {
        let row = sqlx::query(
            "SELECT internal_organization FROM programs WHERE program_id = $1",
        )
        .bind(program_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        aliases_from_row(row, program_id)
    }

    /// Existence check inside an existing transaction.
    pub async fn exists_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        program_id: Uuid,
    ) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM programs WHERE program_id = $1)")
                .bind(program_id)
                .fetch_one(&mut **tx)
                .await
                .map_err(Error::Database)?;
        Ok(exists)
    }
}

fn aliases_from_row(
    row: Option<sqlx::postgres::PgRow>,
    program_id: Uuid,
) -> Result<InternalOrgAliases> {
    let row = row.ok_or(Error::ProgramNotFound(program_id))?;
    let internal: Option<String> = row.get("internal_organization");
    Ok(internal
        .map(|raw| InternalOrgAliases::parse(&raw))
        .unwrap_or_default())
}

#[async_trait]
impl ProgramRepository for PgProgramRepository {
    async fn exists(&self, program_id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM programs WHERE program_id = $1)")
                .bind(program_id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn internal_aliases(&self, program_id: Uuid) -> Result<InternalOrgAliases> {
        let row = sqlx::query(
            "SELECT internal_organization FROM programs WHERE program_id = $1",
        )
        .bind(program_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        aliases_from_row(row, program_id)
    }
}
