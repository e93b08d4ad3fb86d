//! Stakeholder repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Executor, Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use cerberus_core::{
    new_v7, parse_engagement_level, parse_stakeholder_type, CreateStakeholderRequest,
    EngagementLevel, Error, LinkedArtifact, Result, Stakeholder, StakeholderFilter,
    StakeholderName, StakeholderRepository, StakeholderType, UpdateStakeholderRequest,
};

use crate::stakeholder_query::{
    bind_params, StakeholderListQuery, StakeholderUpdateQuery, STAKEHOLDER_COLUMNS,
};

/// PostgreSQL implementation of StakeholderRepository.
#[derive(Clone)]
pub struct PgStakeholderRepository {
    pool: Pool<Postgres>,
}

impl PgStakeholderRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a stakeholder inside an existing transaction.
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        program_id: Uuid,
        req: &CreateStakeholderRequest,
    ) -> Result<Stakeholder> {
        insert_stakeholder(&mut **tx, program_id, req).await
    }
}

/// Validated insert values for a new stakeholder.
#[derive(Debug)]
struct NewStakeholder {
    person_name: String,
    stakeholder_type: StakeholderType,
    engagement_level: Option<EngagementLevel>,
}

fn validate_create(req: &CreateStakeholderRequest) -> Result<NewStakeholder> {
    let person_name = req.person_name.trim();
    if person_name.is_empty() {
        return Err(Error::InvalidInput("person_name is required".to_string()));
    }
    let stakeholder_type = parse_stakeholder_type(&req.stakeholder_type)?;
    let engagement_level = req
        .engagement_level
        .as_deref()
        .map(parse_engagement_level)
        .transpose()?;

    Ok(NewStakeholder {
        person_name: person_name.to_string(),
        stakeholder_type,
        engagement_level,
    })
}

async fn insert_stakeholder<'e, E>(
    executor: E,
    program_id: Uuid,
    req: &CreateStakeholderRequest,
) -> Result<Stakeholder>
where
    E: Executor<'e, Database = Postgres>,
{
    let new = validate_create(req)?;
    let sql = format!(
        "INSERT INTO program_stakeholders (
            stakeholder_id, program_id, person_name, email, role, organization,
            stakeholder_type, is_internal, engagement_level, department, influence, notes,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW(), NOW())
        RETURNING {}",
        STAKEHOLDER_COLUMNS
    );

    let row = sqlx::query(&sql)
        .bind(new_v7())
        .bind(program_id)
        .bind(&new.person_name)
        .bind(&req.email)
        .bind(&req.role)
        .bind(&req.organization)
        .bind(new.stakeholder_type.as_str())
        .bind(req.is_internal)
        .bind(new.engagement_level.map(|l| l.as_str()))
        .bind(&req.department)
        .bind(&req.influence)
        .bind(&req.notes)
        .fetch_one(executor)
        .await
        .map_err(Error::Database)?;

    let stakeholder = stakeholder_from_row(&row)?;
    debug!(
        subsystem = "db",
        component = "stakeholders",
        op = "create",
        program_id = %program_id,
        stakeholder_id = %stakeholder.stakeholder_id,
        stakeholder_type = %stakeholder.stakeholder_type,
        "Stakeholder created"
    );
    Ok(stakeholder)
}

async fn fetch_stakeholder<'e, E>(
    executor: E,
    program_id: Uuid,
    stakeholder_id: Uuid,
) -> Result<Stakeholder>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "SELECT {} FROM program_stakeholders
         WHERE stakeholder_id = $1 AND program_id = $2 AND deleted_at IS NULL",
        STAKEHOLDER_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(stakeholder_id)
        .bind(program_id)
        .fetch_optional(executor)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::StakeholderNotFound(stakeholder_id))?;
    stakeholder_from_row(&row)
}

/// Map a row selected with [`STAKEHOLDER_COLUMNS`].
pub(crate) fn stakeholder_from_row(row: &PgRow) -> Result<Stakeholder> {
    let stakeholder_type: String = row.get("stakeholder_type");
    let engagement_level: Option<String> = row.get("engagement_level");

    Ok(Stakeholder {
        stakeholder_id: row.get("stakeholder_id"),
        program_id: row.get("program_id"),
        person_name: row.get("person_name"),
        stakeholder_type: stakeholder_type
            .parse::<StakeholderType>()
            .map_err(Error::Internal)?,
        is_internal: row.get("is_internal"),
        email: row.get("email"),
        role: row.get("role"),
        organization: row.get("organization"),
        engagement_level: engagement_level
            .map(|l| l.parse::<EngagementLevel>())
            .transpose()
            .map_err(Error::Internal)?,
        department: row.get("department"),
        influence: row.get("influence"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl StakeholderRepository for PgStakeholderRepository {
    async fn create(&self, program_id: Uuid, req: &CreateStakeholderRequest) -> Result<Stakeholder> {
        insert_stakeholder(&self.pool, program_id, req).await
    }

    async fn get(&self, program_id: Uuid, stakeholder_id: Uuid) -> Result<Stakeholder> {
        fetch_stakeholder(&self.pool, program_id, stakeholder_id).await
    }

    async fn list(&self, filter: &StakeholderFilter) -> Result<Vec<Stakeholder>> {
        let (sql, params) = StakeholderListQuery::new(filter).build()?;
        let rows = bind_params(sqlx::query(&sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "stakeholders",
            op = "list",
            program_id = %filter.program_id,
            result_count = rows.len(),
            "Stakeholders listed"
        );
        rows.iter().map(stakeholder_from_row).collect()
    }

    async fn update(
        &self,
        program_id: Uuid,
        stakeholder_id: Uuid,
        req: &UpdateStakeholderRequest,
    ) -> Result<Stakeholder> {
        let (sql, params) = StakeholderUpdateQuery::new(program_id, stakeholder_id, req).build()?;
        let row = bind_params(sqlx::query(&sql), params)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::StakeholderNotFound(stakeholder_id))?;
        stakeholder_from_row(&row)
    }

    async fn delete(&self, program_id: Uuid, stakeholder_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE program_stakeholders SET deleted_at = NOW(), updated_at = NOW()
             WHERE stakeholder_id = $1 AND program_id = $2 AND deleted_at IS NULL",
        )
        .bind(stakeholder_id)
        .bind(program_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::StakeholderNotFound(stakeholder_id));
        }
        Ok(())
    }

    async fn names(&self, program_id: Uuid) -> Result<Vec<StakeholderName>> {
        let rows = sqlx::query(
            "SELECT stakeholder_id, person_name FROM program_stakeholders
             WHERE program_id = $1 AND deleted_at IS NULL
             ORDER BY stakeholder_id",
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| StakeholderName {
                stakeholder_id: row.get("stakeholder_id"),
                person_name: row.get("person_name"),
            })
            .collect())
    }

    async fn find_by_exact_name(
        &self,
        program_id: Uuid,
        name: &str,
    ) -> Result<Option<StakeholderName>> {
        let row = sqlx::query(
            "SELECT stakeholder_id, person_name FROM program_stakeholders
             WHERE program_id = $1 AND deleted_at IS NULL
               AND LOWER(person_name) = LOWER($2)
             ORDER BY created_at ASC, stakeholder_id ASC
             LIMIT 1",
        )
        .bind(program_id)
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| StakeholderName {
            stakeholder_id: row.get("stakeholder_id"),
            person_name: row.get("person_name"),
        }))
    }

    async fn linked_artifacts(
        &self,
        program_id: Uuid,
        stakeholder_id: Uuid,
    ) -> Result<Vec<LinkedArtifact>> {
        // Surface a missing stakeholder as 404 rather than an empty list.
        fetch_stakeholder(&self.pool, program_id, stakeholder_id).await?;

        let rows = sqlx::query(
            "SELECT a.artifact_id, a.filename, a.uploaded_at,
                    SUM(ap.mention_count)::BIGINT AS mention_count
             FROM artifact_persons ap
             JOIN artifacts a ON ap.artifact_id = a.artifact_id
             WHERE ap.stakeholder_id = $1 AND a.program_id = $2
             GROUP BY a.artifact_id, a.filename, a.uploaded_at
             ORDER BY a.uploaded_at DESC, a.artifact_id ASC",
        )
        .bind(stakeholder_id)
        .bind(program_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| LinkedArtifact {
                artifact_id: row.get("artifact_id"),
                filename: row.get("filename"),
                uploaded_at: row.get("uploaded_at"),
                mention_count: row.get("mention_count"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_create_trims_name() {
        let req = CreateStakeholderRequest {
            person_name: "  Ann Lee ".into(),
            stakeholder_type: "Partner".into(),
            engagement_level: Some("key".into()),
            ..Default::default()
        };
        let new = validate_create(&req).unwrap();
        assert_eq!(new.person_name, "Ann Lee");
        assert_eq!(new.stakeholder_type, StakeholderType::Partner);
        assert_eq!(new.engagement_level, Some(EngagementLevel::Key));
    }

    #[test]
    fn test_validate_create_rejects_blank_name() {
        let req = CreateStakeholderRequest {
            person_name: " ".into(),
            stakeholder_type: "internal".into(),
            ..Default::default()
        };
        let err = validate_create(&req).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: person_name is required");
    }

    #[test]
    fn test_validate_create_rejects_unknown_type() {
        let req = CreateStakeholderRequest {
            person_name: "Ann Lee".into(),
            stakeholder_type: "".into(),
            ..Default::default()
        };
        assert!(matches!(validate_create(&req), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_create_rejects_unknown_engagement() {
        let req = CreateStakeholderRequest {
            person_name: "Ann Lee".into(),
            stakeholder_type: "internal".into(),
            engagement_level: Some("vip".into()),
            ..Default::default()
        };
        assert!(matches!(validate_create(&req), Err(Error::InvalidInput(_))));
    }
}
