//! Person mention repository implementation.
//!
//! Mentions are written by the extraction pipeline. The only column this
//! repository ever updates is `stakeholder_id`.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use cerberus_core::{
    Error, MentionRepository, PersonMention, Result, SuggestionArtifact, SuggestionCandidate,
};

const MENTION_COLUMNS: &str = "ap.person_id, ap.artifact_id, ap.person_name, ap.person_role, \
     ap.person_organization, ap.confidence_score, ap.mention_count, ap.stakeholder_id, \
     ap.extracted_at";

/// PostgreSQL implementation of MentionRepository.
#[derive(Clone)]
pub struct PgMentionRepository {
    pool: Pool<Postgres>,
}

impl PgMentionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Number of unresolved mentions in the program.
    pub async fn count_unresolved_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        program_id: Uuid,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM artifact_persons ap
             JOIN artifacts a ON ap.artifact_id = a.artifact_id
             WHERE a.program_id = $1 AND ap.stakeholder_id IS NULL",
        )
        .bind(program_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(count)
    }

    /// Unresolved mentions of the program in ascending id order, at most `limit`.
    pub async fn list_unresolved_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        program_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PersonMention>> {
        let sql = format!(
            "SELECT {} FROM artifact_persons ap
             JOIN artifacts a ON ap.artifact_id = a.artifact_id
             WHERE a.program_id = $1 AND ap.stakeholder_id IS NULL
             ORDER BY ap.person_id ASC
             LIMIT $2",
            MENTION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(program_id)
            .bind(limit)
            .fetch_all(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(mention_from_row).collect())
    }

    /// Mentions of the program among `person_ids`, in ascending id order.
    pub async fn get_many_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        program_id: Uuid,
        person_ids: &[Uuid],
    ) -> Result<Vec<PersonMention>> {
        if person_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM artifact_persons ap
             JOIN artifacts a ON ap.artifact_id = a.artifact_id
             WHERE a.program_id = $1 AND ap.person_id = ANY($2)
             ORDER BY ap.person_id ASC",
            MENTION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(program_id)
            .bind(person_ids)
            .fetch_all(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(mention_from_row).collect())
    }

    /// Point every member of a merge group at a stakeholder.
    ///
    /// Returns the number of mentions updated.
    pub async fn link_group_members_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        group_id: Uuid,
        stakeholder_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE artifact_persons SET stakeholder_id = $1
             WHERE person_id IN (
                 SELECT person_id FROM person_merge_group_members WHERE group_id = $2
             )",
        )
        .bind(stakeholder_id)
        .bind(group_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

fn mention_from_row(row: &PgRow) -> PersonMention {
    PersonMention {
        person_id: row.get("person_id"),
        artifact_id: row.get("artifact_id"),
        person_name: row.get("person_name"),
        person_role: row.get("person_role"),
        person_organization: row.get("person_organization"),
        confidence_score: row.get("confidence_score"),
        mention_count: row.get("mention_count"),
        stakeholder_id: row.get("stakeholder_id"),
        extracted_at: row.get("extracted_at"),
    }
}

#[async_trait]
impl MentionRepository for PgMentionRepository {
    async fn get(&self, program_id: Uuid, person_id: Uuid) -> Result<PersonMention> {
        let sql = format!(
            "SELECT {} FROM artifact_persons ap
             JOIN artifacts a ON ap.artifact_id = a.artifact_id
             WHERE a.program_id = $1 AND ap.person_id = $2",
            MENTION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(program_id)
            .bind(person_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::MentionNotFound(person_id))?;
        Ok(mention_from_row(&row))
    }

    async fn suggestion_candidates(
        &self,
        program_id: Uuid,
        artifact_limit: i64,
    ) -> Result<Vec<SuggestionCandidate>> {
        let rows = sqlx::query(
            "SELECT ap.person_id, ap.person_name, ap.person_role, ap.person_organization,
                    ap.confidence_score,
                    COUNT(DISTINCT ap.artifact_id) AS artifact_count,
                    SUM(ap.mention_count)::BIGINT AS total_mentions,
                    MAX(ap.extracted_at) AS last_mentioned
             FROM artifact_persons ap
             JOIN artifacts a ON ap.artifact_id = a.artifact_id
             WHERE a.program_id = $1 AND ap.stakeholder_id IS NULL
             GROUP BY ap.person_id, ap.person_name, ap.person_role, ap.person_organization,
                      ap.confidence_score
             ORDER BY total_mentions DESC, last_mentioned DESC, ap.person_id ASC",
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // Top artifacts for every candidate in one round trip.
        let artifact_rows = sqlx::query(
            "SELECT person_id, artifact_id, filename, mention_count FROM (
                 SELECT ap.person_id, a.artifact_id, a.filename, ap.mention_count,
                        ROW_NUMBER() OVER (
                            PARTITION BY ap.person_id
                            ORDER BY ap.mention_count DESC, a.uploaded_at DESC, a.artifact_id ASC
                        ) AS rn
                 FROM artifact_persons ap
                 JOIN artifacts a ON ap.artifact_id = a.artifact_id
                 WHERE a.program_id = $1 AND ap.stakeholder_id IS NULL
             ) ranked
             WHERE rn <= $2
             ORDER BY person_id, rn",
        )
        .bind(program_id)
        .bind(artifact_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut artifacts: HashMap<Uuid, Vec<SuggestionArtifact>> = HashMap::new();
        for row in artifact_rows {
            artifacts
                .entry(row.get("person_id"))
                .or_default()
                .push(SuggestionArtifact {
                    artifact_id: row.get("artifact_id"),
                    filename: row.get("filename"),
                    mention_count: row.get("mention_count"),
                });
        }

        let candidates: Vec<SuggestionCandidate> = rows
            .into_iter()
            .map(|row| {
                let person_id: Uuid = row.get("person_id");
                SuggestionCandidate {
                    person_id,
                    person_name: row.get("person_name"),
                    person_role: row.get("person_role"),
                    person_organization: row.get("person_organization"),
                    confidence_score: row.get("confidence_score"),
                    artifact_count: row.get("artifact_count"),
                    total_mentions: row.get("total_mentions"),
                    last_mentioned: row.get("last_mentioned"),
                    artifacts: artifacts.remove(&person_id).unwrap_or_default(),
                }
            })
            .collect();

        debug!(
            subsystem = "db",
            component = "mentions",
            op = "suggestion_candidates",
            program_id = %program_id,
            result_count = candidates.len(),
            "Unresolved mention candidates loaded"
        );
        Ok(candidates)
    }

    async fn link_to_stakeholder(
        &self,
        program_id: Uuid,
        person_id: Uuid,
        stakeholder_id: Uuid,
    ) -> Result<()> {
        let stakeholder_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM program_stakeholders
                 WHERE stakeholder_id = $1 AND program_id = $2 AND deleted_at IS NULL
             )",
        )
        .bind(stakeholder_id)
        .bind(program_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        if !stakeholder_exists {
            return Err(Error::StakeholderNotFound(stakeholder_id));
        }

        let result = sqlx::query(
            "UPDATE artifact_persons ap SET stakeholder_id = $1
             FROM artifacts a
             WHERE ap.artifact_id = a.artifact_id
               AND a.program_id = $2
               AND ap.person_id = $3",
        )
        .bind(stakeholder_id)
        .bind(program_id)
        .bind(person_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::MentionNotFound(person_id));
        }

        debug!(
            subsystem = "db",
            component = "mentions",
            op = "link",
            person_id = %person_id,
            stakeholder_id = %stakeholder_id,
            "Mention linked to stakeholder"
        );
        Ok(())
    }
}
