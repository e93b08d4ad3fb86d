//! Merge group repository implementation.
//!
//! Reads go through [`MergeGroupRepository`]. Every mutation is a `_tx`
//! method so the workflow can compose several of them into one transaction.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use cerberus_core::conflicts::{self, MemberAttributes};
use cerberus_core::defaults;
use cerberus_core::snippets;
use cerberus_core::{
    new_v7, Error, GroupMemberDetail, GroupedSuggestion, MatchingMethod, MentionContext,
    MergeGroup, MergeGroupMember, MergeGroupRepository, MergeGroupStatus, ProposedMergeGroup,
    Result,
};

const GROUP_COLUMNS: &str = "group_id, program_id, suggested_name, status, has_role_conflicts, \
     has_org_conflicts, resolved_name, resolved_role, resolved_organization, \
     merged_stakeholder_id, merged_at, created_at, updated_at";

/// Resolution values written when a group is confirmed.
#[derive(Debug, Clone)]
pub struct GroupResolution<'a> {
    pub status: MergeGroupStatus,
    pub name: &'a str,
    pub role: Option<&'a str>,
    pub organization: Option<&'a str>,
    pub stakeholder_id: Option<Uuid>,
}

/// PostgreSQL implementation of MergeGroupRepository.
#[derive(Clone)]
pub struct PgMergeGroupRepository {
    pool: Pool<Postgres>,
}

impl PgMergeGroupRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Persist a proposed group as `pending` with its members.
    pub async fn insert_proposed_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        program_id: Uuid,
        proposal: &ProposedMergeGroup,
    ) -> Result<Uuid> {
        let group_id = new_v7();

        sqlx::query(
            "INSERT INTO person_merge_groups (
                 group_id, program_id, suggested_name, status,
                 has_role_conflicts, has_org_conflicts, created_at, updated_at
             ) VALUES ($1, $2, $3, 'pending', $4, $5, NOW(), NOW())",
        )
        .bind(group_id)
        .bind(program_id)
        .bind(&proposal.suggested_name)
        .bind(proposal.has_role_conflicts)
        .bind(proposal.has_org_conflicts)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let person_ids: Vec<Uuid> = proposal.members.iter().map(|m| m.person_id).collect();
        let scores: Vec<f64> = proposal.members.iter().map(|m| m.similarity_score).collect();
        let methods: Vec<String> = proposal
            .members
            .iter()
            .map(|m| m.matching_method.to_string())
            .collect();

        sqlx::query(
            "INSERT INTO person_merge_group_members (group_id, person_id, similarity_score, matching_method)
             SELECT $1, person_id, score, method
             FROM UNNEST($2::uuid[], $3::float8[], $4::text[]) AS m(person_id, score, method)",
        )
        .bind(group_id)
        .bind(&person_ids)
        .bind(&scores)
        .bind(&methods)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "merge_groups",
            op = "insert",
            program_id = %program_id,
            group_id = %group_id,
            member_count = person_ids.len(),
            "Merge group created"
        );
        Ok(group_id)
    }

    /// Sorted member-id sets of every pending group in the program.
    pub async fn pending_member_sets_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        program_id: Uuid,
    ) -> Result<HashSet<Vec<Uuid>>> {
        let rows = sqlx::query(
            "SELECT array_agg(m.person_id ORDER BY m.person_id) AS members
             FROM person_merge_groups g
             JOIN person_merge_group_members m ON g.group_id = m.group_id
             WHERE g.program_id = $1 AND g.status = 'pending'
             GROUP BY g.group_id",
        )
        .bind(program_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| row.get::<Vec<Uuid>, _>("members"))
            .collect())
    }

    /// Fetch a group of the program and lock its row until the transaction ends.
    pub async fn lock_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        program_id: Uuid,
        group_id: Uuid,
    ) -> Result<MergeGroup> {
        let sql = format!(
            "SELECT {} FROM person_merge_groups
             WHERE group_id = $1 AND program_id = $2
             FOR UPDATE",
            GROUP_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(group_id)
            .bind(program_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::MergeGroupNotFound(group_id))?;
        group_from_row(&row)
    }

    /// Record the reviewer's resolution and the new status.
    pub async fn resolve_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        group_id: Uuid,
        resolution: &GroupResolution<'_>,
    ) -> Result<MergeGroup> {
        let sql = format!(
            "UPDATE person_merge_groups
             SET resolved_name = $1,
                 resolved_role = $2,
                 resolved_organization = $3,
                 status = $4,
                 merged_stakeholder_id = $5,
                 merged_at = CASE WHEN $5::uuid IS NULL THEN NULL ELSE NOW() END,
                 updated_at = NOW()
             WHERE group_id = $6
             RETURNING {}",
            GROUP_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(resolution.name)
            .bind(resolution.role)
            .bind(resolution.organization)
            .bind(resolution.status.to_string())
            .bind(resolution.stakeholder_id)
            .bind(group_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::MergeGroupNotFound(group_id))?;
        group_from_row(&row)
    }

    /// Change only the status of a group.
    pub async fn set_status_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        group_id: Uuid,
        status: MergeGroupStatus,
    ) -> Result<MergeGroup> {
        let sql = format!(
            "UPDATE person_merge_groups SET status = $1, updated_at = NOW()
             WHERE group_id = $2
             RETURNING {}",
            GROUP_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(status.to_string())
            .bind(group_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::MergeGroupNotFound(group_id))?;
        group_from_row(&row)
    }

    /// Remove members. Ids that are not members are ignored.
    pub async fn remove_members_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        group_id: Uuid,
        person_ids: &[Uuid],
    ) -> Result<u64> {
        if person_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "DELETE FROM person_merge_group_members
             WHERE group_id = $1 AND person_id = ANY($2)",
        )
        .bind(group_id)
        .bind(person_ids)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }

    /// Add members with a fixed score and method. Existing members are kept as they are.
    pub async fn add_members_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        group_id: Uuid,
        person_ids: &[Uuid],
        similarity_score: f64,
        method: MatchingMethod,
    ) -> Result<u64> {
        if person_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO person_merge_group_members (group_id, person_id, similarity_score, matching_method)
             SELECT $1, person_id, $3, $4 FROM UNNEST($2::uuid[]) AS m(person_id)
             ON CONFLICT (group_id, person_id) DO NOTHING",
        )
        .bind(group_id)
        .bind(person_ids)
        .bind(similarity_score)
        .bind(method.to_string())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }

    /// Member ids of a group, ascending.
    pub async fn member_ids_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        group_id: Uuid,
    ) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT person_id FROM person_merge_group_members
             WHERE group_id = $1 ORDER BY person_id",
        )
        .bind(group_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(ids)
    }

    /// Overwrite the derived suggested name and conflict flags.
    pub async fn update_analysis_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        group_id: Uuid,
        suggested_name: &str,
        has_role_conflicts: bool,
        has_org_conflicts: bool,
    ) -> Result<MergeGroup> {
        let sql = format!(
            "UPDATE person_merge_groups
             SET suggested_name = $1, has_role_conflicts = $2, has_org_conflicts = $3,
                 updated_at = NOW()
             WHERE group_id = $4
             RETURNING {}",
            GROUP_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(suggested_name)
            .bind(has_role_conflicts)
            .bind(has_org_conflicts)
            .bind(group_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::MergeGroupNotFound(group_id))?;
        group_from_row(&row)
    }
}

fn group_from_row(row: &PgRow) -> Result<MergeGroup> {
    let status: String = row.get("status");
    Ok(MergeGroup {
        group_id: row.get("group_id"),
        program_id: row.get("program_id"),
        suggested_name: row.get("suggested_name"),
        status: status
            .parse::<MergeGroupStatus>()
            .map_err(Error::Internal)?,
        has_role_conflicts: row.get("has_role_conflicts"),
        has_org_conflicts: row.get("has_org_conflicts"),
        resolved_name: row.get("resolved_name"),
        resolved_role: row.get("resolved_role"),
        resolved_organization: row.get("resolved_organization"),
        merged_stakeholder_id: row.get("merged_stakeholder_id"),
        merged_at: row.get("merged_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn matching_method_from_row(row: &PgRow) -> Result<MatchingMethod> {
    let method: String = row.get("matching_method");
    method.parse::<MatchingMethod>().map_err(Error::Internal)
}

#[async_trait]
impl MergeGroupRepository for PgMergeGroupRepository {
    async fn get(&self, program_id: Uuid, group_id: Uuid) -> Result<MergeGroup> {
        let sql = format!(
            "SELECT {} FROM person_merge_groups WHERE group_id = $1 AND program_id = $2",
            GROUP_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(group_id)
            .bind(program_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::MergeGroupNotFound(group_id))?;
        group_from_row(&row)
    }

    async fn members(&self, group_id: Uuid) -> Result<Vec<MergeGroupMember>> {
        let rows = sqlx::query(
            "SELECT person_id, similarity_score, matching_method
             FROM person_merge_group_members
             WHERE group_id = $1
             ORDER BY similarity_score DESC, person_id ASC",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                Ok(MergeGroupMember {
                    person_id: row.get("person_id"),
                    similarity_score: row.get("similarity_score"),
                    matching_method: matching_method_from_row(row)?,
                })
            })
            .collect()
    }

    async fn grouped_suggestions(&self, program_id: Uuid) -> Result<Vec<GroupedSuggestion>> {
        let group_rows = sqlx::query(
            "SELECT pmg.group_id, pmg.suggested_name, pmg.status,
                    pmg.has_role_conflicts, pmg.has_org_conflicts,
                    COUNT(DISTINCT pgm.person_id) AS total_persons,
                    COUNT(DISTINCT ap.artifact_id) AS total_artifacts,
                    COALESCE(SUM(ap.mention_count), 0)::BIGINT AS total_mentions,
                    COALESCE(AVG(COALESCE(ap.confidence_score, 0)), 0)::FLOAT8 AS average_confidence,
                    MAX(ap.extracted_at) AS last_mentioned
             FROM person_merge_groups pmg
             JOIN person_merge_group_members pgm ON pmg.group_id = pgm.group_id
             JOIN artifact_persons ap ON pgm.person_id = ap.person_id
             WHERE pmg.program_id = $1 AND pmg.status = 'pending'
             GROUP BY pmg.group_id
             ORDER BY total_mentions DESC, last_mentioned DESC NULLS LAST, pmg.group_id ASC",
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        if group_rows.is_empty() {
            return Ok(Vec::new());
        }

        let member_rows = sqlx::query(
            "SELECT pgm.group_id, ap.person_id, ap.person_name, ap.person_role,
                    ap.person_organization, ap.confidence_score,
                    pgm.similarity_score, pgm.matching_method,
                    COUNT(DISTINCT ap.artifact_id) AS artifact_count,
                    SUM(ap.mention_count)::BIGINT AS mention_count
             FROM person_merge_groups pmg
             JOIN person_merge_group_members pgm ON pmg.group_id = pgm.group_id
             JOIN artifact_persons ap ON pgm.person_id = ap.person_id
             WHERE pmg.program_id = $1 AND pmg.status = 'pending'
             GROUP BY pgm.group_id, ap.person_id, ap.person_name, ap.person_role,
                      ap.person_organization, ap.confidence_score,
                      pgm.similarity_score, pgm.matching_method
             ORDER BY pgm.group_id, pgm.similarity_score DESC, ap.person_name ASC, ap.person_id ASC",
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut members: HashMap<Uuid, Vec<GroupMemberDetail>> = HashMap::new();
        for row in &member_rows {
            members
                .entry(row.get("group_id"))
                .or_default()
                .push(GroupMemberDetail {
                    person_id: row.get("person_id"),
                    person_name: row.get("person_name"),
                    person_role: row.get("person_role"),
                    person_organization: row.get("person_organization"),
                    confidence_score: row.get("confidence_score"),
                    similarity_score: row.get("similarity_score"),
                    matching_method: matching_method_from_row(row)?,
                    artifact_count: row.get("artifact_count"),
                    mention_count: row.get("mention_count"),
                });
        }

        let context_rows = sqlx::query(
            "SELECT pgm.group_id, a.artifact_id, a.filename, a.uploaded_at,
                    ap.person_name, ap.context_snippets
             FROM person_merge_groups pmg
             JOIN person_merge_group_members pgm ON pmg.group_id = pgm.group_id
             JOIN artifact_persons ap ON pgm.person_id = ap.person_id
             JOIN artifacts a ON ap.artifact_id = a.artifact_id
             WHERE pmg.program_id = $1 AND pmg.status = 'pending'
             ORDER BY pgm.group_id, a.uploaded_at DESC, ap.person_id ASC",
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut contexts: HashMap<Uuid, Vec<MentionContext>> = HashMap::new();
        for row in &context_rows {
            let raw: Option<serde_json::Value> = row.get("context_snippets");
            contexts
                .entry(row.get("group_id"))
                .or_default()
                .push(MentionContext {
                    artifact_id: row.get("artifact_id"),
                    filename: row.get("filename"),
                    uploaded_at: row.get("uploaded_at"),
                    person_name: row.get("person_name"),
                    snippet: raw
                        .as_ref()
                        .and_then(|v| snippets::preview(v, defaults::SNIPPET_LENGTH)),
                });
        }

        let mut out = Vec::with_capacity(group_rows.len());
        for row in &group_rows {
            let group_id: Uuid = row.get("group_id");
            let status: String = row.get("status");
            let has_role_conflicts: bool = row.get("has_role_conflicts");
            let has_org_conflicts: bool = row.get("has_org_conflicts");
            let group_members = members.remove(&group_id).unwrap_or_default();

            let (role_options, org_options) = if has_role_conflicts || has_org_conflicts {
                conflicts::analyze(group_members.iter().map(MemberAttributes::from))
                    .map(|a| (a.role_options, a.org_options))
                    .unwrap_or_default()
            } else {
                (Vec::new(), Vec::new())
            };

            out.push(GroupedSuggestion {
                group_id,
                suggested_name: row.get("suggested_name"),
                status: status
                    .parse::<MergeGroupStatus>()
                    .map_err(Error::Internal)?,
                has_role_conflicts,
                has_org_conflicts,
                total_persons: row.get("total_persons"),
                total_artifacts: row.get("total_artifacts"),
                total_mentions: row.get("total_mentions"),
                average_confidence: row.get("average_confidence"),
                last_mentioned: row.get("last_mentioned"),
                members: group_members,
                role_options,
                org_options,
                all_contexts: contexts.remove(&group_id).unwrap_or_default(),
            });
        }

        debug!(
            subsystem = "db",
            component = "merge_groups",
            op = "grouped_suggestions",
            program_id = %program_id,
            result_count = out.len(),
            "Pending merge groups loaded"
        );
        Ok(out)
    }
}
