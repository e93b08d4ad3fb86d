//! Core traits for cerberus persistence.
//!
//! These traits define the read and single-statement write operations the
//! identity resolution engine needs. Multi-step workflow mutations run inside
//! an explicit transaction and are exposed as `_tx` methods on the concrete
//! PostgreSQL repositories instead.

use async_trait::async_trait;
use uuid::Uuid;

use crate::classification::InternalOrgAliases;
use crate::error::Result;
use crate::models::*;

// =============================================================================
// PROGRAM REPOSITORY
// =============================================================================

/// Read access to the owning program.
#[async_trait]
pub trait ProgramRepository: Send + Sync {
    /// Whether the program exists.
    async fn exists(&self, program_id: Uuid) -> Result<bool>;

    /// The program's internal-organization aliases; empty when none are set.
    async fn internal_aliases(&self, program_id: Uuid) -> Result<InternalOrgAliases>;
}

// =============================================================================
// PERSON MENTION REPOSITORY
// =============================================================================

/// Access to extracted person mentions.
#[async_trait]
pub trait MentionRepository: Send + Sync {
    /// Get a mention belonging to the program.
    async fn get(&self, program_id: Uuid, person_id: Uuid) -> Result<PersonMention>;

    /// Unresolved mentions of the program with their statistics and up to
    /// `artifact_limit` contributing artifacts each, most mentioned first.
    async fn suggestion_candidates(
        &self,
        program_id: Uuid,
        artifact_limit: i64,
    ) -> Result<Vec<SuggestionCandidate>>;

    /// Point a mention at a stakeholder, overwriting any previous link.
    async fn link_to_stakeholder(
        &self,
        program_id: Uuid,
        person_id: Uuid,
        stakeholder_id: Uuid,
    ) -> Result<()>;
}

// =============================================================================
// STAKEHOLDER REPOSITORY
// =============================================================================

/// Filter for listing stakeholders.
#[derive(Debug, Clone, Default)]
pub struct StakeholderFilter {
    /// Owning program
    pub program_id: Uuid,
    /// Only stakeholders of this type
    pub stakeholder_type: Option<StakeholderType>,
    /// Only internal (true) or external (false) stakeholders
    pub is_internal: Option<bool>,
    /// Only stakeholders at this engagement level
    pub engagement_level: Option<EngagementLevel>,
    /// Maximum results (defaults to `defaults::PAGE_LIMIT`)
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// CRUD and lookup for canonical stakeholders. Soft-deleted rows are invisible.
#[async_trait]
pub trait StakeholderRepository: Send + Sync {
    /// Create a stakeholder after validating type and engagement level.
    async fn create(&self, program_id: Uuid, req: &CreateStakeholderRequest) -> Result<Stakeholder>;

    /// Get a stakeholder of the program.
    async fn get(&self, program_id: Uuid, stakeholder_id: Uuid) -> Result<Stakeholder>;

    /// List stakeholders ordered by name.
    async fn list(&self, filter: &StakeholderFilter) -> Result<Vec<Stakeholder>>;

    /// Apply a partial update and return the updated row.
    async fn update(
        &self,
        program_id: Uuid,
        stakeholder_id: Uuid,
        req: &UpdateStakeholderRequest,
    ) -> Result<Stakeholder>;

    /// Soft-delete a stakeholder.
    async fn delete(&self, program_id: Uuid, stakeholder_id: Uuid) -> Result<()>;

    /// Id and name of every live stakeholder of the program.
    async fn names(&self, program_id: Uuid) -> Result<Vec<StakeholderName>>;

    /// Stakeholder whose name equals `name` ignoring case, if any.
    async fn find_by_exact_name(
        &self,
        program_id: Uuid,
        name: &str,
    ) -> Result<Option<StakeholderName>>;

    /// Artifacts in which mentions linked to the stakeholder appear.
    async fn linked_artifacts(
        &self,
        program_id: Uuid,
        stakeholder_id: Uuid,
    ) -> Result<Vec<LinkedArtifact>>;
}

// =============================================================================
// MERGE GROUP REPOSITORY
// =============================================================================

/// Read access to merge groups.
#[async_trait]
pub trait MergeGroupRepository: Send + Sync {
    /// Get a merge group of the program.
    async fn get(&self, program_id: Uuid, group_id: Uuid) -> Result<MergeGroup>;

    /// Members of a merge group.
    async fn members(&self, group_id: Uuid) -> Result<Vec<MergeGroupMember>>;

    /// Every pending group of the program with members, conflict options and
    /// context snippets.
    async fn grouped_suggestions(&self, program_id: Uuid) -> Result<Vec<GroupedSuggestion>>;
}
