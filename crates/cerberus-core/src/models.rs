//! Core data models for cerberus identity resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// PERSON MENTIONS
// =============================================================================

/// One extracted occurrence of a person in an uploaded artifact.
///
/// Rows are produced by the extraction pipeline; this engine only ever writes
/// `stakeholder_id`. A mention with a non-null `stakeholder_id` is resolved and
/// never clustered again.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PersonMention {
    pub person_id: Uuid,
    pub artifact_id: Uuid,
    pub person_name: String,
    pub person_role: Option<String>,
    pub person_organization: Option<String>,
    /// Extraction confidence in `[0, 1]`.
    pub confidence_score: Option<f64>,
    /// Occurrences of this person inside the artifact.
    pub mention_count: i32,
    pub stakeholder_id: Option<Uuid>,
    pub extracted_at: DateTime<Utc>,
}

impl PersonMention {
    pub fn is_resolved(&self) -> bool {
        self.stakeholder_id.is_some()
    }
}

// =============================================================================
// MERGE GROUPS
// =============================================================================

/// Lifecycle of a merge group.
///
/// `pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MergeGroupStatus {
    /// Awaiting review.
    #[default]
    Pending,
    /// Accepted without creating a stakeholder.
    Confirmed,
    /// Accepted and resolved into a newly created stakeholder.
    Merged,
    /// Dismissed by the reviewer.
    Rejected,
}

impl MergeGroupStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for MergeGroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Merged => write!(f, "merged"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for MergeGroupStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "merged" => Ok(Self::Merged),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Invalid merge group status: {}", s)),
        }
    }
}

/// How a mention came to be a member of a merge group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchingMethod {
    /// Derived by the clustering engine.
    #[default]
    FuzzyName,
    /// Added by a reviewer.
    Manual,
}

impl std::fmt::Display for MatchingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FuzzyName => write!(f, "fuzzy_name"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for MatchingMethod {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fuzzy_name" => Ok(Self::FuzzyName),
            "manual" => Ok(Self::Manual),
            _ => Err(format!("Invalid matching method: {}", s)),
        }
    }
}

/// A reviewable cluster of mentions believed to be one individual.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MergeGroup {
    pub group_id: Uuid,
    pub program_id: Uuid,
    pub suggested_name: String,
    pub status: MergeGroupStatus,
    pub has_role_conflicts: bool,
    pub has_org_conflicts: bool,
    pub resolved_name: Option<String>,
    pub resolved_role: Option<String>,
    pub resolved_organization: Option<String>,
    pub merged_stakeholder_id: Option<Uuid>,
    pub merged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership of a mention in a merge group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MergeGroupMember {
    pub person_id: Uuid,
    pub similarity_score: f64,
    pub matching_method: MatchingMethod,
}

/// A cluster ready to be persisted as a new pending merge group.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedMergeGroup {
    pub suggested_name: String,
    pub has_role_conflicts: bool,
    pub has_org_conflicts: bool,
    /// The cluster root first, then the remaining members in ascending id order.
    pub members: Vec<MergeGroupMember>,
}

impl ProposedMergeGroup {
    /// Member ids, sorted.
    pub fn member_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.members.iter().map(|m| m.person_id).collect();
        ids.sort();
        ids
    }
}

/// A distinct role or organization value observed within a cluster.
///
/// Derived on read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ConflictOption {
    pub value: String,
    /// Number of member rows carrying this value.
    pub count: i64,
    /// Mean confidence of those rows, missing confidence counted as 0.
    pub confidence: f64,
}

// =============================================================================
// STAKEHOLDERS
// =============================================================================

/// Classification of a stakeholder relative to the owning program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StakeholderType {
    #[default]
    Internal,
    External,
    Vendor,
    Partner,
    Customer,
}

impl StakeholderType {
    pub const ALL: [StakeholderType; 5] = [
        Self::Internal,
        Self::External,
        Self::Vendor,
        Self::Partner,
        Self::Customer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::Vendor => "vendor",
            Self::Partner => "partner",
            Self::Customer => "customer",
        }
    }
}

impl std::fmt::Display for StakeholderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StakeholderType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        crate::validity::STAKEHOLDER_TYPES
            .get(s.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| format!("Invalid stakeholder type: {}", s))
    }
}

/// How closely a stakeholder is engaged with the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    Key,
    Primary,
    Secondary,
    Observer,
}

impl EngagementLevel {
    pub const ALL: [EngagementLevel; 4] =
        [Self::Key, Self::Primary, Self::Secondary, Self::Observer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Observer => "observer",
        }
    }
}

impl std::fmt::Display for EngagementLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EngagementLevel {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        crate::validity::ENGAGEMENT_LEVELS
            .get(s.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| format!("Invalid engagement level: {}", s))
    }
}

/// Canonical identity record tracked by a program.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Stakeholder {
    pub stakeholder_id: Uuid,
    pub program_id: Uuid,
    pub person_name: String,
    pub stakeholder_type: StakeholderType,
    pub is_internal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement_level: Option<EngagementLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub influence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a stakeholder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateStakeholderRequest {
    pub person_name: String,
    /// One of internal, external, vendor, partner, customer.
    pub stakeholder_type: String,
    #[serde(default)]
    pub is_internal: bool,
    pub email: Option<String>,
    pub role: Option<String>,
    pub organization: Option<String>,
    /// One of key, primary, secondary, observer.
    pub engagement_level: Option<String>,
    pub department: Option<String>,
    pub influence: Option<String>,
    pub notes: Option<String>,
}

/// Request body for a partial stakeholder update. Absent fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateStakeholderRequest {
    pub person_name: Option<String>,
    pub stakeholder_type: Option<String>,
    pub is_internal: Option<bool>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub organization: Option<String>,
    pub engagement_level: Option<String>,
    pub department: Option<String>,
    pub influence: Option<String>,
    pub notes: Option<String>,
}

impl UpdateStakeholderRequest {
    pub fn is_empty(&self) -> bool {
        self.person_name.is_none()
            && self.stakeholder_type.is_none()
            && self.is_internal.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.organization.is_none()
            && self.engagement_level.is_none()
            && self.department.is_none()
            && self.influence.is_none()
            && self.notes.is_none()
    }
}

/// An artifact in which a stakeholder's resolved mentions appear.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LinkedArtifact {
    pub artifact_id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub mention_count: i64,
}

// =============================================================================
// SUGGESTIONS
// =============================================================================

/// Artifact contributing to an individual suggestion.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SuggestionArtifact {
    pub artifact_id: Uuid,
    pub filename: String,
    pub mention_count: i32,
}

/// An unresolved mention surfaced for individual review.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PersonSuggestion {
    pub person_id: Uuid,
    pub person_name: String,
    pub person_role: Option<String>,
    pub person_organization: Option<String>,
    pub confidence_score: Option<f64>,
    pub artifact_count: i64,
    pub total_mentions: i64,
    pub last_mentioned: DateTime<Utc>,
    /// Closest existing stakeholder above the match threshold.
    pub suggested_stakeholder_id: Option<Uuid>,
    /// Similarity to `suggested_stakeholder_id`, 0 when there is none.
    pub similarity_score: f64,
    pub suggested_stakeholder_type: StakeholderType,
    pub suggested_is_internal: bool,
    pub artifacts: Vec<SuggestionArtifact>,
}

/// An unresolved mention with its aggregate statistics, before stakeholder
/// matching and classification are applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionCandidate {
    pub person_id: Uuid,
    pub person_name: String,
    pub person_role: Option<String>,
    pub person_organization: Option<String>,
    pub confidence_score: Option<f64>,
    pub artifact_count: i64,
    pub total_mentions: i64,
    pub last_mentioned: DateTime<Utc>,
    pub artifacts: Vec<SuggestionArtifact>,
}

/// Minimal stakeholder projection used for name matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeholderName {
    pub stakeholder_id: Uuid,
    pub person_name: String,
}

/// A merge group member with its per-mention statistics.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GroupMemberDetail {
    pub person_id: Uuid,
    pub person_name: String,
    pub person_role: Option<String>,
    pub person_organization: Option<String>,
    pub confidence_score: Option<f64>,
    pub similarity_score: f64,
    pub matching_method: MatchingMethod,
    pub artifact_count: i64,
    pub mention_count: i64,
}

/// A context snippet showing where a group member was mentioned.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MentionContext {
    pub artifact_id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub person_name: String,
    pub snippet: Option<String>,
}

/// A pending merge group with everything the review UI needs.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GroupedSuggestion {
    pub group_id: Uuid,
    pub suggested_name: String,
    pub status: MergeGroupStatus,
    pub has_role_conflicts: bool,
    pub has_org_conflicts: bool,
    pub total_persons: i64,
    pub total_artifacts: i64,
    pub total_mentions: i64,
    pub average_confidence: f64,
    pub last_mentioned: Option<DateTime<Utc>>,
    pub members: Vec<GroupMemberDetail>,
    pub role_options: Vec<ConflictOption>,
    pub org_options: Vec<ConflictOption>,
    pub all_contexts: Vec<MentionContext>,
}

// =============================================================================
// WORKFLOW REQUESTS & OUTCOMES
// =============================================================================

/// Request body for confirming a merge group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ConfirmMergeRequest {
    pub selected_name: String,
    pub selected_role: Option<String>,
    pub selected_organization: Option<String>,
    #[serde(default)]
    pub create_stakeholder: bool,
}

/// Request body for editing merge group membership.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ModifyMembersRequest {
    #[serde(default)]
    pub add_person_ids: Vec<Uuid>,
    #[serde(default)]
    pub remove_person_ids: Vec<Uuid>,
}

/// Request body for linking a mention to a stakeholder.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LinkPersonRequest {
    pub stakeholder_id: Uuid,
}

/// Request body for name-based stakeholder lookup.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AutoLinkRequest {
    pub person_name: String,
}

/// Result of confirming a merge group.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ConfirmOutcome {
    pub group_id: Uuid,
    pub status: MergeGroupStatus,
    /// Present when a stakeholder was created.
    pub stakeholder: Option<Stakeholder>,
    /// Mentions whose stakeholder reference was set.
    pub linked_persons: u64,
}

/// How an auto-link lookup found its stakeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// Stakeholder found by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StakeholderMatch {
    pub stakeholder_id: Uuid,
    pub person_name: String,
    pub similarity_score: f64,
    pub match_kind: MatchKind,
}

/// Summary of one refresh-grouping run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GroupingOutcome {
    pub mentions_considered: usize,
    /// Unresolved mentions left for a later run because of the per-run cap.
    pub mentions_deferred: usize,
    pub edges: usize,
    pub clusters: usize,
    pub groups_created: usize,
    /// Clusters identical to an existing pending group.
    pub groups_skipped: usize,
}
