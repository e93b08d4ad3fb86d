//! Centralized default constants for cerberus.
//!
//! **This module is the single source of truth** for all shared default values.
//! Engine configuration, repositories, and the HTTP layer reference these
//! constants instead of defining their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section.

// =============================================================================
// CLUSTERING
// =============================================================================

/// A pair whose name similarity exceeds this is always an edge.
pub const STRONG_NAME_SIMILARITY: f64 = 0.7;

/// A pair whose name similarity exceeds this is an edge when both
/// organizations are present and equal.
pub const WEAK_NAME_SIMILARITY: f64 = 0.5;

/// Similarity score recorded for engine-derived, non-root cluster members.
pub const CLUSTER_MEMBER_SCORE: f64 = 0.8;

/// Similarity score recorded for the root member of a cluster.
pub const CLUSTER_ROOT_SCORE: f64 = 1.0;

/// Similarity score recorded for members added by a reviewer.
pub const MANUAL_MEMBER_SCORE: f64 = 0.5;

/// Maximum unresolved mentions clustered in one refresh; the rest are deferred.
pub const GROUPING_MAX_MENTIONS: usize = 500;

/// Minimum size of a cluster that becomes a merge group.
pub const MIN_GROUP_SIZE: usize = 2;

// =============================================================================
// STAKEHOLDER MATCHING
// =============================================================================

/// Fuzzy name similarity a stakeholder must exceed to be suggested or auto-linked.
pub const STAKEHOLDER_MATCH_THRESHOLD: f64 = 0.6;

/// Contributing artifacts returned per individual suggestion.
pub const SUGGESTION_ARTIFACT_LIMIT: i64 = 5;

/// Maximum characters of a context snippet before truncation.
pub const SNIPPET_LENGTH: usize = 200;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for stakeholder listings.
pub const PAGE_LIMIT: i64 = 50;

/// Upper bound on a requested page size.
pub const PAGE_LIMIT_MAX: i64 = 500;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP listen port.
pub const SERVER_PORT: u16 = 3000;

/// Default HTTP bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

// =============================================================================
// DATABASE
// =============================================================================

/// Default maximum pool connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Default minimum idle pool connections.
pub const DB_MIN_CONNECTIONS: u32 = 1;

/// Seconds to wait for a pooled connection.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Seconds an idle connection is kept before being closed.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Maximum connection lifetime in seconds.
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_ordering() {
        assert!(WEAK_NAME_SIMILARITY < STRONG_NAME_SIMILARITY);
        assert!(STRONG_NAME_SIMILARITY < 1.0);
        assert!(MANUAL_MEMBER_SCORE < CLUSTER_MEMBER_SCORE);
        assert!(CLUSTER_MEMBER_SCORE < CLUSTER_ROOT_SCORE);
    }

    #[test]
    fn test_pagination_bounds() {
        assert!(PAGE_LIMIT > 0);
        assert!(PAGE_LIMIT <= PAGE_LIMIT_MAX);
    }

    #[test]
    fn test_groups_need_two_members() {
        assert_eq!(MIN_GROUP_SIZE, 2);
    }
}
