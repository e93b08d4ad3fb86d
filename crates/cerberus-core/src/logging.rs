//! Structured logging schema and field name constants for cerberus.
//!
//! All crates use these constants for consistent structured logging fields so
//! log aggregation tools can query by the same field names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied (e.g. deferred mentions) |
//! | INFO  | Lifecycle events, completed workflow transitions |
//! | DEBUG | Decision points, intermediate counts, config choices |
//! | TRACE | Per-pair and per-member iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "db", "resolution"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "clustering", "merge_workflow", "linker", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "refresh_grouping", "confirm", "auto_link"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Program UUID the operation is scoped to.
pub const PROGRAM_ID: &str = "program_id";

/// Merge group UUID being operated on.
pub const GROUP_ID: &str = "group_id";

/// Person mention UUID being operated on.
pub const PERSON_ID: &str = "person_id";

/// Stakeholder UUID being operated on.
pub const STAKEHOLDER_ID: &str = "stakeholder_id";

// ─── Metric fields ─────────────────────────────────────────────────────────

/// Wall-clock duration of the operation in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of mentions considered.
pub const MENTION_COUNT: &str = "mention_count";

/// Number of similarity edges accepted.
pub const EDGE_COUNT: &str = "edge_count";

/// Number of clusters of size two or more.
pub const CLUSTER_COUNT: &str = "cluster_count";

/// Number of rows returned or affected.
pub const RESULT_COUNT: &str = "result_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Database table name for DB operations.
pub const DB_TABLE: &str = "db_table";

/// Error message (for failed operations).
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_snake_case() {
        for name in [
            SUBSYSTEM,
            COMPONENT,
            OPERATION,
            PROGRAM_ID,
            GROUP_ID,
            PERSON_ID,
            STAKEHOLDER_ID,
            DURATION_MS,
            MENTION_COUNT,
            EDGE_COUNT,
            CLUSTER_COUNT,
            RESULT_COUNT,
            DB_TABLE,
            ERROR_MSG,
        ] {
            assert!(!name.is_empty());
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
