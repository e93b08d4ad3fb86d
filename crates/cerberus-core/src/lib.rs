//! # cerberus-core
//!
//! Core types, traits, and algorithms for cerberus person identity resolution.
//!
//! This crate holds everything that does not touch the database: the domain
//! models, the error type, shared defaults, and the pure building blocks of
//! the resolution pipeline (name similarity, union-find clustering, conflict
//! analysis, and internal/external classification).

pub mod classification;
pub mod clustering;
pub mod conflicts;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod similarity;
pub mod snippets;
pub mod traits;
pub mod uuid_utils;
pub mod validity;

// Re-export commonly used types at crate root
pub use classification::{Classification, InternalOrgAliases};
pub use clustering::{
    build_edges, cluster_mentions, propose_groups, Cluster, ClusteringThresholds, SimilarityEdge,
    UnionFind,
};
pub use conflicts::{ConflictAnalysis, MemberAttributes};
pub use error::{Error, Result};
pub use models::*;
pub use similarity::{name_similarity, organization_matches};
pub use traits::*;
pub use uuid_utils::new_v7;
pub use validity::{parse_engagement_level, parse_stakeholder_type};
