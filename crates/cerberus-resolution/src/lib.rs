//! # cerberus-resolution
//!
//! Person identity resolution for cerberus.
//!
//! This crate provides:
//! - Refresh grouping: clustering unresolved person mentions into pending
//!   merge groups, serialized per program
//! - The merge workflow (confirm, reject, membership edits)
//! - Stakeholder linking by id or by name
//! - Individual and grouped suggestion retrieval
//!
//! ## Example
//!
//! ```rust,ignore
//! use cerberus_db::Database;
//! use cerberus_resolution::{IdentityResolutionEngine, ResolutionConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let db = Database::connect("postgres://...").await?;
//! let engine = IdentityResolutionEngine::new(db, ResolutionConfig::from_env()?);
//! let outcome = engine
//!     .refresh_grouping(program_id, &CancellationToken::new())
//!     .await?;
//! println!("{} groups created", outcome.groups_created);
//! ```

pub mod config;
pub mod engine;
pub mod linker;
pub mod stakeholders;
pub mod suggestions;
pub mod workflow;

pub use config::ResolutionConfig;
pub use engine::IdentityResolutionEngine;
pub use linker::best_stakeholder_match;
pub use suggestions::annotate;
pub use workflow::ensure_pending;
