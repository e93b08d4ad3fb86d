//! The identity resolution engine and its refresh-grouping pass.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cerberus_core::{
    build_edges, cluster_mentions, name_similarity, propose_groups, Error, GroupingOutcome,
    ProgramRepository, Result,
};
use cerberus_db::{advisory_xact_lock, grouping_lock_key, Database};

use crate::config::ResolutionConfig;

/// Orchestrates clustering, the merge workflow, stakeholder linking and
/// suggestion retrieval for one database.
#[derive(Clone)]
pub struct IdentityResolutionEngine {
    pub(crate) db: Database,
    pub(crate) config: ResolutionConfig,
}

impl IdentityResolutionEngine {
    pub fn new(db: Database, config: ResolutionConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Fail with `ProgramNotFound` unless the program exists.
    pub(crate) async fn require_program(&self, program_id: Uuid) -> Result<()> {
        if self.db.programs.exists(program_id).await? {
            Ok(())
        } else {
            Err(Error::ProgramNotFound(program_id))
        }
    }

    /// Cluster the program's unresolved mentions and persist new pending groups.
    ///
    /// Runs in one transaction holding a per-program advisory lock, so
    /// concurrent refreshes of the same program execute one after the other.
    /// At most `max_mentions` mentions (lowest ids first) are considered; the
    /// rest are reported as deferred. A cluster whose member set equals an
    /// existing pending group is skipped. Cancelling `cancel` aborts the run
    /// and rolls back everything it wrote.
    pub async fn refresh_grouping(
        &self,
        program_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<GroupingOutcome> {
        let start = Instant::now();
        let programs = self.db.programs.clone();
        let mentions = self.db.mentions.clone();
        let groups = self.db.merge_groups.clone();
        let thresholds = self.config.clustering_thresholds();
        let cap = i64::try_from(self.config.max_mentions).map_err(|_| {
            Error::Config(format!("GROUPING_MAX_MENTIONS must be at most {}", i64::MAX))
        })?;
        let cancel = cancel.clone();

        let outcome = self
            .db
            .tx()
            .execute(move |tx| {
                Box::pin(async move {
                    advisory_xact_lock(tx, &grouping_lock_key(program_id)).await?;
                    if !programs.exists_tx(tx, program_id).await? {
                        return Err(Error::ProgramNotFound(program_id));
                    }

                    let unresolved = mentions.count_unresolved_tx(tx, program_id).await?;
                    let batch = mentions
                        .list_unresolved_tx(tx, program_id, cap)
                        .await?;
                    let deferred = usize::try_from(unresolved)
                        .unwrap_or(0)
                        .saturating_sub(batch.len());
                    if deferred > 0 {
                        warn!(
                            subsystem = "resolution",
                            component = "clustering",
                            op = "refresh_grouping",
                            program_id = %program_id,
                            mention_count = batch.len(),
                            deferred,
                            "Unresolved mentions exceed the per-run cap; remainder deferred"
                        );
                    }

                    let edges = build_edges(&batch, thresholds, name_similarity, &cancel)?;
                    if cancel.is_cancelled() {
                        return Err(Error::Cancelled("refresh grouping".to_string()));
                    }
                    let clusters = cluster_mentions(&batch, &edges);
                    let proposals = propose_groups(&batch, &clusters);
                    debug!(
                        subsystem = "resolution",
                        component = "clustering",
                        op = "refresh_grouping",
                        program_id = %program_id,
                        mention_count = batch.len(),
                        edge_count = edges.len(),
                        cluster_count = clusters.len(),
                        "Clustering complete"
                    );

                    let existing = groups.pending_member_sets_tx(tx, program_id).await?;
                    let mut outcome = GroupingOutcome {
                        mentions_considered: batch.len(),
                        mentions_deferred: deferred,
                        edges: edges.len(),
                        clusters: clusters.len(),
                        ..Default::default()
                    };
                    for proposal in &proposals {
                        if existing.contains(&proposal.member_ids()) {
                            outcome.groups_skipped += 1;
                            continue;
                        }
                        groups.insert_proposed_tx(tx, program_id, proposal).await?;
                        outcome.groups_created += 1;
                    }
                    Ok(outcome)
                })
            })
            .await?;

        info!(
            subsystem = "resolution",
            component = "clustering",
            op = "refresh_grouping",
            program_id = %program_id,
            mention_count = outcome.mentions_considered,
            groups_created = outcome.groups_created,
            groups_skipped = outcome.groups_skipped,
            duration_ms = start.elapsed().as_millis() as u64,
            "Refresh grouping finished"
        );
        Ok(outcome)
    }
}
