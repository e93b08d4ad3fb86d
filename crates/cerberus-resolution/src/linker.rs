//! Stakeholder linking: name lookup and direct mention linking.

use tracing::{debug, info};
use uuid::Uuid;

use cerberus_core::{
    name_similarity, Error, MatchKind, MentionRepository, Result, StakeholderMatch,
    StakeholderName, StakeholderRepository,
};

use crate::engine::IdentityResolutionEngine;

/// Best fuzzy match for `name` scoring strictly above `threshold`.
///
/// Equal scores resolve to the lowest stakeholder id.
pub fn best_stakeholder_match<'a>(
    name: &str,
    candidates: &'a [StakeholderName],
    threshold: f64,
) -> Option<(&'a StakeholderName, f64)> {
    candidates
        .iter()
        .map(|s| (s, name_similarity(name, &s.person_name)))
        .filter(|(_, score)| *score > threshold)
        .fold(None, |best, (s, score)| match best {
            Some((b, best_score))
                if best_score > score
                    || (best_score == score && b.stakeholder_id < s.stakeholder_id) =>
            {
                Some((b, best_score))
            }
            _ => Some((s, score)),
        })
}

impl IdentityResolutionEngine {
    /// Find the stakeholder a person name refers to.
    ///
    /// A case-insensitive exact name match wins outright; otherwise the best
    /// fuzzy match above the configured threshold is returned.
    pub async fn auto_link_by_name(
        &self,
        program_id: Uuid,
        person_name: &str,
    ) -> Result<StakeholderMatch> {
        let name = person_name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("person_name is required".to_string()));
        }
        self.require_program(program_id).await?;

        if let Some(exact) = self
            .db
            .stakeholders
            .find_by_exact_name(program_id, name)
            .await?
        {
            debug!(
                subsystem = "resolution",
                component = "linker",
                op = "auto_link",
                program_id = %program_id,
                stakeholder_id = %exact.stakeholder_id,
                "Exact stakeholder match"
            );
            return Ok(StakeholderMatch {
                stakeholder_id: exact.stakeholder_id,
                person_name: exact.person_name,
                similarity_score: 1.0,
                match_kind: MatchKind::Exact,
            });
        }

        let names = self.db.stakeholders.names(program_id).await?;
        match best_stakeholder_match(name, &names, self.config.stakeholder_match_threshold) {
            Some((found, score)) => {
                debug!(
                    subsystem = "resolution",
                    component = "linker",
                    op = "auto_link",
                    program_id = %program_id,
                    stakeholder_id = %found.stakeholder_id,
                    similarity = score,
                    "Fuzzy stakeholder match"
                );
                Ok(StakeholderMatch {
                    stakeholder_id: found.stakeholder_id,
                    person_name: found.person_name.clone(),
                    similarity_score: score,
                    match_kind: MatchKind::Fuzzy,
                })
            }
            None => Err(Error::NotFound(format!(
                "No stakeholder matching '{}'",
                name
            ))),
        }
    }

    /// Point a mention at a stakeholder, overwriting any earlier link.
    pub async fn link_person(
        &self,
        program_id: Uuid,
        person_id: Uuid,
        stakeholder_id: Uuid,
    ) -> Result<()> {
        self.db
            .mentions
            .link_to_stakeholder(program_id, person_id, stakeholder_id)
            .await?;
        info!(
            subsystem = "resolution",
            component = "linker",
            op = "link_person",
            program_id = %program_id,
            person_id = %person_id,
            stakeholder_id = %stakeholder_id,
            "Person linked to stakeholder"
        );
        Ok(())
    }
}
