//! Read-side suggestion queries for the review UI.

use tracing::debug;
use uuid::Uuid;

use cerberus_core::defaults;
use cerberus_core::{
    GroupedSuggestion, InternalOrgAliases, MentionRepository, MergeGroupRepository,
    PersonSuggestion, ProgramRepository, Result, StakeholderName, StakeholderRepository,
    SuggestionCandidate,
};

use crate::engine::IdentityResolutionEngine;
use crate::linker::best_stakeholder_match;

/// Annotate a candidate with its nearest stakeholder and suggested classification.
pub fn annotate(
    candidate: SuggestionCandidate,
    stakeholders: &[StakeholderName],
    aliases: &InternalOrgAliases,
    threshold: f64,
) -> PersonSuggestion {
    let nearest = best_stakeholder_match(&candidate.person_name, stakeholders, threshold)
        .map(|(s, score)| (s.stakeholder_id, score));
    let classification = aliases.classify(candidate.person_organization.as_deref());

    PersonSuggestion {
        person_id: candidate.person_id,
        person_name: candidate.person_name,
        person_role: candidate.person_role,
        person_organization: candidate.person_organization,
        confidence_score: candidate.confidence_score,
        artifact_count: candidate.artifact_count,
        total_mentions: candidate.total_mentions,
        last_mentioned: candidate.last_mentioned,
        suggested_stakeholder_id: nearest.map(|(id, _)| id),
        similarity_score: nearest.map(|(_, score)| score).unwrap_or(0.0),
        suggested_stakeholder_type: classification.stakeholder_type(),
        suggested_is_internal: classification.is_internal(),
        artifacts: candidate.artifacts,
    }
}

impl IdentityResolutionEngine {
    /// Every unresolved mention of the program with stakeholder hints.
    pub async fn get_suggestions(&self, program_id: Uuid) -> Result<Vec<PersonSuggestion>> {
        self.require_program(program_id).await?;

        let candidates = self
            .db
            .mentions
            .suggestion_candidates(program_id, defaults::SUGGESTION_ARTIFACT_LIMIT)
            .await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let (stakeholders, aliases) = tokio::try_join!(
            self.db.stakeholders.names(program_id),
            self.db.programs.internal_aliases(program_id),
        )?;

        let threshold = self.config.stakeholder_match_threshold;
        let suggestions: Vec<PersonSuggestion> = candidates
            .into_iter()
            .map(|c| annotate(c, &stakeholders, &aliases, threshold))
            .collect();

        debug!(
            subsystem = "resolution",
            component = "suggestions",
            op = "get_suggestions",
            program_id = %program_id,
            result_count = suggestions.len(),
            "Individual suggestions computed"
        );
        Ok(suggestions)
    }

    /// Pending merge groups with members, conflict options and context snippets.
    pub async fn get_grouped_suggestions(
        &self,
        program_id: Uuid,
    ) -> Result<Vec<GroupedSuggestion>> {
        self.require_program(program_id).await?;
        self.db.merge_groups.grouped_suggestions(program_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cerberus_core::StakeholderType;

    fn candidate(name: &str, organization: Option<&str>) -> SuggestionCandidate {
        SuggestionCandidate {
            person_id: Uuid::new_v4(),
            person_name: name.to_string(),
            person_role: None,
            person_organization: organization.map(str::to_string),
            confidence_score: Some(0.9),
            artifact_count: 1,
            total_mentions: 2,
            last_mentioned: Utc::now(),
            artifacts: Vec::new(),
        }
    }

    #[test]
    fn test_annotate_with_match_and_internal_org() {
        let stakeholder_id = Uuid::new_v4();
        let stakeholders = vec![StakeholderName {
            stakeholder_id,
            person_name: "Jane Doe".to_string(),
        }];
        let aliases = InternalOrgAliases::parse("Acme Corp, ACME");

        let s = annotate(candidate("Jane Doe", Some("acme")), &stakeholders, &aliases, 0.6);
        assert_eq!(s.suggested_stakeholder_id, Some(stakeholder_id));
        assert_eq!(s.similarity_score, 1.0);
        assert!(s.suggested_is_internal);
        assert_eq!(s.suggested_stakeholder_type, StakeholderType::Internal);
        assert_eq!(s.total_mentions, 2);
    }

    #[test]
    fn test_annotate_without_match_is_external() {
        let aliases = InternalOrgAliases::parse("Acme");
        let s = annotate(candidate("Ada Lovelace", Some("Globex")), &[], &aliases, 0.6);
        assert_eq!(s.suggested_stakeholder_id, None);
        assert_eq!(s.similarity_score, 0.0);
        assert!(!s.suggested_is_internal);
        assert_eq!(s.suggested_stakeholder_type, StakeholderType::External);
    }

    #[test]
    fn test_annotate_missing_org_is_internal() {
        let s = annotate(
            candidate("Ada Lovelace", None),
            &[],
            &InternalOrgAliases::default(),
            0.6,
        );
        assert!(s.suggested_is_internal);
    }
}
