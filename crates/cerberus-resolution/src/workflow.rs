//! Merge workflow: confirm, reject and membership edits of a pending group.
//!
//! Each operation locks the group row, checks that it is still `pending`, and
//! applies all of its writes in one transaction.

use tracing::info;
use uuid::Uuid;

use cerberus_core::conflicts::{self, MemberAttributes};
use cerberus_core::defaults;
use cerberus_core::{
    ConfirmMergeRequest, ConfirmOutcome, CreateStakeholderRequest, Error, MatchingMethod,
    MergeGroup, MergeGroupStatus, ModifyMembersRequest, Result,
};
use cerberus_db::GroupResolution;

use crate::engine::IdentityResolutionEngine;

/// Only pending groups accept workflow actions.
pub fn ensure_pending(group: &MergeGroup, action: &str) -> Result<()> {
    if group.status == MergeGroupStatus::Pending {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            group_id: group.group_id,
            from: group.status.to_string(),
            to: action.to_string(),
        })
    }
}

/// Trim an optional value, treating blank as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Sorted, de-duplicated copy of `ids`.
fn unique_sorted(ids: &[Uuid]) -> Vec<Uuid> {
    let mut out = ids.to_vec();
    out.sort();
    out.dedup();
    out
}

impl IdentityResolutionEngine {
    /// Confirm a pending group, optionally creating a stakeholder for it.
    ///
    /// With `create_stakeholder` the new stakeholder is classified against the
    /// program's internal-organization aliases, every member mention is linked
    /// to it, and the group becomes `merged`. Otherwise the group only records
    /// the chosen values and becomes `confirmed`.
    pub async fn confirm(
        &self,
        program_id: Uuid,
        group_id: Uuid,
        req: ConfirmMergeRequest,
    ) -> Result<ConfirmOutcome> {
        let name = req.selected_name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidInput("selected_name is required".to_string()));
        }
        let role = non_blank(req.selected_role);
        let organization = non_blank(req.selected_organization);
        let create_stakeholder = req.create_stakeholder;

        let programs = self.db.programs.clone();
        let mentions = self.db.mentions.clone();
        let stakeholders = self.db.stakeholders.clone();
        let groups = self.db.merge_groups.clone();

        let outcome = self
            .db
            .tx()
            .execute(move |tx| {
                Box::pin(async move {
                    let group = groups.lock_tx(tx, program_id, group_id).await?;
                    ensure_pending(&group, "confirm")?;

                    let mut stakeholder = None;
                    let mut linked_persons = 0;
                    let status = if create_stakeholder {
                        let aliases = programs.internal_aliases_tx(tx, program_id).await?;
                        let classification = aliases.classify(organization.as_deref());
                        let created = stakeholders
                            .create_tx(
                                tx,
                                program_id,
                                &CreateStakeholderRequest {
                                    person_name: name.clone(),
                                    stakeholder_type: classification
                                        .stakeholder_type()
                                        .as_str()
                                        .to_string(),
                                    is_internal: classification.is_internal(),
                                    role: role.clone(),
                                    organization: organization.clone(),
                                    ..Default::default()
                                },
                            )
                            .await?;
                        linked_persons = mentions
                            .link_group_members_tx(tx, group_id, created.stakeholder_id)
                            .await?;
                        stakeholder = Some(created);
                        MergeGroupStatus::Merged
                    } else {
                        MergeGroupStatus::Confirmed
                    };

                    groups
                        .resolve_tx(
                            tx,
                            group_id,
                            &GroupResolution {
                                status,
                                name: &name,
                                role: role.as_deref(),
                                organization: organization.as_deref(),
                                stakeholder_id: stakeholder.as_ref().map(|s| s.stakeholder_id),
                            },
                        )
                        .await?;

                    Ok(ConfirmOutcome {
                        group_id,
                        status,
                        stakeholder,
                        linked_persons,
                    })
                })
            })
            .await?;

        info!(
            subsystem = "resolution",
            component = "merge_workflow",
            op = "confirm",
            program_id = %program_id,
            group_id = %group_id,
            status = %outcome.status,
            linked_persons = outcome.linked_persons,
            "Merge group confirmed"
        );
        Ok(outcome)
    }

    /// Reject a pending group. Member mentions stay unresolved.
    pub async fn reject(&self, program_id: Uuid, group_id: Uuid) -> Result<MergeGroup> {
        let groups = self.db.merge_groups.clone();
        let group = self
            .db
            .tx()
            .execute(move |tx| {
                Box::pin(async move {
                    let group = groups.lock_tx(tx, program_id, group_id).await?;
                    ensure_pending(&group, "reject")?;
                    groups
                        .set_status_tx(tx, group_id, MergeGroupStatus::Rejected)
                        .await
                })
            })
            .await?;

        info!(
            subsystem = "resolution",
            component = "merge_workflow",
            op = "reject",
            program_id = %program_id,
            group_id = %group_id,
            "Merge group rejected"
        );
        Ok(group)
    }

    /// Remove and then add members of a pending group.
    ///
    /// Added members are recorded as `manual` with a fixed score. The suggested
    /// name and conflict flags are recomputed from the resulting membership,
    /// which must still hold at least two mentions.
    pub async fn modify_members(
        &self,
        program_id: Uuid,
        group_id: Uuid,
        req: ModifyMembersRequest,
    ) -> Result<MergeGroup> {
        if req.add_person_ids.is_empty() && req.remove_person_ids.is_empty() {
            return Err(Error::InvalidInput(
                "add_person_ids or remove_person_ids is required".to_string(),
            ));
        }
        let add = unique_sorted(&req.add_person_ids);
        let remove = unique_sorted(&req.remove_person_ids);

        let mentions = self.db.mentions.clone();
        let groups = self.db.merge_groups.clone();

        let group = self
            .db
            .tx()
            .execute(move |tx| {
                Box::pin(async move {
                    let group = groups.lock_tx(tx, program_id, group_id).await?;
                    ensure_pending(&group, "modify members")?;

                    let found = mentions.get_many_tx(tx, program_id, &add).await?;
                    if let Some(missing) = add
                        .iter()
                        .find(|id| !found.iter().any(|m| m.person_id == **id))
                    {
                        return Err(Error::MentionNotFound(*missing));
                    }

                    groups.remove_members_tx(tx, group_id, &remove).await?;
                    groups
                        .add_members_tx(
                            tx,
                            group_id,
                            &add,
                            defaults::MANUAL_MEMBER_SCORE,
                            MatchingMethod::Manual,
                        )
                        .await?;

                    let member_ids = groups.member_ids_tx(tx, group_id).await?;
                    if member_ids.len() < defaults::MIN_GROUP_SIZE {
                        return Err(Error::InvalidInput(format!(
                            "a merge group needs at least {} members",
                            defaults::MIN_GROUP_SIZE
                        )));
                    }

                    let members = mentions.get_many_tx(tx, program_id, &member_ids).await?;
                    let analysis = conflicts::analyze(members.iter().map(MemberAttributes::from))
                        .ok_or_else(|| {
                            Error::Internal(format!("merge group {} has no members", group_id))
                        })?;
                    groups
                        .update_analysis_tx(
                            tx,
                            group_id,
                            &analysis.suggested_name,
                            analysis.has_role_conflicts,
                            analysis.has_org_conflicts,
                        )
                        .await
                })
            })
            .await?;

        info!(
            subsystem = "resolution",
            component = "merge_workflow",
            op = "modify_members",
            program_id = %program_id,
            group_id = %group_id,
            has_role_conflicts = group.has_role_conflicts,
            has_org_conflicts = group.has_org_conflicts,
            "Merge group membership updated"
        );
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn group(status: MergeGroupStatus) -> MergeGroup {
        MergeGroup {
            group_id: Uuid::new_v4(),
            program_id: Uuid::new_v4(),
            suggested_name: "Jon Smith".to_string(),
            status,
            has_role_conflicts: false,
            has_org_conflicts: false,
            resolved_name: None,
            resolved_role: None,
            resolved_organization: None,
            merged_stakeholder_id: None,
            merged_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pending_group_accepts_actions() {
        assert!(ensure_pending(&group(MergeGroupStatus::Pending), "confirm").is_ok());
    }

    #[test]
    fn test_terminal_groups_reject_actions() {
        for status in [
            MergeGroupStatus::Confirmed,
            MergeGroupStatus::Merged,
            MergeGroupStatus::Rejected,
        ] {
            let g = group(status);
            let err = ensure_pending(&g, "confirm").unwrap_err();
            match err {
                Error::InvalidTransition { group_id, from, to } => {
                    assert_eq!(group_id, g.group_id);
                    assert_eq!(from, status.to_string());
                    assert_eq!(to, "confirm");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_non_blank_trims_and_drops_empty() {
        assert_eq!(non_blank(Some("  Acme ".to_string())), Some("Acme".to_string()));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_unique_sorted() {
        let a = Uuid::from_u128(2);
        let b = Uuid::from_u128(1);
        assert_eq!(unique_sorted(&[a, b, a]), vec![b, a]);
    }
}
