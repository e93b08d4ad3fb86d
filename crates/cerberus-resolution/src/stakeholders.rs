//! Stakeholder registry operations exposed through the engine.

use uuid::Uuid;

use cerberus_core::{
    CreateStakeholderRequest, LinkedArtifact, Result, Stakeholder, StakeholderFilter,
    StakeholderRepository, UpdateStakeholderRequest,
};

use crate::engine::IdentityResolutionEngine;

impl IdentityResolutionEngine {
    pub async fn create_stakeholder(
        &self,
        program_id: Uuid,
        req: &CreateStakeholderRequest,
    ) -> Result<Stakeholder> {
        self.require_program(program_id).await?;
        self.db.stakeholders.create(program_id, req).await
    }

    pub async fn get_stakeholder(&self, program_id: Uuid, stakeholder_id: Uuid) -> Result<Stakeholder> {
        self.db.stakeholders.get(program_id, stakeholder_id).await
    }

    pub async fn list_stakeholders(&self, filter: &StakeholderFilter) -> Result<Vec<Stakeholder>> {
        self.require_program(filter.program_id).await?;
        self.db.stakeholders.list(filter).await
    }

    pub async fn update_stakeholder(
        &self,
        program_id: Uuid,
        stakeholder_id: Uuid,
        req: &UpdateStakeholderRequest,
    ) -> Result<Stakeholder> {
        self.db
            .stakeholders
            .update(program_id, stakeholder_id, req)
            .await
    }

    pub async fn delete_stakeholder(&self, program_id: Uuid, stakeholder_id: Uuid) -> Result<()> {
        self.db.stakeholders.delete(program_id, stakeholder_id).await
    }

    /// Artifacts whose mentions are linked to the stakeholder, newest first.
    pub async fn stakeholder_artifacts(
        &self,
        program_id: Uuid,
        stakeholder_id: Uuid,
    ) -> Result<Vec<LinkedArtifact>> {
        self.db
            .stakeholders
            .linked_artifacts(program_id, stakeholder_id)
            .await
    }
}
