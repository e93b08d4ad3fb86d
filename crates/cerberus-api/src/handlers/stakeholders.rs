//! Stakeholder registry handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{ok, parse_id, ApiError, ApiResponse, AppState};
use cerberus_core::{
    parse_engagement_level, parse_stakeholder_type, AutoLinkRequest, CreateStakeholderRequest,
    LinkedArtifact, Stakeholder, StakeholderFilter, StakeholderMatch, UpdateStakeholderRequest,
};

/// Query parameters for listing stakeholders.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListStakeholdersQuery {
    /// internal, external, vendor, partner or customer
    pub stakeholder_type: Option<String>,
    pub is_internal: Option<bool>,
    /// key, primary, secondary or observer
    pub engagement_level: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListStakeholdersQuery {
    fn into_filter(self, program_id: Uuid) -> Result<StakeholderFilter, ApiError> {
        Ok(StakeholderFilter {
            program_id,
            stakeholder_type: self
                .stakeholder_type
                .as_deref()
                .map(parse_stakeholder_type)
                .transpose()?,
            is_internal: self.is_internal,
            engagement_level: self
                .engagement_level
                .as_deref()
                .map(parse_engagement_level)
                .transpose()?,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedStakeholder {
    pub stakeholder_id: Uuid,
}

/// List stakeholders of a program.
///
/// GET /programs/{id}/stakeholders
#[utoipa::path(get, path = "/programs/{id}/stakeholders", tag = "Stakeholders",
    params(("id" = Uuid, Path, description = "Program ID"), ListStakeholdersQuery),
    responses(
        (status = 200, description = "Stakeholders ordered by name", body = [Stakeholder]),
        (status = 400, description = "Invalid filter"),
        (status = 404, description = "Program not found")))]
pub async fn list_stakeholders(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<ListStakeholdersQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Stakeholder>>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let Query(query) = query?;
    let filter = query.into_filter(program_id)?;
    let stakeholders = state.engine.list_stakeholders(&filter).await?;
    Ok(ok(stakeholders))
}

/// Create a stakeholder.
///
/// POST /programs/{id}/stakeholders
#[utoipa::path(post, path = "/programs/{id}/stakeholders", tag = "Stakeholders",
    params(("id" = Uuid, Path, description = "Program ID")),
    request_body = CreateStakeholderRequest,
    responses(
        (status = 201, description = "Created", body = Stakeholder),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Program not found")))]
pub async fn create_stakeholder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CreateStakeholderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Stakeholder>>), ApiError> {
    let program_id = parse_id(&id, "program")?;
    let Json(req) = payload?;
    let stakeholder = state.engine.create_stakeholder(program_id, &req).await?;
    Ok((StatusCode::CREATED, ok(stakeholder)))
}

/// Get a stakeholder.
///
/// GET /programs/{id}/stakeholders/{stakeholder_id}
#[utoipa::path(get, path = "/programs/{id}/stakeholders/{stakeholder_id}", tag = "Stakeholders",
    params(
        ("id" = Uuid, Path, description = "Program ID"),
        ("stakeholder_id" = Uuid, Path, description = "Stakeholder ID")),
    responses(
        (status = 200, description = "Stakeholder", body = Stakeholder),
        (status = 404, description = "Stakeholder not found")))]
pub async fn get_stakeholder(
    State(state): State<AppState>,
    Path((id, stakeholder_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Stakeholder>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let stakeholder_id = parse_id(&stakeholder_id, "stakeholder")?;
    let stakeholder = state
        .engine
        .get_stakeholder(program_id, stakeholder_id)
        .await?;
    Ok(ok(stakeholder))
}

/// Partially update a stakeholder.
///
/// PUT /programs/{id}/stakeholders/{stakeholder_id}
#[utoipa::path(put, path = "/programs/{id}/stakeholders/{stakeholder_id}", tag = "Stakeholders",
    params(
        ("id" = Uuid, Path, description = "Program ID"),
        ("stakeholder_id" = Uuid, Path, description = "Stakeholder ID")),
    request_body = UpdateStakeholderRequest,
    responses(
        (status = 200, description = "Updated", body = Stakeholder),
        (status = 400, description = "No fields to update or invalid value"),
        (status = 404, description = "Stakeholder not found")))]
pub async fn update_stakeholder(
    State(state): State<AppState>,
    Path((id, stakeholder_id)): Path<(String, String)>,
    payload: Result<Json<UpdateStakeholderRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Stakeholder>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let stakeholder_id = parse_id(&stakeholder_id, "stakeholder")?;
    let Json(req) = payload?;
    let stakeholder = state
        .engine
        .update_stakeholder(program_id, stakeholder_id, &req)
        .await?;
    Ok(ok(stakeholder))
}

/// Soft-delete a stakeholder.
///
/// DELETE /programs/{id}/stakeholders/{stakeholder_id}
#[utoipa::path(delete, path = "/programs/{id}/stakeholders/{stakeholder_id}", tag = "Stakeholders",
    params(
        ("id" = Uuid, Path, description = "Program ID"),
        ("stakeholder_id" = Uuid, Path, description = "Stakeholder ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Stakeholder not found")))]
pub async fn delete_stakeholder(
    State(state): State<AppState>,
    Path((id, stakeholder_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<DeletedStakeholder>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let stakeholder_id = parse_id(&stakeholder_id, "stakeholder")?;
    state
        .engine
        .delete_stakeholder(program_id, stakeholder_id)
        .await?;
    Ok(ok(DeletedStakeholder { stakeholder_id }))
}

/// Artifacts mentioning a stakeholder through linked persons.
///
/// GET /programs/{id}/stakeholders/{stakeholder_id}/artifacts
#[utoipa::path(get, path = "/programs/{id}/stakeholders/{stakeholder_id}/artifacts", tag = "Stakeholders",
    params(
        ("id" = Uuid, Path, description = "Program ID"),
        ("stakeholder_id" = Uuid, Path, description = "Stakeholder ID")),
    responses(
        (status = 200, description = "Linked artifacts, newest first", body = [LinkedArtifact]),
        (status = 404, description = "Stakeholder not found")))]
pub async fn stakeholder_artifacts(
    State(state): State<AppState>,
    Path((id, stakeholder_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<LinkedArtifact>>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let stakeholder_id = parse_id(&stakeholder_id, "stakeholder")?;
    let artifacts = state
        .engine
        .stakeholder_artifacts(program_id, stakeholder_id)
        .await?;
    Ok(ok(artifacts))
}

/// Find the stakeholder a person name refers to.
///
/// POST /programs/{id}/stakeholders/auto-link
#[utoipa::path(post, path = "/programs/{id}/stakeholders/auto-link", tag = "Stakeholders",
    params(("id" = Uuid, Path, description = "Program ID")),
    request_body = AutoLinkRequest,
    responses(
        (status = 200, description = "Matching stakeholder", body = StakeholderMatch),
        (status = 400, description = "Missing person_name"),
        (status = 404, description = "No matching stakeholder")))]
pub async fn auto_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AutoLinkRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<StakeholderMatch>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let Json(req) = payload?;
    let found = state
        .engine
        .auto_link_by_name(program_id, &req.person_name)
        .await?;
    Ok(ok(found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerberus_core::{EngagementLevel, StakeholderType};

    #[test]
    fn test_query_into_filter() {
        let program_id = Uuid::new_v4();
        let filter = ListStakeholdersQuery {
            stakeholder_type: Some("Vendor".to_string()),
            engagement_level: Some("key".to_string()),
            limit: Some(10),
            ..Default::default()
        }
        .into_filter(program_id)
        .unwrap();
        assert_eq!(filter.program_id, program_id);
        assert_eq!(filter.stakeholder_type, Some(StakeholderType::Vendor));
        assert_eq!(filter.engagement_level, Some(EngagementLevel::Key));
        assert_eq!(filter.limit, Some(10));
    }

    #[test]
    fn test_query_rejects_unknown_type() {
        let result = ListStakeholdersQuery {
            stakeholder_type: Some("contractor".to_string()),
            ..Default::default()
        }
        .into_filter(Uuid::new_v4());
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
