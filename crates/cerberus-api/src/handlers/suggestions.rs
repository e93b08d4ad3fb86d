//! Suggestion retrieval and merge workflow handlers.
//!
//! Paths live under `/programs/{id}/stakeholders/suggestions`, plus the
//! direct person link at `/programs/{id}/persons/{person_id}/link`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{ok, parse_id, ApiError, ApiResponse, AppState};
use cerberus_core::{
    ConfirmMergeRequest, ConfirmOutcome, GroupedSuggestion, GroupingOutcome, LinkPersonRequest,
    MergeGroup, ModifyMembersRequest, PersonSuggestion,
};

/// Result of a direct person link.
#[derive(Debug, Serialize)]
pub struct PersonLink {
    pub person_id: Uuid,
    pub stakeholder_id: Uuid,
}

/// List unresolved person mentions with stakeholder hints.
///
/// GET /programs/{id}/stakeholders/suggestions
#[utoipa::path(get, path = "/programs/{id}/stakeholders/suggestions", tag = "Suggestions",
    params(("id" = Uuid, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Individual suggestions", body = [PersonSuggestion]),
        (status = 404, description = "Program not found")))]
pub async fn get_suggestions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<PersonSuggestion>>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let suggestions = state.engine.get_suggestions(program_id).await?;
    Ok(ok(suggestions))
}

/// List pending merge groups with members, conflicts and context.
///
/// GET /programs/{id}/stakeholders/suggestions/grouped
#[utoipa::path(get, path = "/programs/{id}/stakeholders/suggestions/grouped", tag = "Suggestions",
    params(("id" = Uuid, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Pending merge groups", body = [GroupedSuggestion]),
        (status = 404, description = "Program not found")))]
pub async fn get_grouped_suggestions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<GroupedSuggestion>>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let groups = state.engine.get_grouped_suggestions(program_id).await?;
    Ok(ok(groups))
}

/// Re-run clustering over the program's unresolved mentions.
///
/// The run continues on its own task; dropping the request cancels it and
/// rolls back its writes.
///
/// POST /programs/{id}/stakeholders/suggestions/refresh-grouping
#[utoipa::path(post, path = "/programs/{id}/stakeholders/suggestions/refresh-grouping", tag = "Suggestions",
    params(("id" = Uuid, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Grouping refreshed", body = GroupingOutcome),
        (status = 404, description = "Program not found")))]
pub async fn refresh_grouping(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<GroupingOutcome>>, ApiError> {
    let program_id = parse_id(&id, "program")?;

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let engine = state.engine.clone();
    let task =
        tokio::spawn(async move { engine.refresh_grouping(program_id, &cancel).await });

    let outcome = task.await.map_err(|e| {
        ApiError::Internal(cerberus_core::Error::Internal(format!(
            "refresh grouping task failed: {}",
            e
        )))
    })??;
    Ok(ok(outcome))
}

/// Confirm a pending merge group.
///
/// POST /programs/{id}/stakeholders/suggestions/groups/{group_id}/confirm
#[utoipa::path(post, path = "/programs/{id}/stakeholders/suggestions/groups/{group_id}/confirm", tag = "Suggestions",
    params(
        ("id" = Uuid, Path, description = "Program ID"),
        ("group_id" = Uuid, Path, description = "Merge group ID")),
    request_body = ConfirmMergeRequest,
    responses(
        (status = 200, description = "Group confirmed", body = ConfirmOutcome),
        (status = 400, description = "Missing selected_name"),
        (status = 404, description = "Group not found"),
        (status = 409, description = "Group is no longer pending")))]
pub async fn confirm_group(
    State(state): State<AppState>,
    Path((id, group_id)): Path<(String, String)>,
    payload: Result<Json<ConfirmMergeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ConfirmOutcome>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let group_id = parse_id(&group_id, "group")?;
    let Json(req) = payload?;
    let outcome = state.engine.confirm(program_id, group_id, req).await?;
    Ok(ok(outcome))
}

/// Reject a pending merge group.
///
/// POST /programs/{id}/stakeholders/suggestions/groups/{group_id}/reject
#[utoipa::path(post, path = "/programs/{id}/stakeholders/suggestions/groups/{group_id}/reject", tag = "Suggestions",
    params(
        ("id" = Uuid, Path, description = "Program ID"),
        ("group_id" = Uuid, Path, description = "Merge group ID")),
    responses(
        (status = 200, description = "Group rejected", body = MergeGroup),
        (status = 404, description = "Group not found"),
        (status = 409, description = "Group is no longer pending")))]
pub async fn reject_group(
    State(state): State<AppState>,
    Path((id, group_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<MergeGroup>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let group_id = parse_id(&group_id, "group")?;
    let group = state.engine.reject(program_id, group_id).await?;
    Ok(ok(group))
}

/// Add and remove members of a pending merge group.
///
/// POST /programs/{id}/stakeholders/suggestions/groups/{group_id}/members
#[utoipa::path(post, path = "/programs/{id}/stakeholders/suggestions/groups/{group_id}/members", tag = "Suggestions",
    params(
        ("id" = Uuid, Path, description = "Program ID"),
        ("group_id" = Uuid, Path, description = "Merge group ID")),
    request_body = ModifyMembersRequest,
    responses(
        (status = 200, description = "Membership updated", body = MergeGroup),
        (status = 400, description = "Empty edit or too few members left"),
        (status = 404, description = "Group or person not found"),
        (status = 409, description = "Group is no longer pending")))]
pub async fn modify_group_members(
    State(state): State<AppState>,
    Path((id, group_id)): Path<(String, String)>,
    payload: Result<Json<ModifyMembersRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MergeGroup>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let group_id = parse_id(&group_id, "group")?;
    let Json(req) = payload?;
    let group = state.engine.modify_members(program_id, group_id, req).await?;
    Ok(ok(group))
}

/// Link a person mention to an existing stakeholder.
///
/// POST /programs/{id}/persons/{person_id}/link
#[utoipa::path(post, path = "/programs/{id}/persons/{person_id}/link", tag = "Suggestions",
    params(
        ("id" = Uuid, Path, description = "Program ID"),
        ("person_id" = Uuid, Path, description = "Person mention ID")),
    request_body = LinkPersonRequest,
    responses(
        (status = 200, description = "Person linked"),
        (status = 404, description = "Person or stakeholder not found")))]
pub async fn link_person(
    State(state): State<AppState>,
    Path((id, person_id)): Path<(String, String)>,
    payload: Result<Json<LinkPersonRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PersonLink>>, ApiError> {
    let program_id = parse_id(&id, "program")?;
    let person_id = parse_id(&person_id, "person")?;
    let Json(req) = payload?;
    state
        .engine
        .link_person(program_id, person_id, req.stakeholder_id)
        .await?;
    Ok(ok(PersonLink {
        person_id,
        stakeholder_id: req.stakeholder_id,
    }))
}
