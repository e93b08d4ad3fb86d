//! # cerberus-api
//!
//! HTTP surface of cerberus identity resolution.
//!
//! Every response is an envelope: `{"success": true, "data": ...}` on
//! success and `{"success": false, "error": "..."}` on failure.

pub mod handlers;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use cerberus_db::Database;
use cerberus_resolution::IdentityResolutionEngine;

/// Origins allowed when `ALLOWED_ORIGINS` is unset or blank.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

// =============================================================================
// STATE
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: IdentityResolutionEngine,
}

impl AppState {
    pub fn new(engine: IdentityResolutionEngine) -> Self {
        Self {
            db: engine.database().clone(),
            engine,
        }
    }
}

// =============================================================================
// RESPONSE ENVELOPE
// =============================================================================

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Wrap `data` in a success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Internal(cerberus_core::Error),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Timeout(String),
}

impl From<cerberus_core::Error> for ApiError {
    fn from(err: cerberus_core::Error) -> Self {
        use cerberus_core::Error;
        match err {
            Error::NotFound(_)
            | Error::ProgramNotFound(_)
            | Error::MergeGroupNotFound(_)
            | Error::MentionNotFound(_)
            | Error::StakeholderNotFound(_) => ApiError::NotFound(err.to_string()),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            Error::Cancelled(_) => ApiError::Timeout(err.to_string()),
            _ => ApiError::Internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                err.to_string()
            }
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Timeout(msg) => msg,
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Parse a path identifier, reporting `Invalid <label> ID` on failure.
pub fn parse_id(raw: &str, label: &str) -> Result<Uuid, ApiError> {
    raw.parse::<Uuid>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} ID", label)))
}

// =============================================================================
// CORS
// =============================================================================

/// Parse a comma-separated origin list. Invalid entries are skipped; a blank
/// list falls back to [`DEFAULT_ALLOWED_ORIGINS`].
pub fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    let source = if raw.trim().is_empty() {
        DEFAULT_ALLOWED_ORIGINS
    } else {
        raw
    };

    source
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

fn cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

// =============================================================================
// OPENAPI
// =============================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cerberus Identity Resolution API",
        version = "2026.10.1",
        description = "Person mention clustering, merge review and stakeholder resolution"
    ),
    paths(
        handlers::system::health_check,
        handlers::suggestions::get_suggestions,
        handlers::suggestions::get_grouped_suggestions,
        handlers::suggestions::refresh_grouping,
        handlers::suggestions::confirm_group,
        handlers::suggestions::reject_group,
        handlers::suggestions::modify_group_members,
        handlers::suggestions::link_person,
        handlers::stakeholders::list_stakeholders,
        handlers::stakeholders::create_stakeholder,
        handlers::stakeholders::get_stakeholder,
        handlers::stakeholders::update_stakeholder,
        handlers::stakeholders::delete_stakeholder,
        handlers::stakeholders::stakeholder_artifacts,
        handlers::stakeholders::auto_link,
    ),
    components(schemas(
        cerberus_core::PersonSuggestion,
        cerberus_core::SuggestionArtifact,
        cerberus_core::GroupedSuggestion,
        cerberus_core::GroupMemberDetail,
        cerberus_core::MentionContext,
        cerberus_core::ConflictOption,
        cerberus_core::MergeGroup,
        cerberus_core::MergeGroupStatus,
        cerberus_core::MatchingMethod,
        cerberus_core::GroupingOutcome,
        cerberus_core::ConfirmMergeRequest,
        cerberus_core::ConfirmOutcome,
        cerberus_core::ModifyMembersRequest,
        cerberus_core::LinkPersonRequest,
        cerberus_core::AutoLinkRequest,
        cerberus_core::StakeholderMatch,
        cerberus_core::MatchKind,
        cerberus_core::Stakeholder,
        cerberus_core::StakeholderType,
        cerberus_core::EngagementLevel,
        cerberus_core::CreateStakeholderRequest,
        cerberus_core::UpdateStakeholderRequest,
        cerberus_core::LinkedArtifact,
    )),
    tags(
        (name = "Suggestions", description = "Identity suggestions and the merge workflow"),
        (name = "Stakeholders", description = "Stakeholder registry"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router with CORS restricted to `allowed_origins`.
pub fn router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    use handlers::{stakeholders, suggestions, system};

    Router::new()
        .route("/health", get(system::health_check))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        // Suggestions and merge workflow
        .route(
            "/programs/:id/stakeholders/suggestions",
            get(suggestions::get_suggestions),
        )
        .route(
            "/programs/:id/stakeholders/suggestions/grouped",
            get(suggestions::get_grouped_suggestions),
        )
        .route(
            "/programs/:id/stakeholders/suggestions/refresh-grouping",
            post(suggestions::refresh_grouping),
        )
        .route(
            "/programs/:id/stakeholders/suggestions/groups/:group_id/confirm",
            post(suggestions::confirm_group),
        )
        .route(
            "/programs/:id/stakeholders/suggestions/groups/:group_id/reject",
            post(suggestions::reject_group),
        )
        .route(
            "/programs/:id/stakeholders/suggestions/groups/:group_id/members",
            post(suggestions::modify_group_members),
        )
        .route(
            "/programs/:id/persons/:person_id/link",
            post(suggestions::link_person),
        )
        // Stakeholder registry
        .route(
            "/programs/:id/stakeholders",
            get(stakeholders::list_stakeholders).post(stakeholders::create_stakeholder),
        )
        .route(
            "/programs/:id/stakeholders/auto-link",
            post(stakeholders::auto_link),
        )
        .route(
            "/programs/:id/stakeholders/:stakeholder_id",
            get(stakeholders::get_stakeholder)
                .put(stakeholders::update_stakeholder)
                .delete(stakeholders::delete_stakeholder),
        )
        .route(
            "/programs/:id/stakeholders/:stakeholder_id/artifacts",
            get(stakeholders::stakeholder_artifacts),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}
