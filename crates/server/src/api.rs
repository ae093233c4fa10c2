//! JSON API for roles, settings, projects and quotes.
//!
//! Endpoints (all under `/api/v1`):
//! - `GET  /roles`, `POST /roles`, `PUT /roles/{id}`, `DELETE /roles/{id}`
//! - `GET  /config`, `POST /config`
//! - `GET  /projects`, `POST /projects`, `PUT /projects/{id}`
//! - `POST /projects/{id}/finalize`
//! - `POST /quotes`, `GET /quotes/{id}`, `PUT /quotes/{id}/financials`
//! - `GET  /quotes/{id}/document`
//! - `POST /quotes/{id}/items`, `PUT /quotes/items/{item_id}`, `DELETE /quotes/items/{item_id}`
//! - `POST /quotes/{id}/generate-scope`

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use cotiza_agent::{ScopeGenerator, ScopeProvider};
use cotiza_core::domain::line_item::{LineItem, LineItemId, LineItemInput};
use cotiza_core::domain::project::{NewProject, Project, ProjectId};
use cotiza_core::domain::quote::{FinancialParameters, NewQuote, Quote, QuoteId};
use cotiza_core::domain::role::{NewRole, Role, RoleId};
use cotiza_core::domain::setting::Setting;
use cotiza_core::errors::{ApplicationError, InterfaceError};
use cotiza_db::{
    ProjectService, QuoteAggregator, QuoteService, QuoteView, Repositories, RoleService,
    SettingsService,
};

use crate::document::QuoteDocument;

#[derive(Clone)]
pub struct ApiState {
    roles: RoleService,
    projects: ProjectService,
    quotes: QuoteService,
    settings: SettingsService,
    aggregator: Arc<QuoteAggregator>,
    scope: Arc<ScopeGenerator>,
    documents: Arc<QuoteDocument>,
}

impl ApiState {
    pub fn new(
        repos: Repositories,
        provider: Arc<dyn ScopeProvider>,
        documents: QuoteDocument,
    ) -> Self {
        Self {
            roles: RoleService::new(repos.clone()),
            projects: ProjectService::new(repos.clone()),
            quotes: QuoteService::new(repos.clone()),
            settings: SettingsService::new(repos.clone()),
            aggregator: Arc::new(QuoteAggregator::new(repos.clone())),
            scope: Arc::new(ScopeGenerator::new(repos, provider)),
            documents: Arc::new(documents),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FinancialsRequest {
    pub applied_margin: Decimal,
    pub applied_risk: Decimal,
    pub applied_tax: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct GenerateScopeRequest {
    pub requirements: String,
    pub role_ids: Vec<RoleId>,
}

#[derive(Debug, Serialize)]
pub struct Banner {
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

/// Application failure carried to the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error.into_interface(Uuid::new_v4().to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
            InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message.clone()),
            InterfaceError::ServiceUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, self.0.user_message().to_string())
            }
            InterfaceError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.user_message().to_string())
            }
        };

        if status.is_server_error() {
            error!(
                event_name = "api.request.failed",
                correlation_id = %self.0.correlation_id(),
                error = %self.0.message(),
                status = status.as_u16(),
                "request failed"
            );
        } else {
            warn!(
                event_name = "api.request.rejected",
                correlation_id = %self.0.correlation_id(),
                error = %self.0.message(),
                status = status.as_u16(),
                "request rejected"
            );
        }

        let body = ErrorBody { error, correlation_id: self.0.correlation_id().to_string() };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    let api = Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route("/roles/{id}", put(update_role).delete(delete_role))
        .route("/config", get(list_settings).post(upsert_setting))
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/{id}", put(update_project))
        .route("/projects/{id}/finalize", post(finalize_project))
        .route("/quotes", post(create_quote))
        .route("/quotes/{id}", get(get_quote))
        .route("/quotes/{id}/financials", put(update_financials))
        .route("/quotes/{id}/document", get(quote_document))
        .route("/quotes/{id}/items", post(add_item))
        .route("/quotes/items/{item_id}", put(update_item).delete(delete_item))
        .route("/quotes/{id}/generate-scope", post(generate_scope));

    Router::new().route("/", get(banner)).nest("/api/v1", api).with_state(state)
}

async fn banner() -> Json<Banner> {
    Json(Banner { service: "cotiza", version: env!("CARGO_PKG_VERSION") })
}

async fn list_roles(State(state): State<ApiState>) -> ApiResult<Json<Vec<Role>>> {
    Ok(Json(state.roles.list().await?))
}

async fn create_role(
    State(state): State<ApiState>,
    Json(body): Json<NewRole>,
) -> ApiResult<(StatusCode, Json<Role>)> {
    Ok((StatusCode::CREATED, Json(state.roles.create(body).await?)))
}

async fn update_role(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(body): Json<NewRole>,
) -> ApiResult<Json<Role>> {
    Ok(Json(state.roles.update(RoleId(id), body).await?))
}

async fn delete_role(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.roles.delete(RoleId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_settings(State(state): State<ApiState>) -> ApiResult<Json<Vec<Setting>>> {
    Ok(Json(state.settings.list().await?))
}

async fn upsert_setting(
    State(state): State<ApiState>,
    Json(body): Json<Setting>,
) -> ApiResult<Json<Setting>> {
    Ok(Json(state.settings.upsert(body).await?))
}

async fn list_projects(State(state): State<ApiState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.projects.list().await?))
}

async fn create_project(
    State(state): State<ApiState>,
    Json(body): Json<NewProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    Ok((StatusCode::CREATED, Json(state.projects.create(body).await?)))
}

async fn update_project(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(body): Json<NewProject>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.projects.update(ProjectId(id), body).await?))
}

async fn finalize_project(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.projects.finalize(ProjectId(id)).await?))
}

async fn create_quote(
    State(state): State<ApiState>,
    Json(body): Json<NewQuote>,
) -> ApiResult<(StatusCode, Json<Quote>)> {
    Ok((StatusCode::CREATED, Json(state.quotes.create(body).await?)))
}

async fn get_quote(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult<Json<QuoteView>> {
    Ok(Json(state.aggregator.render_quote(QuoteId(id)).await?))
}

async fn update_financials(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(body): Json<FinancialsRequest>,
) -> ApiResult<Json<Quote>> {
    let financials = FinancialParameters {
        margin: body.applied_margin,
        risk: body.applied_risk,
        tax: body.applied_tax,
    };
    Ok(Json(state.quotes.update_financials(QuoteId(id), financials).await?))
}

async fn quote_document(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Html<String>> {
    let view = state.aggregator.render_quote(QuoteId(id)).await?;
    let html = state
        .documents
        .render(&view, Utc::now().date_naive())
        .map_err(|error| ApplicationError::Configuration(error.to_string()))?;
    Ok(Html(html))
}

async fn add_item(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(body): Json<LineItemInput>,
) -> ApiResult<(StatusCode, Json<LineItem>)> {
    Ok((StatusCode::CREATED, Json(state.quotes.add_item(QuoteId(id), body).await?)))
}

async fn update_item(
    State(state): State<ApiState>,
    Path(item_id): Path<i64>,
    Json(body): Json<LineItemInput>,
) -> ApiResult<Json<LineItem>> {
    Ok(Json(state.quotes.update_item(LineItemId(item_id), body).await?))
}

async fn delete_item(
    State(state): State<ApiState>,
    Path(item_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.quotes.delete_item(LineItemId(item_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn generate_scope(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(body): Json<GenerateScopeRequest>,
) -> ApiResult<Json<Vec<LineItem>>> {
    Ok(Json(state.scope.generate_for_quote(QuoteId(id), &body.requirements, &body.role_ids).await?))
}
