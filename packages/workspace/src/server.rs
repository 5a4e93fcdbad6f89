//! JSON-over-HTTP boundary for the designer client. All routes share one
//! [`WorkspaceService`]; CORS is permissive because the designer runs on a
//! different origin than the generated preview.

use crate::service::{PatchApplied, WorkspaceError, WorkspaceService};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pagecraft_document::DocumentId;
use pagecraft_editor::{EditorError, PatchOp};
use pagecraft_project::{BuildReport, BuildWarning};
use pagecraft_variants::{TemplateKind, VariantError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub fn router(service: Arc<WorkspaceService>) -> Router {
    Router::new()
        .route("/patches", post(apply_patches))
        .route("/documents/:selector", get(get_document))
        .route("/variations", post(generate_variations))
        .route("/variations/select", post(select_variation))
        .with_state(service)
        .layer(CorsLayer::permissive())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatchPayload {
    selector: String,
    ops: Vec<PatchOp>,
    #[serde(default)]
    trigger_build: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageVersion {
    ast_file: String,
    version: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildSummary {
    written: Vec<String>,
    skipped: Vec<String>,
    warnings: Vec<String>,
    routes: Vec<String>,
}

impl From<BuildReport> for BuildSummary {
    fn from(report: BuildReport) -> Self {
        Self {
            written: report.written,
            skipped: report.skipped,
            warnings: report
                .warnings
                .iter()
                .map(BuildWarning::to_string)
                .collect(),
            routes: report.routes,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PatchResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    project_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_version: Option<PageVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<BuildSummary>,
}

impl From<PatchApplied> for PatchResponse {
    fn from(applied: PatchApplied) -> Self {
        Self {
            project_version: applied.project_version,
            page_version: applied
                .page_version
                .map(|(ast_file, version)| PageVersion { ast_file, version }),
            build: applied.build.map(BuildSummary::from),
        }
    }
}

async fn apply_patches(
    State(service): State<Arc<WorkspaceService>>,
    Json(payload): Json<PatchPayload>,
) -> Result<Json<PatchResponse>, ApiError> {
    let target = DocumentId::parse(&payload.selector).map_err(WorkspaceError::Selector)?;
    let applied = service
        .apply_patches(target, payload.ops, payload.trigger_build)
        .await?;
    Ok(Json(applied.into()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentResponse {
    selector: String,
    version: u64,
    document: Value,
}

async fn get_document(
    State(service): State<Arc<WorkspaceService>>,
    Path(selector): Path<String>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let snapshot = service.document(&selector)?;
    Ok(Json(DocumentResponse {
        selector,
        version: snapshot.version,
        document: snapshot.value,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariationsPayload {
    template: TemplateKind,
    #[serde(default)]
    variables: BTreeMap<String, String>,
}

async fn generate_variations(
    State(service): State<Arc<WorkspaceService>>,
    Json(payload): Json<VariationsPayload>,
) -> Result<Json<pagecraft_variants::VariantSet>, ApiError> {
    let set = service
        .generate_variations(payload.template, &payload.variables)
        .await?;
    Ok(Json(set))
}

#[derive(Debug, Deserialize)]
struct SelectPayload {
    index: usize,
}

async fn select_variation(
    State(service): State<Arc<WorkspaceService>>,
    Json(payload): Json<SelectPayload>,
) -> Result<Json<pagecraft_variants::ActiveProject>, ApiError> {
    let active = service.select_variation(payload.index).await?;
    Ok(Json(active))
}

struct ApiError(WorkspaceError);

impl From<WorkspaceError> for ApiError {
    fn from(e: WorkspaceError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WorkspaceError::Selector(_) => StatusCode::BAD_REQUEST,
            WorkspaceError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            WorkspaceError::Editor(EditorError::Patch(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkspaceError::Variant(VariantError::InvalidVariantIndex { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            WorkspaceError::Variant(VariantError::NoVariantSet) => StatusCode::CONFLICT,
            WorkspaceError::Build(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}
