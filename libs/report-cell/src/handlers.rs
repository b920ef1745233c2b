// libs/report-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    DeleteReportRequest, ReportSearchQuery, UpdateNoteRequest, UploadReportRequest,
};
use crate::services::report::ReportService;

#[axum::debug_handler]
pub async fn upload_report(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UploadReportRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&state);
    let report = service.upload(&user, request, auth.token()).await?;
    Ok(Json(json!(report)))
}

#[axum::debug_handler]
pub async fn search_reports(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<ReportSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&state);
    let reports = service.search(&user, &query, auth.token()).await?;
    let count = reports.len();
    Ok(Json(json!({ "reports": reports, "count": count })))
}

#[axum::debug_handler]
pub async fn update_report_note(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(report_id): Path<Uuid>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&state);
    let report = service
        .update_note(&user, report_id, request, auth.token())
        .await?;
    Ok(Json(json!(report)))
}

#[axum::debug_handler]
pub async fn archive_report(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(report_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&state);
    let report = service.archive(&user, report_id, auth.token()).await?;
    Ok(Json(json!(report)))
}

#[axum::debug_handler]
pub async fn delete_report(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(report_id): Path<Uuid>,
    Json(request): Json<DeleteReportRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&state);
    let report = service
        .soft_delete(&user, report_id, request, auth.token())
        .await?;
    Ok(Json(json!(report)))
}

#[axum::debug_handler]
pub async fn download_report(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(report_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&state);
    let download = service.download(&user, report_id, auth.token()).await?;
    Ok(Json(json!(download)))
}
