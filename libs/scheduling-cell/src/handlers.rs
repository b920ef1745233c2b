// libs/scheduling-cell/src/handlers.rs
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
    AppointmentSearchQuery, BookAppointmentRequest, DoctorSearchQuery, FreeSlotsQuery,
    FreeSlotsResponse, NotifyRequest, UpdateStatusRequest,
};
use crate::services::gateway::SchedulingGateway;

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let gateway = SchedulingGateway::new(&state);
    let appointment = gateway.book(&user, request, auth.token()).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let gateway = SchedulingGateway::new(&state);
    let appointments = gateway.list(&user, &query, auth.token()).await?;
    let count = appointments.len();
    Ok(Json(json!({ "appointments": appointments, "count": count })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let gateway = SchedulingGateway::new(&state);
    let appointment = gateway.get(&user, appointment_id, auth.token()).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let gateway = SchedulingGateway::new(&state);
    let appointment = gateway
        .update_status(&user, appointment_id, request, auth.token())
        .await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let gateway = SchedulingGateway::new(&state);
    let response = gateway.delete(&user, appointment_id, auth.token()).await?;
    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn archive_appointment_reports(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let gateway = SchedulingGateway::new(&state);
    let response = gateway
        .archive_reports(&user, appointment_id, auth.token())
        .await?;
    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn notify_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<NotifyRequest>,
) -> Result<Json<Value>, AppError> {
    let gateway = SchedulingGateway::new(&state);
    let ack = gateway
        .notify(
            &user,
            appointment_id,
            request.channel,
            request.kind,
            auth.token(),
        )
        .await?;
    Ok(Json(json!(ack)))
}

#[axum::debug_handler]
pub async fn get_free_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<FreeSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let gateway = SchedulingGateway::new(&state);
    let slots = gateway
        .availability()
        .free_slots_for(query.doctor_id, query.date, auth.token())
        .await?;
    Ok(Json(json!(FreeSlotsResponse {
        date: query.date,
        doctor_id: query.doctor_id,
        slots,
    })))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let gateway = SchedulingGateway::new(&state);
    let doctors = gateway
        .list_doctors(query.specialty_id, auth.token())
        .await?;
    Ok(Json(json!({ "doctors": doctors })))
}

#[axum::debug_handler]
pub async fn list_specialties(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let gateway = SchedulingGateway::new(&state);
    let specialties = gateway.list_specialties(auth.token()).await?;
    Ok(Json(json!({ "specialties": specialties })))
}
