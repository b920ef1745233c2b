// libs/scheduling-cell/tests/gateway_test.rs
use assert_matches::assert_matches;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::models::{
    AppointmentSearchQuery, BookAppointmentRequest, SchedulingError, UpdateStatusRequest,
};
use scheduling_cell::services::calendar::{clinic_today, is_bookable_day, slot_instant};
use scheduling_cell::SchedulingGateway;
use shared_models::appointment::AppointmentStatus;
use shared_utils::test_utils::{TestConfig, TestUser};

const TOKEN: &str = "test-token";

/// A bookable clinic day comfortably in the future.
fn future_slot() -> DateTime<Utc> {
    let mut d = clinic_today(Utc::now() + Duration::days(30));
    while !is_bookable_day(d) {
        d = d.succ_opt().unwrap();
    }
    slot_instant(d, NaiveTime::from_hms_opt(10, 0, 0).unwrap()).unwrap()
}

fn doctor_json(id: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "email": "doc@example.com",
        "first_name": "Maria",
        "last_name": "Rossi",
        "specialties": []
    })
}

fn appointment_json(
    id: Uuid,
    patient_id: Uuid,
    doctor_id: Uuid,
    scheduled_at: DateTime<Utc>,
    status: &str,
) -> serde_json::Value {
    json!({
        "id": id,
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "specialty_id": null,
        "scheduled_at": scheduled_at.to_rfc3339(),
        "status": status,
        "note": null,
        "price_cents": 10000,
        "created_at": Utc::now().to_rfc3339(),
        "updated_at": Utc::now().to_rfc3339()
    })
}

async fn gateway_for(mock_server: &MockServer) -> SchedulingGateway {
    let config = TestConfig::with_store_url(&mock_server.uri()).to_arc();
    SchedulingGateway::new(&config)
}

#[tokio::test]
async fn test_book_happy_path() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let patient = TestUser::patient("ada@example.com");
    let doctor_id = Uuid::new_v4();
    let scheduled_at = future_slot();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_json(doctor_id)])))
        .mount(&mock_server)
        .await;

    // No appointments on that day yet
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let created = appointment_json(
        Uuid::new_v4(),
        Uuid::parse_str(&patient.id).unwrap(),
        doctor_id,
        scheduled_at,
        "Requested",
    );
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([created])))
        .mount(&mock_server)
        .await;

    let request = BookAppointmentRequest {
        doctor_id,
        scheduled_at,
        specialty_id: None,
        note: None,
    };

    let appointment = gateway
        .book(&patient.to_user(), request, TOKEN)
        .await
        .unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Requested);
    assert_eq!(appointment.doctor_id, doctor_id);
    assert_eq!(appointment.price_cents, Some(10_000));
}

#[tokio::test]
async fn test_book_rejected_for_staff() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let request = BookAppointmentRequest {
        doctor_id: Uuid::new_v4(),
        scheduled_at: future_slot(),
        specialty_id: None,
        note: None,
    };

    let result = gateway
        .book(&TestUser::doctor("doc@example.com").to_user(), request, TOKEN)
        .await;
    assert_matches!(result, Err(SchedulingError::Forbidden(_)));
}

#[tokio::test]
async fn test_book_rejects_off_grid_time() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let on_the_hour = future_slot();
    let half_past = on_the_hour + Duration::minutes(30);

    let request = BookAppointmentRequest {
        doctor_id: Uuid::new_v4(),
        scheduled_at: half_past,
        specialty_id: None,
        note: None,
    };

    let result = gateway
        .book(
            &TestUser::patient("ada@example.com").to_user(),
            request,
            TOKEN,
        )
        .await;
    assert_matches!(result, Err(SchedulingError::Validation(_)));
}

#[tokio::test]
async fn test_book_conflict_when_slot_already_listed() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let patient = TestUser::patient("ada@example.com");
    let doctor_id = Uuid::new_v4();
    let scheduled_at = future_slot();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_json(doctor_id)])))
        .mount(&mock_server)
        .await;

    let clash = appointment_json(
        Uuid::new_v4(),
        Uuid::new_v4(),
        doctor_id,
        scheduled_at,
        "Confirmed",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([clash])))
        .mount(&mock_server)
        .await;

    let request = BookAppointmentRequest {
        doctor_id,
        scheduled_at,
        specialty_id: None,
        note: None,
    };

    let result = gateway.book(&patient.to_user(), request, TOKEN).await;
    assert_matches!(result, Err(SchedulingError::SlotTaken(_)));
}

#[tokio::test]
async fn test_book_surfaces_store_race_as_slot_taken() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let patient = TestUser::patient("ada@example.com");
    let doctor_id = Uuid::new_v4();
    let scheduled_at = future_slot();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_json(doctor_id)])))
        .mount(&mock_server)
        .await;

    // The availability check sees a free slot...
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    // ...but another booking wins the unique index on insert.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&mock_server)
        .await;

    let request = BookAppointmentRequest {
        doctor_id,
        scheduled_at,
        specialty_id: None,
        note: None,
    };

    let result = gateway.book(&patient.to_user(), request, TOKEN).await;
    assert_matches!(result, Err(SchedulingError::SlotTaken(_)));
}

#[tokio::test]
async fn test_update_status_rejects_note_less_rejection() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let doctor = TestUser::doctor("doc@example.com");
    let appointment_id = Uuid::new_v4();
    let stored = appointment_json(
        appointment_id,
        Uuid::new_v4(),
        Uuid::parse_str(&doctor.id).unwrap(),
        future_slot(),
        "Requested",
    );

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored])))
        .mount(&mock_server)
        .await;

    let request = UpdateStatusRequest {
        status: AppointmentStatus::Rejected,
        note: None,
    };

    let result = gateway
        .update_status(&doctor.to_user(), appointment_id, request, TOKEN)
        .await;
    assert_matches!(result, Err(SchedulingError::Validation(_)));
}

#[tokio::test]
async fn test_patient_cannot_see_other_patients_appointment() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let appointment_id = Uuid::new_v4();
    let stored = appointment_json(
        appointment_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        future_slot(),
        "Requested",
    );

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored])))
        .mount(&mock_server)
        .await;

    let outsider = TestUser::patient("eve@example.com");
    let result = gateway.get(&outsider.to_user(), appointment_id, TOKEN).await;
    assert_matches!(result, Err(SchedulingError::NotFound));
}

#[tokio::test]
async fn test_delete_refused_while_reports_active() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let secretary = TestUser::secretary("desk@example.com");
    let appointment_id = Uuid::new_v4();
    let stored = appointment_json(
        appointment_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        Utc::now() - Duration::days(1),
        "Completed",
    );

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored])))
        .mount(&mock_server)
        .await;

    // One active report hangs off the appointment
    Mock::given(method("GET"))
        .and(path("/rest/v1/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": Uuid::new_v4()}])))
        .mount(&mock_server)
        .await;

    let result = gateway
        .delete(&secretary.to_user(), appointment_id, TOKEN)
        .await;
    assert_matches!(result, Err(SchedulingError::Validation(_)));
}

#[tokio::test]
async fn test_delete_refused_while_archived_report_remains() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let secretary = TestUser::secretary("desk@example.com");
    let appointment_id = Uuid::new_v4();
    let stored = appointment_json(
        appointment_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        Utc::now() - Duration::days(1),
        "Completed",
    );

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored])))
        .mount(&mock_server)
        .await;

    // The guard must not filter on archived: an archived report is still
    // a non-deleted document referencing the appointment.
    Mock::given(method("GET"))
        .and(path("/rest/v1/reports"))
        .and(query_param("deleted_at", "is.null"))
        .and(query_param_is_missing("archived"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": Uuid::new_v4()}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = gateway
        .delete(&secretary.to_user(), appointment_id, TOKEN)
        .await;
    assert_matches!(result, Err(SchedulingError::Validation(_)));
}

#[tokio::test]
async fn test_delete_succeeds_once_all_reports_deleted() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let secretary = TestUser::secretary("desk@example.com");
    let appointment_id = Uuid::new_v4();
    let stored = appointment_json(
        appointment_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        Utc::now() - Duration::days(1),
        "Completed",
    );

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let response = gateway
        .delete(&secretary.to_user(), appointment_id, TOKEN)
        .await
        .unwrap();
    assert!(response.deleted);
    assert_eq!(response.id, appointment_id);
}

#[tokio::test]
async fn test_list_applies_report_archived_filter() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let secretary = TestUser::secretary("desk@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("report_archived", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let query = AppointmentSearchQuery {
        report_archived: Some(false),
        ..Default::default()
    };
    let appointments = gateway
        .list(&secretary.to_user(), &query, TOKEN)
        .await
        .unwrap();
    assert!(appointments.is_empty());
}

#[tokio::test]
async fn test_list_doctors_filters_by_specialty() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let specialty_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("specialties.id", format!("eq.{}", specialty_id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([doctor_json(Uuid::new_v4())])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let doctors = gateway
        .list_doctors(Some(specialty_id), TOKEN)
        .await
        .unwrap();
    assert_eq!(doctors.len(), 1);
}

#[tokio::test]
async fn test_delete_forbidden_for_doctor() {
    let mock_server = MockServer::start().await;
    let gateway = gateway_for(&mock_server).await;

    let result = gateway
        .delete(
            &TestUser::doctor("doc@example.com").to_user(),
            Uuid::new_v4(),
            TOKEN,
        )
        .await;
    assert_matches!(result, Err(SchedulingError::Forbidden(_)));
}
