use axum::{http::StatusCode, Router};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::models::BookAppointmentRequest;
use appointment_cell::router::AppointmentState;
use notification_cell::router::NotificationState;
use payment_cell::router::{payment_routes, PaymentState};
use professional_cell::models::UpsertProfessionalRequest;
use professional_cell::router::ProfessionalState;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    app: Router,
    config: TestConfig,
    client: TestUser,
    professional: TestUser,
    appointment_id: Uuid,
}

async fn create_test_app() -> TestApp {
    let config = TestConfig::default();
    let professionals = ProfessionalState::in_memory(config.to_arc());
    let notifications = NotificationState::in_memory(config.to_arc());
    let appointments = AppointmentState::in_memory(config.to_arc(), &professionals, &notifications);

    let professional = TestUser::professional("dermatologia@example.com");
    let professional_id = professional.uuid();
    let profile: UpsertProfessionalRequest = serde_json::from_value(json!({
        "full_name": "Dr. Julián Mora",
        "specialty": "Dermatología",
        "consultation_price": 160000
    }))
    .unwrap();
    professionals.professionals.upsert_profile(professional_id, profile).await.unwrap();

    let client = TestUser::client("paga@example.com");
    let appointment = appointments
        .booking
        .create_appointment(
            client.uuid(),
            BookAppointmentRequest {
                professional_id,
                start_time: Utc::now() + Duration::days(3),
                duration_minutes: 30,
                reason: None,
                notes: None,
                price: None,
            },
        )
        .await
        .unwrap();

    let state = PaymentState::in_memory(config.to_arc(), &appointments, &notifications);
    TestApp {
        app: payment_routes(state),
        config,
        client,
        professional,
        appointment_id: appointment.id,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, user: &TestUser, body: Option<Value>) -> axum::response::Response {
        let token = JwtTestUtils::create_test_token(user, &self.config.jwt_secret, None);
        self.app
            .clone()
            .oneshot(JwtTestUtils::authed_request(method, uri, &token, body))
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn simulated_paypal_round_trip() {
    let t = create_test_app().await;

    let response = t
        .send("POST", "/paypal/checkout", &t.client, Some(json!({ "cita_id": t.appointment_id })))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let session = body_json(response).await;
    assert_eq!(session["amount_cop"], 160000);
    assert_eq!(session["amount_usd"], 40.0);
    assert_eq!(session["simulated"], true);
    let gateway_id = session["gateway_payment_id"].as_str().unwrap().to_string();
    assert!(session["approval_url"]
        .as_str()
        .unwrap()
        .ends_with(&format!("PayerID=SIMULATED-PAYER-ID&cita_id={}", t.appointment_id)));

    let uri = format!("/paypal/execute?paymentId={}&PayerID=SIMULATED-PAYER-ID", gateway_id);
    let response = t.send("POST", &uri, &t.client, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["payment"]["status"], "completed");
    assert_eq!(json["gateway_state"], "approved");

    let response = t.send("POST", &uri, &t.client, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = t.send("GET", &format!("/paypal/status/{}", gateway_id), &t.client, None).await;
    let json = body_json(response).await;
    assert_eq!(json["local_status"], "completed");

    let response = t.send("GET", "/stats", &t.client, None).await;
    let json = body_json(response).await;
    assert_eq!(json["total_spent"], 160000);
    assert_eq!(json["completed"], 1);
}

#[tokio::test]
async fn paying_twice_is_a_conflict() {
    let t = create_test_app().await;
    let body = json!({ "appointment_id": t.appointment_id, "amount": 160000, "method": "tarjeta" });

    let response = t.send("POST", "/", &t.client, Some(body.clone())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(
        json["payment"]["reference"],
        format!("REF-{}-{}", t.appointment_id, t.client.id)
    );

    let response = t.send("POST", "/", &t.client, Some(body)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = t.send("GET", "/mine?status=COMPLETADO", &t.client, None).await;
    assert_eq!(body_json(response).await["total"], 1);
}

#[tokio::test]
async fn foreign_appointment_reads_as_missing() {
    let t = create_test_app().await;
    let stranger = TestUser::client("otro@example.com");

    let response = t
        .send("POST", "/paypal/checkout", &stranger, Some(json!({ "appointment_id": t.appointment_id })))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn professionals_cannot_pay() {
    let t = create_test_app().await;
    let professional = TestUser::professional("pro@example.com");

    let response = t.send("GET", "/mine", &professional, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn professional_dashboard_lists_received_payments() {
    let t = create_test_app().await;
    let body = json!({ "cita_id": t.appointment_id, "monto": 160000, "metodo_pago": "tarjeta" });
    let response = t.send("POST", "/", &t.client, Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = t.send("GET", "/received?estado=completado", &t.professional, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["payments"][0]["appointment_id"], t.appointment_id.to_string());
    assert_eq!(json["payments"][0]["method"], "tarjeta");

    let response = t.send("GET", "/received?fecha_fin=2000-01-01", &t.professional, None).await;
    assert_eq!(body_json(response).await["total"], 0);

    let response = t.send("GET", "/received/stats", &t.professional, None).await;
    let json = body_json(response).await;
    assert_eq!(json["total_income"], 160000);
    assert_eq!(json["completed"], 1);
    assert_eq!(json["total_count"], 1);

    let response = t.send("GET", "/received", &t.client, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = t.send("GET", "/received/stats", &TestUser::professional("otra@example.com"), None).await;
    assert_eq!(body_json(response).await["total_count"], 0);
}
