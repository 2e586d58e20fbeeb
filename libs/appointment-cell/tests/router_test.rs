use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::router::{appointment_routes, AppointmentState};
use notification_cell::router::NotificationState;
use professional_cell::models::UpsertProfessionalRequest;
use professional_cell::router::ProfessionalState;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    app: Router,
    config: TestConfig,
    professional: TestUser,
}

async fn create_test_app() -> TestApp {
    let config = TestConfig::default();
    let professionals = ProfessionalState::in_memory(config.to_arc());
    let notifications = NotificationState::in_memory(config.to_arc());

    let professional = TestUser::professional("pro@example.com");
    let profile: UpsertProfessionalRequest = serde_json::from_value(json!({
        "full_name": "Dra. Marta Pineda",
        "specialty": "Fisioterapia",
        "consultation_price": 80000
    }))
    .unwrap();
    professionals
        .professionals
        .upsert_profile(professional.uuid(), profile)
        .await
        .unwrap();

    let state = AppointmentState::in_memory(config.to_arc(), &professionals, &notifications);
    TestApp { app: appointment_routes(state), config, professional }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Tomorrow at `hour`:00 UTC as an RFC 3339 string.
fn tomorrow_at(hour: u32) -> String {
    let date = (Utc::now() + Duration::days(1)).date_naive();
    format!("{}T{:02}:00:00Z", date, hour)
}

impl TestApp {
    fn token_for(&self, user: &TestUser) -> String {
        JwtTestUtils::create_test_token(user, &self.config.jwt_secret, None)
    }

    async fn send(&self, method: &str, uri: &str, user: &TestUser, body: Option<Value>) -> axum::response::Response {
        let token = self.token_for(user);
        self.app
            .clone()
            .oneshot(JwtTestUtils::authed_request(method, uri, &token, body))
            .await
            .unwrap()
    }

    async fn book(&self, client: &TestUser, hour: u32) -> axum::response::Response {
        self.send(
            "POST",
            "/",
            client,
            Some(json!({
                "professional_id": self.professional.id,
                "start_time": tomorrow_at(hour),
                "duration_minutes": 60
            })),
        )
        .await
    }
}

#[tokio::test]
async fn client_books_and_professional_confirms() {
    let t = create_test_app().await;
    let client = TestUser::client("ana@example.com");

    let response = t.book(&client, 10).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["appointment"]["status"], "pending");
    assert_eq!(json["appointment"]["price"], 80000);
    let id = json["appointment"]["id"].as_str().unwrap().to_string();

    let response = t.send("POST", &format!("/{}/confirm", id), &t.professional, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["appointment"]["status"], "confirmed");

    let response = t.send("GET", "/mine", &client, None).await;
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);

    let response = t.send("GET", "/stats", &t.professional, None).await;
    let json = body_json(response).await;
    assert_eq!(json["confirmed"], 1);
    assert_eq!(json["upcoming"], 1);
}

#[tokio::test]
async fn double_booking_returns_409() {
    let t = create_test_app().await;

    let first = t.book(&TestUser::client("a@example.com"), 9).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = t.book(&TestUser::client("b@example.com"), 9).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert!(json["error"].as_str().unwrap().contains("conflicts"));
}

#[tokio::test]
async fn past_start_is_bad_request() {
    let t = create_test_app().await;
    let client = TestUser::client("late@example.com");

    let response = t
        .send(
            "POST",
            "/",
            &client,
            Some(json!({
                "professional_id": t.professional.id,
                "start_time": "2020-01-01T10:00:00Z"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_owning_client_may_cancel() {
    let t = create_test_app().await;
    let owner = TestUser::client("owner@example.com");
    let stranger = TestUser::client("stranger@example.com");

    let json = body_json(t.book(&owner, 11).await).await;
    let id = json["appointment"]["id"].as_str().unwrap().to_string();

    let response = t.send("POST", &format!("/{}/cancel", id), &stranger, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = t.send("POST", &format!("/{}/confirm", id), &owner, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = t.send("POST", &format!("/{}/cancel", id), &owner, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Already cancelled.
    let response = t.send("POST", &format!("/{}/cancel", id), &owner, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reschedule_moves_the_slot() {
    let t = create_test_app().await;
    let client = TestUser::client("move@example.com");

    let json = body_json(t.book(&client, 13).await).await;
    let id = json["appointment"]["id"].as_str().unwrap().to_string();

    let response = t
        .send(
            "PATCH",
            &format!("/{}/reschedule", id),
            &client,
            Some(json!({ "new_start_time": tomorrow_at(15) })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = t.book(&TestUser::client("other@example.com"), 13).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn free_slots_are_public() {
    let t = create_test_app().await;
    t.book(&TestUser::client("slot@example.com"), 10).await;

    let date = (Utc::now() + Duration::days(1)).date_naive();
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/professionals/{}/slots?date={}&duration_minutes=60", t.professional.id, date))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let slots: Vec<&str> = json["slots"].as_array().unwrap().iter().map(|s| s.as_str().unwrap()).collect();
    assert!(slots.contains(&"09:00"));
    assert!(!slots.contains(&"09:30"));
    assert!(!slots.contains(&"10:00"));
    assert!(slots.contains(&"11:00"));
}

#[tokio::test]
async fn conflict_check_reports_clashing_ids() {
    let t = create_test_app().await;
    let json = body_json(t.book(&TestUser::client("c@example.com"), 16).await).await;
    let id = json["appointment"]["id"].clone();

    let uri = format!(
        "/conflicts/check?professional_id={}&start_time={}&duration_minutes=30",
        t.professional.id,
        tomorrow_at(16)
    );
    let response = t.send("GET", &uri, &TestUser::client("d@example.com"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["can_book"], false);
    assert_eq!(json["conflicting_appointments"][0], id);
}

#[tokio::test]
async fn agenda_is_private_to_the_professional() {
    let t = create_test_app().await;
    let date = (Utc::now() + Duration::days(1)).date_naive();
    let uri = format!("/professionals/{}/agenda?date={}", t.professional.id, date);

    let response = t.send("GET", &uri, &TestUser::professional("rival@example.com"), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = t.send("GET", &uri, &t.professional, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let t = create_test_app().await;

    let response = t
        .app
        .clone()
        .oneshot(Request::builder().uri("/mine").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn professional_sees_distinct_patients() {
    let t = create_test_app().await;
    let ana = TestUser::client("ana@example.com");
    let luis = TestUser::client("luis@example.com");

    t.book(&ana, 8).await;
    t.book(&ana, 12).await;
    t.book(&luis, 10).await;

    let response = t.send("GET", "/patients", &t.professional, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["patients"][0]["client_id"], ana.id);
    assert_eq!(json["patients"][0]["total_appointments"], 2);
    assert_eq!(json["patients"][1]["client_id"], luis.id);

    let response = t.send("GET", "/patients", &ana, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_admins_list_every_appointment() {
    let t = create_test_app().await;
    let client = TestUser::client("e@example.com");
    t.book(&client, 9).await;
    t.book(&client, 11).await;

    let response = t.send("GET", "/admin/all", &client, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = TestUser::admin("admin@example.com");
    let response = t.send("GET", "/admin/all", &admin, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["total"], 2);

    let response = t.send("GET", "/admin/all?status=cancelled", &admin, None).await;
    assert_eq!(body_json(response).await["total"], 0);
}
