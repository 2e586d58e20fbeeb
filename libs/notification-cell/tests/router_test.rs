use axum::http::StatusCode;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use notification_cell::models::{AppointmentEvent, NewNotification, NotificationKind};
use notification_cell::router::{notification_routes, NotificationState};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn user_reads_and_clears_notifications() {
    let config = TestConfig::default();
    let state = NotificationState::in_memory(config.to_arc());
    let app = notification_routes(state.clone());

    let client = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&client, &config.jwt_secret, None);

    let event = AppointmentEvent {
        appointment_id: Uuid::new_v4(),
        client_id: client.uuid(),
        professional_id: Uuid::new_v4(),
        start_time: chrono::Utc::now() + chrono::Duration::days(2),
        previous_start_time: None,
    };
    assert_eq!(state.notifications.appointment_booked(&event).await, 2);
    state
        .notifications
        .notify(NewNotification::new(client.uuid(), NotificationKind::System, "Bienvenido", "Hola"))
        .await
        .unwrap();

    let response = app.clone()
        .oneshot(JwtTestUtils::authed_request("GET", "/unread-count", &token, None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["unread"], 2);

    let response = app.clone()
        .oneshot(JwtTestUtils::authed_request("GET", "/?limit=1", &token, None))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    let first_id = json["notifications"][0]["id"].as_str().unwrap().to_string();

    let response = app.clone()
        .oneshot(JwtTestUtils::authed_request("POST", &format!("/{}/read", first_id), &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone()
        .oneshot(JwtTestUtils::authed_request("POST", "/read-all", &token, None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["updated"], 1);

    let response = app.clone()
        .oneshot(JwtTestUtils::authed_request("DELETE", &format!("/{}", first_id), &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(JwtTestUtils::authed_request("DELETE", &format!("/{}", first_id), &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requires_authentication() {
    let config = TestConfig::default();
    let app = notification_routes(NotificationState::in_memory(config.to_arc()));

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/unread-count")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
