use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use professional_cell::router::{professional_routes, ProfessionalState};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn create_test_app() -> (Router, TestConfig) {
    let config = TestConfig::default();
    let state = ProfessionalState::in_memory(config.to_arc());
    (professional_routes(state), config)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn profile_body() -> Value {
    json!({
        "full_name": "Dra. Laura Gómez",
        "specialty": "Psicología",
        "city": "Bogotá",
        "consultation_price": 120000
    })
}

#[tokio::test]
async fn professional_publishes_profile_and_schedule() {
    let (app, config) = create_test_app();
    let pro = TestUser::professional("laura@example.com");
    let token = JwtTestUtils::create_test_token(&pro, &config.jwt_secret, None);

    let response = app.clone()
        .oneshot(JwtTestUtils::authed_request("PUT", "/me", &token, Some(profile_body())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let weekly = json!({
        "days": [
            {"day_of_week": "lunes", "activo": true, "hora_inicio": "08:00", "hora_fin": "12:00"},
            {"day_of_week": "wednesday", "active": true, "start_time": "14:00", "end_time": "18:00"},
            {"day_of_week": "friday", "active": false}
        ]
    });
    let response = app.clone()
        .oneshot(JwtTestUtils::authed_request("PUT", "/me/availability/weekly", &token, Some(weekly)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone()
        .oneshot(
            Request::builder()
                .uri(format!("/{}/availability", pro.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let blocks = json["availability"].as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["day_of_week"], "monday");
    assert_eq!(blocks[0]["start_time"], "08:00");

    let response = app
        .oneshot(Request::builder().uri("/search?specialty=psico").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
}

#[tokio::test]
async fn invalid_block_is_rejected_with_400() {
    let (app, config) = create_test_app();
    let pro = TestUser::professional("pro@example.com");
    let token = JwtTestUtils::create_test_token(&pro, &config.jwt_secret, None);

    let response = app
        .oneshot(JwtTestUtils::authed_request(
            "POST",
            "/me/availability",
            &token,
            Some(json!({"day_of_week": "monday", "start_time": "18:00", "end_time": "08:00"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clients_cannot_manage_availability() {
    let (app, config) = create_test_app();
    let client = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&client, &config.jwt_secret, None);

    let response = app
        .oneshot(JwtTestUtils::authed_request(
            "POST",
            "/me/availability",
            &token,
            Some(json!({"day_of_week": "monday", "start_time": "08:00", "end_time": "12:00"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn favorites_flow() {
    let (app, config) = create_test_app();
    let pro = TestUser::professional("pro@example.com");
    let client = TestUser::client("client@example.com");
    let pro_token = JwtTestUtils::create_test_token(&pro, &config.jwt_secret, None);
    let client_token = JwtTestUtils::create_test_token(&client, &config.jwt_secret, None);

    app.clone()
        .oneshot(JwtTestUtils::authed_request("PUT", "/me", &pro_token, Some(profile_body())))
        .await
        .unwrap();

    let add = json!({"professional_id": pro.id});
    let response = app.clone()
        .oneshot(JwtTestUtils::authed_request("POST", "/favorites", &client_token, Some(add.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.clone()
        .oneshot(JwtTestUtils::authed_request("POST", "/favorites", &client_token, Some(add)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.clone()
        .oneshot(JwtTestUtils::authed_request("GET", "/favorites", &client_token, None))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["favorites"][0]["professional"]["full_name"], "Dra. Laura Gómez");

    let response = app
        .oneshot(JwtTestUtils::authed_request(
            "DELETE",
            &format!("/favorites/{}", pro.id),
            &client_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_professional_is_404() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
