use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;
use tracing::{info, warn};

use appointment_cell::router::{appointment_routes, AppointmentState};
use notification_cell::router::{notification_routes, NotificationState};
use payment_cell::router::{payment_routes, PaymentState};
use professional_cell::router::{professional_routes, ProfessionalState};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

/// State of every cell, wired over one storage backend.
pub struct Cells {
    pub storage: &'static str,
    pub professionals: ProfessionalState,
    pub notifications: NotificationState,
    pub appointments: AppointmentState,
    pub payments: PaymentState,
}

impl Cells {
    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        let professionals = ProfessionalState::in_memory(config.clone());
        let notifications = NotificationState::in_memory(config.clone());
        let appointments = AppointmentState::in_memory(config.clone(), &professionals, &notifications);
        let payments = PaymentState::in_memory(config, &appointments, &notifications);

        Self { storage: "memory", professionals, notifications, appointments, payments }
    }

    pub fn with_supabase(config: Arc<AppConfig>, supabase: Arc<SupabaseClient>) -> Self {
        let professionals = ProfessionalState::with_supabase(config.clone(), supabase.clone());
        let notifications = NotificationState::with_supabase(config.clone(), supabase.clone());
        let appointments =
            AppointmentState::with_supabase(config.clone(), supabase.clone(), &professionals, &notifications);
        let payments = PaymentState::with_supabase(config, supabase, &appointments, &notifications);

        Self { storage: "supabase", professionals, notifications, appointments, payments }
    }

    /// Supabase when fully configured, otherwise process-local storage.
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        if config.is_configured() {
            info!("Using Supabase storage at {}", config.supabase_url);
            let supabase = Arc::new(SupabaseClient::new(&config));
            Self::with_supabase(config, supabase)
        } else {
            warn!("Supabase is not configured; data is kept in memory and lost on restart");
            Self::in_memory(config)
        }
    }
}

pub fn create_router(cells: Cells) -> Router {
    let storage = cells.storage;

    Router::new()
        .route("/", get(|| async { "Tiiwa API is running!" }))
        .route(
            "/health",
            get(move || async move { Json(json!({ "status": "ok", "storage": storage })) }),
        )
        .nest("/professionals", professional_routes(cells.professionals))
        .nest("/appointments", appointment_routes(cells.appointments))
        .nest("/notifications", notification_routes(cells.notifications))
        .nest("/payments", payment_routes(cells.payments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::Value;
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, TimeZone, Utc};
    use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_reports_storage() {
        let app = create_router(Cells::in_memory(TestConfig::default().to_arc()));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["storage"], "memory");
    }

    #[tokio::test]
    async fn booking_flows_across_cells() {
        let config = TestConfig::default();
        let app = create_router(Cells::in_memory(config.to_arc()));

        let pro = TestUser::professional("pro@example.com");
        let client = TestUser::client("client@example.com");
        let pro_token = JwtTestUtils::create_test_token(&pro, &config.jwt_secret, None);
        let client_token = JwtTestUtils::create_test_token(&client, &config.jwt_secret, None);

        let profile = json!({ "full_name": "Dra. Sofía León", "specialty": "Pediatría", "consultation_price": 100000 });
        let response = app
            .clone()
            .oneshot(JwtTestUtils::authed_request("PUT", "/professionals/me", &pro_token, Some(profile)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let tomorrow = (Utc::now() + Duration::days(1)).date_naive();
        let start = Utc.from_utc_datetime(&tomorrow.and_hms_opt(9, 0, 0).unwrap());
        let booking = json!({ "professional_id": pro.id, "start_time": start, "duration_minutes": 30 });
        let response = app
            .clone()
            .oneshot(JwtTestUtils::authed_request("POST", "/appointments", &client_token, Some(booking)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let appointment_id = body_json(response).await["appointment"]["id"].clone();

        let response = app
            .clone()
            .oneshot(JwtTestUtils::authed_request("GET", "/notifications/unread-count", &pro_token, None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["unread"], 1);

        let response = app
            .oneshot(JwtTestUtils::authed_request(
                "POST",
                "/payments/paypal/checkout",
                &client_token,
                Some(json!({ "appointment_id": appointment_id })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
