//! Fixtures shared by the cells' test suites.

use std::sync::Arc;

use axum::body::Body;
use base64::{Engine as _, engine::general_purpose};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use http::Request;
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "client")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn client(email: &str) -> Self {
        Self::new(email, "client")
    }

    pub fn professional(email: &str) -> Self {
        Self::new(email, "professional")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).expect("test users carry uuid ids")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "app_metadata": { "role": user.role },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    /// Builds a request carrying `Authorization: Bearer <token>` and an optional JSON body.
    pub fn authed_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token));

        match body {
            Some(json_body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json_body.to_string()))
                .expect("valid test request"),
            None => builder.body(Body::empty()).expect("valid test request"),
        }
    }
}

/// PostgREST rows as the Supabase tables return them.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn professional_row(professional_id: &str) -> Value {
        json!({
            "id": professional_id,
            "full_name": "Dra. Laura Gómez",
            "specialty": "Psicología",
            "description": "Terapia cognitivo conductual",
            "experience_years": 8,
            "consultation_price": 120000,
            "address": "Cra 7 # 45-10",
            "city": "Bogotá",
            "photo_url": null,
            "rating": 4.8,
            "review_count": 23,
            "license": "TP-12345",
            "languages": ["es", "en"],
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn availability_row(professional_id: &str, day: &str, start: &str, end: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "professional_id": professional_id,
            "day_of_week": day,
            "start_time": start,
            "end_time": end,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_row(client_id: &str, professional_id: &str, start_time: &str, status: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "client_id": client_id,
            "professional_id": professional_id,
            "start_time": start_time,
            "duration_minutes": 60,
            "status": status,
            "reason": "Consulta inicial",
            "notes": null,
            "price": 120000,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn notification_row(user_id: &str, kind: &str, read: bool) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "kind": kind,
            "title": "Cita reservada",
            "message": "Tienes una nueva cita",
            "read": read,
            "appointment_id": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn payment_row(appointment_id: &str, client_id: &str, status: &str, reference: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "appointment_id": appointment_id,
            "client_id": client_id,
            "amount": 120000,
            "method": "paypal",
            "status": status,
            "reference": reference,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
