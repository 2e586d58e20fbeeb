use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chrono::NaiveDate;
use payment_cell::models::{PaymentFilter, PaymentStatus};
use payment_cell::store::PaymentStore;
use payment_cell::supabase::SupabasePaymentStore;
use shared_database::supabase::SupabaseClient;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn store_for(server: &MockServer) -> SupabasePaymentStore {
    let config = TestConfig::with_supabase_url(server.uri()).to_app_config();
    SupabasePaymentStore::new(Arc::new(SupabaseClient::new(&config)))
}

#[tokio::test]
async fn finds_completed_payment_for_appointment() {
    let mock_server = MockServer::start().await;
    let appointment_id = Uuid::new_v4().to_string();
    let client_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .and(query_param("appointment_id", format!("eq.{}", appointment_id)))
        .and(query_param("status", "eq.completed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::payment_row(&appointment_id, &client_id, "COMPLETADO", "REF-1")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let payment = store_for(&mock_server)
        .completed_for_appointment(Uuid::parse_str(&appointment_id).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount, 120000);
}

#[tokio::test]
async fn reference_lookup_and_history_filters() {
    let mock_server = MockServer::start().await;
    let appointment_id = Uuid::new_v4().to_string();
    let client_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .and(query_param("reference", "eq.PAYID-SIMULATED-ABC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::payment_row(&appointment_id, &client_id.to_string(), "pending", "PAYID-SIMULATED-ABC")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .and(query_param("client_id", format!("eq.{}", client_id)))
        .and(query_param("status", "eq.pending"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let found = store.find_by_reference("PAYID-SIMULATED-ABC").await.unwrap();
    assert_eq!(found.unwrap().status, PaymentStatus::Pending);

    let history = store.list_for_client(client_id, Some(PaymentStatus::Pending)).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn received_payments_filter_by_appointments_and_dates() {
    let mock_server = MockServer::start().await;
    let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
    let client_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .and(query_param("appointment_id", format!("in.({},{})", first, second)))
        .and(query_param("status", "eq.completed"))
        .and(query_param("created_at", "gte.2030-03-01T00:00:00Z"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::payment_row(&first.to_string(), &client_id, "completed", "REF-1")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let filter = PaymentFilter {
        status: Some(PaymentStatus::Completed),
        from: NaiveDate::from_ymd_opt(2030, 3, 1),
        to: None,
    };
    let payments = store.list_for_appointments(vec![first, second], filter).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].appointment_id, first);

    let none = store.list_for_appointments(Vec::new(), PaymentFilter::default()).await.unwrap();
    assert!(none.is_empty());
}
