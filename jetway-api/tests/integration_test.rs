use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use jetway_api::middleware::Claims;
use jetway_api::state::{AppState, AuthConfig, RateLimit, Repositories};
use jetway_api::app;
use jetway_core::notifier::LogNotifier;
use jetway_core::repository::UserRepository;
use jetway_core::{Role, User};
use jetway_store::InMemoryStore;

const SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    store: Arc<InMemoryStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(
            Repositories::in_memory(store.clone()),
            Arc::new(LogNotifier),
            AuthConfig {
                secret: SECRET.to_string(),
            },
            None,
            RateLimit {
                requests: 100,
                window_seconds: 60,
            },
        );

        Self {
            router: app(state),
            store,
        }
    }

    async fn user(&self, email: &str, phone: Option<&str>, role: Role) -> String {
        let user = User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: email.to_string(),
            phone_number: phone.map(str::to_string),
            role,
            created_at: Utc::now(),
        };
        self.store.insert_user(&user).await.unwrap();
        token(user.id, role)
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

fn token(user_id: Uuid, role: Role) -> String {
    let claims = Claims {
        sub: user_id,
        role,
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn flight_body(number: &str, total_seats: i64) -> Value {
    json!({
        "flight_number": number,
        "origin": "JFK",
        "destination": "LAX",
        "departure_time": "2030-01-15T08:00:00Z",
        "arrival_time": "2030-01-15T11:30:00Z",
        "price": 420,
        "total_seats": total_seats,
    })
}

async fn create_flight(app: &TestApp, admin: &str, number: &str, total_seats: i64) -> String {
    let (status, flight) = app
        .call(Method::POST, "/v1/admin/flights", Some(admin), Some(flight_body(number, total_seats)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", flight);
    flight["id"].as_str().unwrap().to_string()
}

fn booking_body(flight_id: &str, seats: i64, seat_numbers: Value) -> Value {
    json!({
        "flight_id": flight_id,
        "passenger_name": "Ada Lovelace",
        "passenger_email": "ada@example.com",
        "seats": seats,
        "seat_numbers": seat_numbers,
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();
    let id = Uuid::new_v4();

    let (status, body) = app
        .call(Method::GET, &format!("/v1/flights/{}/seats", id), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app
        .call(Method::GET, "/v1/bookings", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_travelers() {
    let app = TestApp::new();
    let traveler = app.user("ada@example.com", Some("+15550100"), Role::Traveler).await;

    let (status, body) = app
        .call(Method::POST, "/v1/admin/flights", Some(&traveler), Some(flight_body("JW1", 10)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");
}

#[tokio::test]
async fn test_booking_round_trip() {
    let app = TestApp::new();
    let admin = app.user("ops@example.com", None, Role::Admin).await;
    let traveler = app.user("ada@example.com", Some("+15550100"), Role::Traveler).await;
    let flight_id = create_flight(&app, &admin, "JW100", 10).await;

    let (status, booking) = app
        .call(Method::POST, "/v1/bookings", Some(&traveler), Some(booking_body(&flight_id, 3, json!([]))))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", booking);
    assert_eq!(booking["status"], "CONFIRMED");
    assert_eq!(booking["seat_numbers"], json!(["1A", "1B", "1C"]));
    assert_eq!(booking["flight"]["available_seats"], 7);

    let (status, seats) = app
        .call(Method::GET, &format!("/v1/flights/{}/seats", flight_id), Some(&traveler), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seats["available_seats"], 7);
    assert_eq!(seats["total_seats"], 10);
    assert_eq!(seats["reserved_seats"], json!(["1A", "1B", "1C"]));

    let booking_id = booking["id"].as_str().unwrap();
    let (status, cancelled) = app
        .call(Method::DELETE, &format!("/v1/bookings/{}", booking_id), Some(&traveler), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(cancelled["flight"]["available_seats"], 10);

    let (status, body) = app
        .call(Method::DELETE, &format!("/v1/bookings/{}", booking_id), Some(&traveler), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Booking is already cancelled");
}

#[tokio::test]
async fn test_booking_validation_errors() {
    let app = TestApp::new();
    let admin = app.user("ops@example.com", None, Role::Admin).await;
    let traveler = app.user("ada@example.com", Some("+15550100"), Role::Traveler).await;
    let no_phone = app.user("grace@example.com", None, Role::Traveler).await;
    let flight_id = create_flight(&app, &admin, "JW200", 3).await;

    let (status, body) = app
        .call(Method::POST, "/v1/bookings", Some(&traveler), Some(booking_body(&flight_id, 5, json!([]))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only 3 seats available");

    let (status, body) = app
        .call(Method::POST, "/v1/bookings", Some(&no_phone), Some(booking_body(&flight_id, 1, json!([]))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Phone number required"));

    let (status, _) = app
        .call(Method::POST, "/v1/bookings", Some(&traveler), Some(booking_body(&flight_id, 1, json!(["1A"]))))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call(
            Method::POST,
            "/v1/bookings",
            Some(&traveler),
            Some(booking_body(&flight_id, 2, json!(["1A", "1B"]))),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Seat 1A is already reserved");

    let (status, _) = app
        .call(Method::POST, "/v1/bookings", Some(&traveler), Some(json!({ "flight_id": 42 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bookings_are_private_to_owner() {
    let app = TestApp::new();
    let admin = app.user("ops@example.com", None, Role::Admin).await;
    let owner = app.user("ada@example.com", Some("+15550100"), Role::Traveler).await;
    let stranger = app.user("eve@example.com", Some("+15550199"), Role::Traveler).await;
    let flight_id = create_flight(&app, &admin, "JW300", 6).await;

    let (_, booking) = app
        .call(Method::POST, "/v1/bookings", Some(&owner), Some(booking_body(&flight_id, 1, json!([]))))
        .await;
    let uri = format!("/v1/bookings/{}", booking["id"].as_str().unwrap());

    let (status, _) = app.call(Method::GET, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call(Method::DELETE, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, mine) = app.call(Method::GET, "/v1/bookings", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine, json!([]));

    let (status, all) = app.call(Method::GET, "/v1/admin/bookings", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all[0]["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_flight_admin_lifecycle() {
    let app = TestApp::new();
    let admin = app.user("ops@example.com", None, Role::Admin).await;
    let flight_id = create_flight(&app, &admin, "JW400", 12).await;

    let (status, _) = app
        .call(Method::POST, "/v1/admin/flights", Some(&admin), Some(flight_body("JW400", 12)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = app
        .call(
            Method::PUT,
            &format!("/v1/admin/flights/{}", flight_id),
            Some(&admin),
            Some(json!({ "total_seats": "18", "price": "99.5" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["total_seats"], 18);
    assert_eq!(updated["available_seats"], 18);
    assert_eq!(updated["seat_map"].as_array().unwrap().len(), 18);

    let (status, listed) = app.call(Method::GET, "/v1/flights", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = app
        .call(Method::DELETE, &format!("/v1/admin/flights/{}", flight_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(Method::DELETE, &format!("/v1/admin/flights/{}", flight_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_seed_and_sync() {
    let app = TestApp::new();
    let admin = app.user("ops@example.com", None, Role::Admin).await;

    let (status, seeded) = app.call(Method::POST, "/v1/admin/flights/seed", Some(&admin), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(seeded["flights"].as_array().unwrap().len(), 3);

    let (status, report) = app
        .call(Method::POST, "/v1/admin/flights/sync-all-seats", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["synchronized"], 3);
    assert_eq!(report["updated"], 0);

    let flight_id = seeded["flights"][0]["id"].as_str().unwrap();
    let (status, synced) = app
        .call(
            Method::POST,
            &format!("/v1/admin/flights/{}/sync-seats", flight_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(synced["before"], synced["after"]);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/v1/admin/flights/{}/sync-seats", Uuid::new_v4()),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_admin_and_profile() {
    let app = TestApp::new();
    let admin = app.user("ops@example.com", None, Role::Admin).await;

    let (status, created) = app
        .call(
            Method::POST,
            "/v1/admin/users",
            Some(&admin),
            Some(json!({ "name": "Grace", "email": "  Grace@Example.com " })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["email"], "grace@example.com");
    assert_eq!(created["role"], "traveler");

    let (status, _) = app
        .call(
            Method::POST,
            "/v1/admin/users",
            Some(&admin),
            Some(json!({ "name": "Grace again", "email": "GRACE@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(
            Method::POST,
            "/v1/admin/users",
            Some(&admin),
            Some(json!({ "name": "Pilot", "email": "pilot@example.com", "role": "pilot" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid role"));

    let grace = token(Uuid::parse_str(created["id"].as_str().unwrap()).unwrap(), Role::Traveler);
    let (status, profile) = app
        .call(Method::PATCH, "/v1/me", Some(&grace), Some(json!({ "phone_number": "+15550123" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["phone_number"], "+15550123");
    assert_eq!(profile["name"], "Grace");

    let (status, users) = app.call(Method::GET, "/v1/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_manual_read_and_replace() {
    let app = TestApp::new();
    let admin = app.user("ops@example.com", None, Role::Admin).await;
    let traveler = app.user("ada@example.com", Some("+15550100"), Role::Traveler).await;

    let (status, manual) = app.call(Method::GET, "/v1/manual", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(manual["content"], "");

    let (status, _) = app
        .call(Method::PUT, "/v1/admin/manual", Some(&admin), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(Method::PUT, "/v1/admin/manual", Some(&admin), Some(json!({ "content": "# Check-in" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, manual) = app.call(Method::GET, "/v1/manual", Some(&traveler), None).await;
    assert_eq!(manual["content"], "# Check-in");
    assert!(manual["updated_by"].is_string());
}
