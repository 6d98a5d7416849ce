use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wayfare_api::{
    app,
    middleware::issue_token,
    state::{AppState, AuthConfig, Collaborators},
};
use wayfare_booking::MockPaymentAdapter;
use wayfare_core::assistant::{Assistant, ChatTurn};
use wayfare_core::catalog::Destination;
use wayfare_core::identity::{Role, User};
use wayfare_core::places::DisabledPlaces;
use wayfare_core::repository::{CatalogRepository, UserRepository};
use wayfare_core::{CoreResult, DestinationId};
use wayfare_shared::{Masked, Money};
use wayfare_store::mailer::LogMailer;
use wayfare_store::{MemoryStore, Repositories};

/// Always answers with the same prose.
struct CannedAssistant;

#[async_trait]
impl Assistant for CannedAssistant {
    async fn complete(&self, _system: &str, _turns: &[ChatTurn]) -> CoreResult<String> {
        Ok("Porto is lovely in May.".to_string())
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    auth: AuthConfig,
}

fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let auth = AuthConfig {
        secret: Masked("integration-secret".to_string()),
        expiration: 3600,
    };
    let state = AppState::new(
        Repositories::from_memory(store.clone()),
        Collaborators {
            payments: Arc::new(MockPaymentAdapter::new()),
            assistant: Arc::new(CannedAssistant),
            places: Arc::new(DisabledPlaces),
            mailer: Arc::new(LogMailer),
        },
        auth.clone(),
        50,
    )
    .unwrap();

    TestApp {
        router: app(state),
        store,
        auth,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
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
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": "long enough" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    /// Admins are provisioned directly in the store.
    async fn admin_token(&self) -> String {
        let admin = User::new("Root".into(), "root@wayfare.test".into(), "x$y".into(), Role::Admin);
        self.store.create_user(&admin).await.unwrap();
        issue_token(&self.auth, &admin).unwrap()
    }

    async fn seed_destination(&self, nightly_minor: i64) -> DestinationId {
        let destination = Destination {
            id: DestinationId::new(),
            name: "Lisbon".to_string(),
            country: "Portugal".to_string(),
            description: "Hills, trams and custard tarts".to_string(),
            image_url: None,
            nightly_price: Money::new(nightly_minor, "EUR"),
            tags: vec!["city".to_string()],
            created_at: Utc::now(),
        };
        self.store.create_destination(&destination).await.unwrap();
        destination.id
    }

    async fn book(&self, token: &str, destination: DestinationId) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/api/bookings",
                Some(token),
                Some(json!({
                    "destinationId": destination,
                    "startDate": "2025-06-01",
                    "endDate": "2025-06-03",
                    "guests": 2
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = test_app();
    let token = app.register("Ada", "Ada@Example.com").await;

    let (status, body) = app.send("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["role"], "user");

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "long enough" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": "Bo", "email": "bo@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ADA@example.com", "password": "long enough" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = test_app();
    let (status, _) = app.send("GET", "/api/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("GET", "/api/bookings", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.register("Ada", "ada@example.com").await;
    let (status, _) = app.send("GET", "/api/admin/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("GET", "/api/travel/destinations", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let app = test_app();
    let token = app.register("Ada", "ada@example.com").await;
    let destination = app.seed_destination(10_000).await;

    let first = app.book(&token, destination).await;
    assert_eq!(first["status"], "pending");
    assert_eq!(first["totalPrice"]["amountMinor"], 40_000);
    assert_eq!(first["totalPrice"]["currency"], "EUR");

    let second = app.book(&token, destination).await;

    let (status, list) = app.send("GET", "/api/bookings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["id"], second["id"]);
    assert_eq!(list[1]["id"], first["id"]);

    // someone else's booking looks absent
    let stranger = app.register("Bo", "bo@example.com").await;
    let uri = format!("/api/bookings/{}", first["id"].as_str().unwrap());
    let (status, _) = app.send("GET", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let cancel = format!("{}/cancel", uri);
    let (status, body) = app.send("POST", &cancel, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, body) = app.send("POST", &cancel, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Booking not found or already cancelled");

    // cancelled is terminal, admins cannot confirm it
    let admin = app.admin_token().await;
    let confirm = format!("/api/admin/bookings/{}/confirm", first["id"].as_str().unwrap());
    let (status, _) = app.send("POST", &confirm, Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let confirm = format!("/api/admin/bookings/{}/confirm", second["id"].as_str().unwrap());
    let (status, body) = app.send("POST", &confirm, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");

    let (_, stats) = app.send("GET", "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(stats["users"], 3);
    assert_eq!(stats["bookings"]["cancelled"], 1);
    assert_eq!(stats["bookings"]["confirmed"], 1);
    assert_eq!(stats["bookings"]["pending"], 0);
}

#[tokio::test]
async fn test_invalid_booking_input() {
    let app = test_app();
    let token = app.register("Ada", "ada@example.com").await;
    let destination = app.seed_destination(10_000).await;

    let (status, _) = app
        .send(
            "POST",
            "/api/bookings",
            Some(&token),
            Some(json!({
                "destinationId": destination,
                "startDate": "2025-06-03",
                "endDate": "2025-06-03"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            "POST",
            "/api/bookings",
            Some(&token),
            Some(json!({
                "destinationId": DestinationId::new(),
                "startDate": "2025-06-01",
                "endDate": "2025-06-03"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Destination not found");
}

#[tokio::test]
async fn test_malformed_requests_get_message_bodies() {
    let app = test_app();
    let token = app.register("Ada", "ada@example.com").await;
    let destination = app.seed_destination(10_000).await;

    for body in [
        json!({ "destinationId": destination, "startDate": "not-a-date", "endDate": "2025-06-03" }),
        json!({
            "destinationId": destination,
            "startDate": "2025-06-01",
            "endDate": "2025-06-03",
            "guests": -1
        }),
    ] {
        let (status, body) = app.send("POST", "/api/bookings", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("Validation failed"));
    }

    let (status, body) = app
        .send("GET", "/api/bookings/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = app
        .send("GET", "/api/travel/cruises?month=thirteen", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_payment_flow_through_webhook_and_refund() {
    let app = test_app();
    let token = app.register("Ada", "ada@example.com").await;
    let destination = app.seed_destination(12_345).await;
    let booking = app.book(&token, destination).await;

    let (status, method) = app
        .send(
            "POST",
            "/api/payments/methods",
            Some(&token),
            Some(json!({ "paymentMethodId": "pm_card_visa" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(method["isDefault"], true);

    let (status, created) = app
        .send(
            "POST",
            "/api/payments/intent",
            Some(&token),
            Some(json!({ "bookingId": booking["id"], "paymentMethodId": method["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(created["clientSecret"].is_string());

    let (_, payments) = app.send("GET", "/api/payments", Some(&token), None).await;
    assert_eq!(payments[0]["status"], "pending");
    // minor units reach the processor and the record unchanged
    assert_eq!(payments[0]["amount"]["amountMinor"], 49_380);
    let intent = payments[0]["processorIntentId"].as_str().unwrap().to_string();

    // refunding a pending payment is rejected and changes nothing
    let refund = format!("/api/payments/{}/refund", created["paymentId"].as_str().unwrap());
    let (status, _) = app.send("POST", &refund, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let event = json!({ "type": "payment_intent.succeeded", "data": { "object": { "id": intent } } });
    let (status, _) = app
        .send("POST", "/api/payments/webhook", None, Some(event.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    // duplicate delivery is acknowledged
    let (status, _) = app.send("POST", "/api/payments/webhook", None, Some(event)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, payments) = app.send("GET", "/api/payments", Some(&token), None).await;
    assert_eq!(payments[0]["status"], "completed");

    let (status, body) = app.send("POST", &refund, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "refunded");
    assert!(body["refundId"].is_string());

    let (status, _) = app.send("POST", &refund, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, notifications) = app.send("GET", "/api/notifications", Some(&token), None).await;
    let kinds: Vec<&str> = notifications["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["payment_refunded", "payment_completed", "booking_created"]);
    assert_eq!(notifications["unread"], 3);
}

#[tokio::test]
async fn test_default_payment_method_is_unique() {
    let app = test_app();
    let token = app.register("Ada", "ada@example.com").await;

    let mut ids = Vec::new();
    for card in ["pm_card_visa", "pm_card_amex", "pm_card_mastercard"] {
        let (_, method) = app
            .send(
                "POST",
                "/api/payments/methods",
                Some(&token),
                Some(json!({ "paymentMethodId": card })),
            )
            .await;
        ids.push(method["id"].as_str().unwrap().to_string());
    }

    let uri = format!("/api/payments/methods/{}/default", ids[2]);
    let (status, methods) = app.send("POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let defaults: Vec<&str> = methods
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["isDefault"] == true)
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(defaults, vec![ids[2].as_str()]);

    // another user's card cannot be made default
    let stranger = app.register("Bo", "bo@example.com").await;
    let (status, _) = app.send("POST", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reviews_update_the_mean_rating() {
    let app = test_app();
    let admin = app.admin_token().await;
    let (status, activity) = app
        .send(
            "POST",
            "/api/admin/activities",
            Some(&admin),
            Some(json!({
                "title": "Tram 28 tour",
                "category": "sightseeing",
                "price": { "amountMinor": 2_500, "currency": "EUR" },
                "rating": 5.0
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(activity["rating"], 0.0);

    let token = app.register("Ada", "ada@example.com").await;
    let uri = format!("/api/activities/{}/reviews", activity["id"].as_str().unwrap());
    for review in [
        json!({ "rating": 4, "comment": "Great" }),
        json!({ "comment": "No stars from me" }),
        json!({ "rating": 5, "comment": "Loved it" }),
    ] {
        let (status, _) = app.send("POST", &uri, Some(&token), Some(review)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .send("POST", &uri, Some(&token), Some(json!({ "rating": 6, "comment": "!" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let get = format!("/api/activities/{}", activity["id"].as_str().unwrap());
    let (_, activity) = app.send("GET", &get, None, None).await;
    assert_eq!(activity["rating"], 4.5);
    assert_eq!(activity["reviews"].as_array().unwrap().len(), 3);
    assert_eq!(activity["reviews"][0]["authorName"], "Ada");
}

#[tokio::test]
async fn test_preferences_and_assistant() {
    let app = test_app();
    let token = app.register("Ada", "ada@example.com").await;

    let (_, profile) = app
        .send("GET", "/api/user-activity/preferences", Some(&token), None)
        .await;
    assert_eq!(profile["sampleSize"], 0);
    assert!(profile["priceRange"]["min"].is_null());
    assert_eq!(profile["months"].as_array().unwrap().len(), 12);

    let (status, _) = app
        .send(
            "POST",
            "/api/user-activity",
            Some(&token),
            Some(json!({
                "activityType": "view",
                "destination": "Porto",
                "price": { "amountMinor": 8_000, "currency": "EUR" },
                "startDate": "2025-05-10",
                "preferences": ["food"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, profile) = app
        .send("GET", "/api/user-activity/preferences", Some(&token), None)
        .await;
    assert_eq!(profile["destinations"]["porto"], 1);
    assert_eq!(profile["priceRange"]["average"], 8_000.0);
    assert_eq!(profile["months"][4], 1);

    let (status, body) = app
        .send("POST", "/api/chat", Some(&token), Some(json!({ "message": "Where to?" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Porto is lovely in May.");

    let (status, body) = app.send("GET", "/api/suggestions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Porto is lovely in May.");

    let (status, _) = app
        .send("POST", "/api/chat", Some(&token), Some(json!({ "message": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_and_metrics() {
    let app = test_app();
    app.seed_destination(10_000).await;

    let (status, body) = app.send("GET", "/api/search?q=LISB", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destinations"][0]["name"], "Lisbon");
    assert_eq!(body["hotels"].as_array().unwrap().len(), 0);

    let (_, body) = app.send("GET", "/api/search/places?input=Lis", None, None).await;
    assert_eq!(body, json!([]));

    let token = app.register("Ada", "ada@example.com").await;
    let destination = app.seed_destination(5_000).await;
    app.book(&token, destination).await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(text.to_vec()).unwrap();
    assert!(text.contains("wayfare_bookings_created_total 1"));
}
