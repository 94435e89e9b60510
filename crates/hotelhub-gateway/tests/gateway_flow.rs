//! End-to-end gateway behavior against stubbed backing services.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use wiremock::matchers::{any, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hotelhub_auth::MockVerifier;
use hotelhub_core::Role;
use hotelhub_gateway::{create_router, GatewayConfig, GatewayState};
use hotelhub_routing::{RouteDeclaration, RouteTable, ServiceUrls};
use hotelhub_upstream::HttpForwarder;

const AUTHORIZATION: &str = "authorization";

fn all_services(url: &str) -> ServiceUrls {
    ServiceUrls {
        auth: url.to_string(),
        room: url.to_string(),
        booking: url.to_string(),
        guest: url.to_string(),
        staff: url.to_string(),
        transaction: url.to_string(),
    }
}

fn gateway_with(upstream: &str, config: GatewayConfig) -> TestServer {
    let config = GatewayConfig {
        services: all_services(upstream),
        ..config
    };
    let routes = config.route_table().unwrap();
    let state = GatewayState::new(
        routes,
        Arc::new(MockVerifier),
        Arc::new(HttpForwarder::default()),
        config,
    );
    TestServer::new(create_router(state)).unwrap()
}

fn gateway(upstream: &str) -> TestServer {
    gateway_with(upstream, GatewayConfig::default())
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

/// Every declared route with its parameters filled in.
fn concrete_routes() -> Vec<(Method, String, RouteDeclaration)> {
    let table = RouteTable::new(
        hotelhub_routing::hotel_services(&ServiceUrls::default()).unwrap(),
    )
    .unwrap();

    table
        .services()
        .iter()
        .flat_map(|service| service.routes.iter())
        .map(|route| {
            let params: HashMap<String, String> = route
                .path()
                .params()
                .map(|name| (name.to_string(), "42".to_string()))
                .collect();
            let method = Method::from_bytes(route.method().as_str().as_bytes()).unwrap();
            (method, route.path().render(&params), route.clone())
        })
        .collect()
}

async fn ok_upstream() -> MockServer {
    let upstream = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&upstream)
        .await;
    upstream
}

async fn upstream_calls(upstream: &MockServer) -> usize {
    upstream.received_requests().await.unwrap_or_default().len()
}

#[tokio::test]
async fn health_is_answered_locally() {
    let upstream = MockServer::start().await;
    let server = gateway(&upstream.uri());

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());

    let body = response.json::<Value>();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
    assert!(body["uptime"].is_number());
    assert_eq!(upstream_calls(&upstream).await, 0);
}

#[tokio::test]
async fn every_public_route_forwards_without_credentials() {
    let upstream = ok_upstream().await;
    let server = gateway(&upstream.uri());

    for (method, path, _) in concrete_routes()
        .into_iter()
        .filter(|(_, _, route)| route.is_public())
    {
        let response = server.method(method.clone(), &path).await;
        assert_eq!(response.status_code(), StatusCode::OK, "{method} {path}");
    }
    assert!(upstream_calls(&upstream).await > 0);
}

#[tokio::test]
async fn every_protected_route_requires_a_credential() {
    let upstream = ok_upstream().await;
    let server = gateway(&upstream.uri());

    for (method, path, _) in concrete_routes()
        .into_iter()
        .filter(|(_, _, route)| !route.is_public())
    {
        let response = server.method(method.clone(), &path).await;
        assert_eq!(
            response.status_code(),
            StatusCode::UNAUTHORIZED,
            "{method} {path}"
        );
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "MISSING_CREDENTIAL");
    }
    assert_eq!(upstream_calls(&upstream).await, 0);
}

#[tokio::test]
async fn role_sets_are_enforced() {
    let upstream = ok_upstream().await;
    let server = gateway(&upstream.uri());
    let everyone = [Role::Admin, Role::Manager, Role::Receptionist, Role::Guest];

    for (method, path, route) in concrete_routes()
        .into_iter()
        .filter(|(_, _, route)| !route.is_public() && !route.roles().is_empty())
    {
        for role in &everyone {
            let before = upstream_calls(&upstream).await;
            let response = server
                .method(method.clone(), &path)
                .add_header(
                    HeaderName::from_static(AUTHORIZATION),
                    bearer(&format!("test-token:u-1:{role}")),
                )
                .await;
            let after = upstream_calls(&upstream).await;

            if route.roles().contains(role) {
                assert_eq!(response.status_code(), StatusCode::OK, "{role} {method} {path}");
                assert_eq!(after, before + 1, "{role} {method} {path}");
            } else {
                assert_eq!(
                    response.status_code(),
                    StatusCode::FORBIDDEN,
                    "{role} {method} {path}"
                );
                assert_eq!(response.json::<Value>()["error"]["code"], "FORBIDDEN");
                assert_eq!(after, before, "{role} {method} {path}");
            }
        }
    }
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let upstream = ok_upstream().await;
    let server = gateway(&upstream.uri());

    let response = server
        .get("/api/bookings")
        .add_header(HeaderName::from_static(AUTHORIZATION), bearer("not-a-token"))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "INVALID_CREDENTIAL"
    );

    let response = server
        .get("/api/bookings")
        .add_header(
            HeaderName::from_static(AUTHORIZATION),
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        )
        .await;
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "MISSING_CREDENTIAL"
    );
    assert_eq!(upstream_calls(&upstream).await, 0);
}

#[tokio::test]
async fn create_room_as_admin_relays_room_service_response() {
    let rooms = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rooms"))
        .and(header("x-user-role", "admin"))
        .and(header("x-user-id", "admin-1"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": "r-101", "number": "101" })),
        )
        .expect(1)
        .mount(&rooms)
        .await;
    let server = gateway(&rooms.uri());

    let response = server
        .post("/api/rooms")
        .add_header(
            HeaderName::from_static(AUTHORIZATION),
            bearer("test-token:admin-1:admin"),
        )
        .json(&json!({ "number": "101" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(
        response.json::<Value>(),
        json!({ "id": "r-101", "number": "101" })
    );
}

#[tokio::test]
async fn create_room_as_guest_never_reaches_room_service() {
    let rooms = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&rooms)
        .await;
    let server = gateway(&rooms.uri());

    let response = server
        .post("/api/rooms")
        .add_header(
            HeaderName::from_static(AUTHORIZATION),
            bearer("test-token:guest-1:guest"),
        )
        .json(&json!({ "number": "101" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(upstream_calls(&rooms).await, 0);
}

#[tokio::test]
async fn repeated_get_yields_same_relay() {
    let rooms = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "7", "floor": 2 })))
        .mount(&rooms)
        .await;
    let server = gateway(&rooms.uri());

    let first = server.get("/api/rooms/7").await;
    let second = server.get("/api/rooms/7").await;
    assert_eq!(first.status_code(), second.status_code());
    assert_eq!(first.text(), second.text());
}

#[tokio::test]
async fn oversized_body_is_rejected_with_envelope() {
    let upstream = ok_upstream().await;
    let config = GatewayConfig {
        max_body_bytes: 64,
        ..GatewayConfig::default()
    };
    let server = gateway_with(&upstream.uri(), config);

    let response = server
        .post("/api/auth/register")
        .json(&json!({ "email": "guest@hotel.test", "bio": "x".repeat(256) }))
        .await;
    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.headers().get("x-request-id").is_some());

    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(upstream_calls(&upstream).await, 0);

    let response = server
        .post("/api/auth/register")
        .json(&json!({ "email": "guest@hotel.test" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(upstream_calls(&upstream).await, 1);
}

#[tokio::test]
async fn slow_upstream_hits_request_timeout_with_envelope() {
    let upstream = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(5)))
        .mount(&upstream)
        .await;
    let config = GatewayConfig {
        request_timeout_seconds: 1,
        ..GatewayConfig::default()
    };
    let server = gateway_with(&upstream.uri(), config);

    let response = server.get("/api/rooms").await;
    assert_eq!(response.status_code(), StatusCode::REQUEST_TIMEOUT);
    assert!(response.headers().get("x-request-id").is_some());

    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "REQUEST_TIMEOUT");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let upstream = ok_upstream().await;
    let server = gateway(&upstream.uri());

    let response = server.get("/api/nonexistent").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("x-request-id").is_some());

    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(
        body["error"]["message"],
        "Route GET /api/nonexistent not found"
    );
    assert_eq!(upstream_calls(&upstream).await, 0);
}

#[tokio::test]
async fn unreachable_service_is_upstream_unavailable() {
    let server = gateway("http://127.0.0.1:1");

    let response = server.get("/api/rooms").await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "UPSTREAM_UNAVAILABLE"
    );
}

#[tokio::test]
async fn upstream_error_body_is_relayed_verbatim() {
    let bookings = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "Room already booked" })),
        )
        .mount(&bookings)
        .await;
    let server = gateway(&bookings.uri());

    let response = server
        .post("/api/bookings")
        .add_header(HeaderName::from_static(AUTHORIZATION), bearer("test-token:g-1"))
        .json(&json!({ "roomId": "7" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Room already booked" })
    );
}

#[tokio::test]
async fn query_and_identity_headers_are_forwarded() {
    let guests = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/guests"))
        .and(query_param("page", "2"))
        .and(header("x-user-role", "receptionist"))
        .and(header("x-user-email", "desk-1@hotelhub.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&guests)
        .await;
    let server = gateway(&guests.uri());

    let response = server
        .get("/api/guests")
        .add_query_param("page", "2")
        .add_header(
            HeaderName::from_static(AUTHORIZATION),
            bearer("test-token:desk-1:receptionist"),
        )
        .add_header(
            HeaderName::from_static("x-user-role"),
            HeaderValue::from_static("admin"),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_rejects_excess_requests() {
    let upstream = ok_upstream().await;
    let config = GatewayConfig {
        rate_limit_max_requests: 2,
        ..GatewayConfig::default()
    };
    let server = gateway_with(&upstream.uri(), config);

    let first = server.get("/api/rooms").await;
    assert_eq!(first.status_code(), StatusCode::OK);
    assert_eq!(first.headers().get("ratelimit-limit").unwrap(), "2");
    assert_eq!(first.headers().get("ratelimit-remaining").unwrap(), "1");

    server.get("/api/rooms").await;

    let third = server.get("/api/rooms").await;
    assert_eq!(third.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(third.headers().get("ratelimit-remaining").unwrap(), "0");
    assert_eq!(third.json::<Value>()["error"]["code"], "RATE_LIMITED");
    assert_eq!(upstream_calls(&upstream).await, 2);
}
