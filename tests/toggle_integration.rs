//! Integration tests for the public port toggle.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::ScriptedGateway;
use nydus::config::DeploymentMode;
use nydus::gateway::ToggleAction;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::Service;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_toggle_start_returns_gateway_json_unchanged() {
    let mock_server = MockServer::start().await;
    let gateway_reply = json!({"running": true, "message": "port 5013 opened", "pid": 4242});

    Mock::given(method("POST"))
        .and(path("/api/toggle-public"))
        .and(body_json(json!({"action": "start"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(gateway_reply.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut app = common::app_for_mock(&mock_server, DeploymentMode::Production);
    let response = app
        .call(post("/maintenance/toggle_port/nydus", r#"{"action":"start"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await, gateway_reply);
}

#[tokio::test]
async fn test_other_service_rejected_before_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/toggle-public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"running": true})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut app = common::app_for_mock(&mock_server, DeploymentMode::Production);
    let response = app
        .call(post("/maintenance/toggle_port/arvo-team", r#"{"action":"start"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = common::body_json(response).await;
    assert_eq!(
        json["error"]["message"],
        "Service does not support port toggling"
    );
}

#[tokio::test]
async fn test_service_checked_before_body() {
    let gateway = Arc::new(ScriptedGateway::default());
    let mut app = common::app_with(gateway.clone());

    let response = app
        .call(post("/maintenance/toggle_port/nginx", "not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = common::body_json(response).await;
    assert_eq!(
        json["error"]["message"],
        "Service does not support port toggling"
    );
    assert_eq!(gateway.toggle_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repeated_toggle_does_not_fail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/toggle-public"))
        .and(body_json(json!({"action": "stop"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"running": false, "changed": false})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut app = common::app_for_mock(&mock_server, DeploymentMode::Production);
    for _ in 0..2 {
        let response = app
            .call(post("/maintenance/toggle_port/nydus", r#"{"action":"stop"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_gateway_status_is_mirrored() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/toggle-public"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "busy"})))
        .mount(&mock_server)
        .await;

    let mut app = common::app_for_mock(&mock_server, DeploymentMode::Production);
    let response = app
        .call(post("/maintenance/toggle_port/nydus", r#"{"action":"start"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(common::body_json(response).await, json!({"error": "busy"}));
}

#[tokio::test]
async fn test_html_error_page_keeps_gateway_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/toggle-public"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("<html><body>Internal Server Error</body></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let mut app = common::app_for_mock(&mock_server, DeploymentMode::Production);
    let response = app
        .call(post("/maintenance/toggle_port/nydus", r#"{"action":"stop"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_invalid_action_is_bad_request() {
    let gateway = Arc::new(ScriptedGateway::default());
    let mut app = common::app_with(gateway.clone());

    for body in [r#"{"action":"restart"}"#, r#"{}"#, "garbage"] {
        let response = app
            .call(post("/maintenance/toggle_port/nydus", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
    assert_eq!(gateway.toggle_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_toggle_forwards_action() {
    let gateway = Arc::new(ScriptedGateway::default());
    let mut app = common::app_with(gateway.clone());

    app.call(post("/maintenance/toggle_port/nydus", r#"{"action":"stop"}"#))
        .await
        .unwrap();
    app.call(post("/maintenance/toggle_port/nydus", r#"{"action":"start"}"#))
        .await
        .unwrap();

    assert_eq!(
        *gateway.toggled.lock().unwrap(),
        vec![ToggleAction::Stop, ToggleAction::Start]
    );
}

#[tokio::test]
async fn test_port_status_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/toggle-public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"running": false})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut app = common::app_for_mock(&mock_server, DeploymentMode::Production);
    let response = app
        .call(get("/maintenance/toggle_port/nydus"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await, json!({"running": false}));
}

#[tokio::test]
async fn test_unreachable_gateway_is_bad_gateway() {
    let mock_server = MockServer::start().await;
    let mut app = common::app_for_mock(&mock_server, DeploymentMode::Production);
    drop(mock_server);

    let response = app
        .call(post("/maintenance/toggle_port/nydus", r#"{"action":"start"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
