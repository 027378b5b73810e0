//! HTTP-level tests for `HttpController` against a wiremock server.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use unifi_client::{ApiRequest, ControllerApi, ControllerConfig, Error, HttpController};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, unifi_os: Option<bool>) -> ControllerConfig {
    ControllerConfig {
        host: server.uri(),
        username: "admin".into(),
        password: "secret".into(),
        is_unifi_os: unifi_os,
        ..Default::default()
    }
}

async fn mount_classic_login(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({
            "username": "admin",
            "password": "secret",
            "remember": true
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "unifises=abc; Path=/")
                .set_body_json(json!({"meta": {"rc": "ok"}, "data": []})),
        )
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_classic_login_and_v1_envelope() {
    let server = MockServer::start().await;
    mount_classic_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"rc": "ok"},
            "data": [{"mac": "aa:bb:cc:dd:ee:ff", "type": "usw"}]
        })))
        .mount(&server)
        .await;

    let controller = HttpController::new(config(&server, Some(false))).unwrap();
    let data = controller
        .request(ApiRequest::get("/stat/device"))
        .await
        .unwrap();
    assert_eq!(data[0]["type"], "usw");

    // Second request reuses the session.
    controller
        .request(ApiRequest::get("/stat/device"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_detects_unifi_os_and_replays_csrf() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-csrf-token", "tok-1")
                .set_body_json(json!({"username": "admin"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/proxy/network/api/s/default/rest/user/u1"))
        .and(header("x-csrf-token", "tok-1"))
        .and(body_json(json!({"name": "Printer"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"rc": "ok"},
            "data": [{"_id": "u1", "name": "Printer"}]
        })))
        .mount(&server)
        .await;

    let controller = HttpController::new(config(&server, None)).unwrap();
    let data = controller
        .request(ApiRequest::put("/rest/user/u1", json!({"name": "Printer"})))
        .await
        .unwrap();
    assert_eq!(data[0]["name"], "Printer");
    assert_eq!(controller.is_unifi_os().await, Some(true));
}

#[tokio::test]
async fn test_classic_detected_from_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/manage"))
        .mount(&server)
        .await;
    mount_classic_login(&server, 1).await;

    let controller = HttpController::new(config(&server, None)).unwrap();
    controller.connect().await.unwrap();
    assert_eq!(controller.is_unifi_os().await, Some(false));
}

#[tokio::test]
async fn test_v2_body_returned_as_is() {
    let server = MockServer::start().await;
    mount_classic_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v2/api/site/default/trafficroutes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"_id": "r1", "enabled": true}])),
        )
        .mount(&server)
        .await;

    let controller = HttpController::new(config(&server, Some(false))).unwrap();
    let data = controller
        .request(ApiRequest::get("/trafficroutes").v2())
        .await
        .unwrap();
    assert_eq!(data, json!([{"_id": "r1", "enabled": true}]));
}

#[tokio::test]
async fn test_rc_error_becomes_api_error() {
    let server = MockServer::start().await;
    mount_classic_login(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/s/default/cmd/devmgr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"rc": "error", "msg": "api.err.UnknownDevice"},
            "data": []
        })))
        .mount(&server)
        .await;

    let controller = HttpController::new(config(&server, Some(false))).unwrap();
    let err = controller
        .request(ApiRequest::post("/cmd/devmgr", json!({"cmd": "restart", "mac": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { status: None, .. }));
    assert!(err.to_string().contains("api.err.UnknownDevice"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_401_triggers_single_relogin() {
    let server = MockServer::start().await;
    mount_classic_login(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/health"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"rc": "ok"},
            "data": [{"subsystem": "wan", "status": "ok"}]
        })))
        .mount(&server)
        .await;

    let controller = HttpController::new(config(&server, Some(false))).unwrap();
    let data = controller
        .request(ApiRequest::get("/stat/health"))
        .await
        .unwrap();
    assert_eq!(data[0]["status"], "ok");
}

#[tokio::test]
async fn test_rejected_login_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "meta": {"rc": "error", "msg": "api.err.Invalid"},
            "data": []
        })))
        .mount(&server)
        .await;

    let controller = HttpController::new(config(&server, Some(false))).unwrap();
    let err = controller
        .request(ApiRequest::get("/stat/device"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;
    mount_classic_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sysinfo"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let controller = HttpController::new(config(&server, Some(false))).unwrap();
    let err = controller.ping().await.unwrap_err();
    assert!(matches!(err, Error::Api { status: Some(503), .. }));
    assert!(err.is_retryable());
}
