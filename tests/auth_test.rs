mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp, STAFF_USERNAME};
use serde_json::json;

#[tokio::test]
async fn staff_routes_require_a_token() {
    let app = TestApp::new().await;

    for uri in ["/api/v1/properties", "/api/v1/dashboard", "/api/v1/logbook"] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let garbage = app
        .request(Method::GET, "/api/v1/tenants", None, Some("not-a-jwt"))
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_and_health_are_public() {
    let app = TestApp::new().await;

    let status = app.request(Method::GET, "/api/v1/status", None, None).await;
    assert_eq!(status.status(), StatusCode::OK);

    let health = app.request(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "username": STAFF_USERNAME, "password": "hunter22" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert!(body["error"]["code"].is_string());

    let unknown = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "username": "nobody", "password": "hunter22" })),
            None,
        )
        .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = TestApp::new().await;
    let token = app.login(STAFF_USERNAME, common::STAFF_PASSWORD).await;

    let before = app
        .request(Method::GET, "/api/v1/properties", None, Some(&token))
        .await;
    assert_eq!(before.status(), StatusCode::OK);

    let logout = app
        .request(Method::POST, "/api/v1/auth/logout", None, Some(&token))
        .await;
    assert_eq!(logout.status(), StatusCode::OK);
    let body = response_json(logout).await;
    assert_eq!(body["message"], "You have been logged out!");

    let after = app
        .request(Method::GET, "/api/v1/properties", None, Some(&token))
        .await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);

    // other sessions are unaffected
    let still_valid = app
        .request_authenticated(Method::GET, "/api/v1/properties", None)
        .await;
    assert_eq!(still_valid.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_lookups_are_empty() {
    let app = TestApp::new().await;
    app.create_property("Oak House", json!({})).await;
    app.create_tenant("Jane", "Doe").await;

    for uri in ["/api/v1/autocomplete/tenants?q=jan", "/api/v1/autocomplete/properties"] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body, json!({ "results": [], "pagination": { "more": false } }));
    }
}

#[tokio::test]
async fn lookups_match_names_and_addresses() {
    let app = TestApp::new().await;
    let oak = app.create_property("Oak House", json!({})).await;
    app.create_property("Elm Court", json!({})).await;
    let jane = app.create_tenant("Jane", "Doe").await;
    app.create_tenant("Omar", "Khan").await;

    let tenants = app
        .request_authenticated(Method::GET, "/api/v1/autocomplete/tenants?q=DOE", None)
        .await;
    let tenants = response_json(tenants).await;
    assert_eq!(
        tenants["results"],
        json!([{ "id": jane, "text": "Jane Doe" }])
    );

    let properties = app
        .request_authenticated(
            Method::GET,
            "/api/v1/autocomplete/properties?q=oak%20house%20street",
            None,
        )
        .await;
    let properties = response_json(properties).await;
    assert_eq!(
        properties["results"],
        json!([{ "id": oak, "text": "Oak House" }])
    );
    assert_eq!(properties["pagination"]["more"], false);
}

#[tokio::test]
async fn lookups_page_ten_at_a_time() {
    let app = TestApp::new().await;
    for i in 0..12 {
        app.create_property(&format!("Unit {:02}", i), json!({ "address": format!("{} Main Road", i) }))
            .await;
    }
    app.create_property("Elm Court", json!({})).await;

    let ids = |body: &serde_json::Value| -> Vec<String> {
        body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["id"].as_str().unwrap().to_string())
            .collect()
    };

    let first = app
        .request_authenticated(Method::GET, "/api/v1/autocomplete/properties?q=main", None)
        .await;
    let first = response_json(first).await;
    assert_eq!(ids(&first).len(), 10);
    assert_eq!(first["results"][0]["text"], "Unit 00");
    assert_eq!(first["pagination"]["more"], true);

    let second = app
        .request_authenticated(
            Method::GET,
            "/api/v1/autocomplete/properties?q=main&page=2",
            None,
        )
        .await;
    let second = response_json(second).await;
    assert_eq!(
        second["results"],
        json!([
            { "id": second["results"][0]["id"], "text": "Unit 10" },
            { "id": second["results"][1]["id"], "text": "Unit 11" },
        ])
    );
    assert_eq!(second["pagination"]["more"], false);
    assert!(ids(&second).iter().all(|id| !ids(&first).contains(id)));
}
