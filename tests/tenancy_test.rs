mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{Part, TestApp};
use serde_json::json;

#[tokio::test]
async fn tenancies_split_into_current_and_past() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Larch House", json!({})).await;
    let jane = app.create_tenant("Jane", "Doe").await;
    let omar = app.create_tenant("Omar", "Khan").await;

    let today = Utc::now().date_naive();
    let added = app
        .ok(
            Method::POST,
            &format!("/api/v1/properties/{}/tenancies", property_id),
            Some(json!({
                "tenant_id": jane,
                "move_in_date": (today - Duration::days(30)).to_string(),
            })),
        )
        .await;
    assert_eq!(
        added["message"],
        "Tenant relationship for Jane Doe added successfully!"
    );

    app.ok(
        Method::POST,
        &format!("/api/v1/properties/{}/tenancies", property_id),
        Some(json!({
            "tenant_id": omar,
            "move_in_date": (today - Duration::days(400)).to_string(),
            "move_out_date": (today - Duration::days(40)).to_string(),
        })),
    )
    .await;

    let view = app
        .ok(
            Method::GET,
            &format!("/api/v1/properties/{}/sections/tenants-info", property_id),
            None,
        )
        .await;
    let current = view["data"]["current_tenants"].as_array().unwrap();
    let past = view["data"]["past_tenants"].as_array().unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0]["tenant_name"], "Jane Doe");
    assert_eq!(past.len(), 1);
    assert_eq!(past[0]["tenant_name"], "Omar Khan");

    let record = app
        .ok(Method::GET, &format!("/api/v1/tenants/{}", omar), None)
        .await;
    let links = record["data"]["tenancies"].as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["property_name"], "Larch House");
    assert_eq!(links[0]["is_current"], false);
}

#[tokio::test]
async fn same_tenant_and_move_in_twice_conflicts() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Poplar Road", json!({})).await;
    let tenant_id = app.create_tenant("Amir", "Said").await;
    let uri = format!("/api/v1/properties/{}/tenancies", property_id);
    let body = json!({ "tenant_id": tenant_id, "move_in_date": "2024-02-01" });

    app.ok(Method::POST, &uri, Some(body.clone())).await;
    let duplicate = app.request_authenticated(Method::POST, &uri, Some(body)).await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    // a later move-in is a new tenancy
    app.ok(
        Method::POST,
        &uri,
        Some(json!({ "tenant_id": tenant_id, "move_in_date": "2025-02-01" })),
    )
    .await;
}

#[tokio::test]
async fn move_out_before_move_in_is_rejected() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Spruce Close", json!({})).await;
    let tenant_id = app.create_tenant("Lena", "Marsh").await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/properties/{}/tenancies", property_id),
            Some(json!({
                "tenant_id": tenant_id,
                "move_in_date": "2024-06-01",
                "move_out_date": "2024-05-01",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn removing_a_tenancy_is_scoped_to_its_property() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Yew Terrace", json!({})).await;
    let other_property = app.create_property("Fir Lane", json!({})).await;
    let tenant_id = app.create_tenant("Nia", "Cole").await;

    let added = app
        .ok(
            Method::POST,
            &format!("/api/v1/properties/{}/tenancies", property_id),
            Some(json!({ "tenant_id": tenant_id, "move_in_date": "2024-01-15" })),
        )
        .await;
    let tenancy_id = added["data"]["id"].as_str().unwrap().to_string();

    let wrong = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/properties/{}/tenancies/{}", other_property, tenancy_id),
            None,
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::NOT_FOUND);

    let removed = app
        .ok(
            Method::DELETE,
            &format!("/api/v1/properties/{}/tenancies/{}", property_id, tenancy_id),
            None,
        )
        .await;
    assert_eq!(
        removed["message"],
        "Tenant relationship for Nia Cole deleted successfully."
    );
}

#[tokio::test]
async fn tenant_photos_must_be_images() {
    let app = TestApp::new().await;
    let tenant_id = app.create_tenant("Iris", "Bell").await;
    let uri = format!("/api/v1/tenants/{}/images", tenant_id);

    let rejected = app
        .post_multipart(
            &uri,
            &[
                Part::File("image", "contract.pdf", b"%PDF"),
                Part::Text("category", "id_photo"),
            ],
        )
        .await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert!(app.storage.is_empty());

    let accepted = app
        .post_multipart(
            &uri,
            &[
                Part::File("image", "passport.jpg", b"\xFF\xD8\xFF"),
                Part::Text("category", "id_photo"),
            ],
        )
        .await;
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(app.storage.len(), 1);

    let deleted = app
        .ok(Method::DELETE, &format!("/api/v1/tenants/{}", tenant_id), None)
        .await;
    assert_eq!(deleted["message"], "Tenant deleted successfully.");
    assert!(app.storage.is_empty());
}

#[tokio::test]
async fn whitespace_only_tenant_fields_are_rejected() {
    let app = TestApp::new().await;
    let tenant = || {
        json!({
            "first_name": "Nia",
            "last_name": "Cole",
            "phone": "07700900001",
            "email": "nia@example.com",
            "address": "9 Canal Street",
            "postcode": "M1 3HB",
        })
    };

    for field in ["first_name", "last_name", "phone", "email", "address", "postcode"] {
        let mut body = tenant();
        body[field] = json!("  ");
        let response = app
            .request_authenticated(Method::POST, "/api/v1/tenants", Some(body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", field);
    }

    let mut body = tenant();
    body["first_name"] = json!(" Nia ");
    body["last_name"] = json!("Cole  ");
    let created = app.ok(Method::POST, "/api/v1/tenants", Some(body)).await;
    assert_eq!(created["data"]["first_name"], "Nia");
    assert_eq!(created["data"]["full_name"], "Nia Cole");
}
