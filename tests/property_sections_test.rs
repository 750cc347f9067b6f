//! Property detail sections, folder trees and document uploads.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, Part, TestApp};
use serde_json::json;

#[tokio::test]
async fn first_visit_creates_every_section_root() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Oak House", json!({})).await;

    let view = app
        .ok(
            Method::GET,
            &format!("/api/v1/properties/{}/sections/gas-certificate", property_id),
            None,
        )
        .await;

    let data = &view["data"];
    assert_eq!(data["active_section"], "gas-certificate");
    assert_eq!(data["tabs"].as_array().unwrap().len(), 11);
    assert_eq!(data["active_folder"]["name"], "Gas Certificate");
    assert_eq!(data["folder_path"], json!(["Gas Certificate"]));
    assert!(data["notices"].as_array().unwrap().is_empty());

    // a second visit reuses the same roots
    let again = app
        .ok(
            Method::GET,
            &format!("/api/v1/properties/{}/sections/gas-certificate", property_id),
            None,
        )
        .await;
    assert_eq!(
        again["data"]["active_folder"]["id"],
        data["active_folder"]["id"]
    );
}

#[tokio::test]
async fn unknown_section_shows_default_tab_with_notice() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Elm Court", json!({})).await;

    let view = app
        .ok(
            Method::GET,
            &format!("/api/v1/properties/{}/sections/boiler-manuals", property_id),
            None,
        )
        .await;

    assert_eq!(view["data"]["active_section"], "building-insurance");
    assert_eq!(
        view["data"]["notices"],
        json!(["Invalid section selected: 'Boiler Manuals'. Displaying default documents."])
    );
}

#[tokio::test]
async fn tenants_info_has_no_folder_and_rejects_mutations() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Birch Flats", json!({})).await;

    let view = app
        .ok(
            Method::GET,
            &format!("/api/v1/properties/{}/sections/tenants-info", property_id),
            None,
        )
        .await;
    assert!(view["data"]["active_folder"].is_null());
    assert!(view["data"]["documents"].as_array().unwrap().is_empty());

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/properties/{}/sections/tenants-info/folders", property_id),
            Some(json!({ "name": "Scans" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Please select a valid document section."));
}

#[tokio::test]
async fn folder_from_another_section_falls_back_to_root() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Cedar Lodge", json!({})).await;

    let created = app
        .ok(
            Method::POST,
            &format!("/api/v1/properties/{}/sections/pictures/folders", property_id),
            Some(json!({ "name": "Kitchen" })),
        )
        .await;
    assert_eq!(created["message"], "Folder 'Kitchen' created successfully.");
    let kitchen_id = created["data"]["id"].as_str().unwrap().to_string();

    let inside = app
        .ok(
            Method::GET,
            &format!(
                "/api/v1/properties/{}/sections/pictures?folder_id={}",
                property_id, kitchen_id
            ),
            None,
        )
        .await;
    assert_eq!(inside["data"]["active_folder"]["id"], kitchen_id.as_str());
    assert_eq!(inside["data"]["folder_path"], json!(["Pictures", "Kitchen"]));

    for bad in [kitchen_id.as_str(), "not-a-uuid"] {
        let elsewhere = app
            .ok(
                Method::GET,
                &format!(
                    "/api/v1/properties/{}/sections/lease-agreement?folder_id={}",
                    property_id, bad
                ),
                None,
            )
            .await;
        assert_eq!(elsewhere["data"]["active_folder"]["name"], "Lease Agreement");
        assert_eq!(
            elsewhere["data"]["notices"],
            json!(["Invalid folder access. Displaying root of current section."])
        );
    }
}

#[tokio::test]
async fn duplicate_folder_names_conflict_per_parent() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Maple House", json!({})).await;
    let uri = format!("/api/v1/properties/{}/sections/miscellaneous/folders", property_id);

    app.ok(Method::POST, &uri, Some(json!({ "name": "2024" }))).await;
    let duplicate = app
        .request_authenticated(Method::POST, &uri, Some(json!({ "name": "2024" })))
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let blank = app
        .request_authenticated(Method::POST, &uri, Some(json!({ "name": "   " })))
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn uploads_land_in_the_requested_folder() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Willow Row", json!({})).await;

    let folder = app
        .ok(
            Method::POST,
            &format!(
                "/api/v1/properties/{}/sections/gas-certificate/folders",
                property_id
            ),
            Some(json!({ "name": "2024" })),
        )
        .await;
    let folder_id = folder["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .post_multipart(
            &format!(
                "/api/v1/properties/{}/sections/gas-certificate/documents?folder_id={}",
                property_id, folder_id
            ),
            &[
                Part::File("file", "gas safety.pdf", b"%PDF-1.4"),
                Part::File("file", "boiler.pdf", b"%PDF-1.4"),
                Part::Text("description", "Annual check"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], "2 file(s) uploaded successfully!");
    assert_eq!(body["data"]["folder_id"], folder_id.as_str());

    let documents = body["data"]["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["original_name"], "gas safety.pdf");
    assert_eq!(documents[0]["description"], "Annual check");
    let dated = format!(
        "property_documents/{}/",
        chrono::Utc::now().date_naive().format("%Y/%m/%d")
    );
    assert!(documents[0]["file"].as_str().unwrap().starts_with(&dated));
    assert_eq!(app.storage.len(), 2);

    let info = app
        .ok(Method::GET, &format!("/api/v1/folders/{}", folder_id), None)
        .await;
    assert_eq!(info["data"]["full_path"], "Gas Certificate / 2024");
    assert_eq!(info["data"]["document_count"], 2);
    assert_eq!(info["data"]["section"], "gas-certificate");
}

#[tokio::test]
async fn upload_without_files_is_rejected() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Ash Grove", json!({})).await;

    let response = app
        .post_multipart(
            &format!("/api/v1/properties/{}/sections/pictures/documents", property_id),
            &[Part::Text("description", "nothing attached")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.storage.is_empty());
}

#[tokio::test]
async fn deleting_a_folder_removes_the_whole_subtree() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Rowan House", json!({})).await;
    let folders_uri = format!(
        "/api/v1/properties/{}/sections/inspection-report/folders",
        property_id
    );

    let year = app
        .ok(Method::POST, &folders_uri, Some(json!({ "name": "2024" })))
        .await;
    let year_id = year["data"]["id"].as_str().unwrap().to_string();
    let spring = app
        .ok(
            Method::POST,
            &folders_uri,
            Some(json!({ "name": "Spring", "parent_id": year_id })),
        )
        .await;
    let spring_id = spring["data"]["id"].as_str().unwrap().to_string();
    let april = app
        .ok(
            Method::POST,
            &folders_uri,
            Some(json!({ "name": "April", "parent_id": spring_id })),
        )
        .await;
    let april_id = april["data"]["id"].as_str().unwrap().to_string();

    for folder_id in [&spring_id, &april_id] {
        let response = app
            .post_multipart(
                &format!(
                    "/api/v1/properties/{}/sections/inspection-report/documents?folder_id={}",
                    property_id, folder_id
                ),
                &[Part::File("file", "report.pdf", b"report")],
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(app.storage.len(), 2);

    let deleted = app
        .ok(Method::DELETE, &format!("/api/v1/folders/{}", spring_id), None)
        .await;
    assert_eq!(
        deleted["message"],
        "Folder \"Spring\" and all its contents deleted successfully!"
    );
    // parent "2024" is not the section root, so it is where we land
    assert_eq!(deleted["data"]["tab"], "inspection-report");
    assert_eq!(deleted["data"]["folder_id"], year_id.as_str());

    assert!(app.storage.is_empty());
    for gone in [&spring_id, &april_id] {
        let response = app
            .request_authenticated(Method::GET, &format!("/api/v1/folders/{}", gone), None)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let top = app
        .ok(Method::DELETE, &format!("/api/v1/folders/{}", year_id), None)
        .await;
    assert!(top["data"]["folder_id"].is_null());
}

#[tokio::test]
async fn deleting_a_document_keeps_its_folder() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Hazel Mews", json!({})).await;

    let response = app
        .post_multipart(
            &format!("/api/v1/properties/{}/sections/lease-agreement/documents", property_id),
            &[Part::File("file", "lease.pdf", b"lease")],
        )
        .await;
    let body = response_json(response).await;
    let document_id = body["data"]["documents"][0]["id"].as_str().unwrap().to_string();

    let deleted = app
        .ok(Method::DELETE, &format!("/api/v1/documents/{}", document_id), None)
        .await;
    assert_eq!(deleted["message"], "File deleted successfully.");
    assert_eq!(deleted["data"]["tab"], "lease-agreement");
    assert!(app.storage.is_empty());

    let again = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/documents/{}", document_id), None)
        .await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn property_names_are_unique() {
    let app = TestApp::new().await;
    app.create_property("Oak House", json!({})).await;

    let duplicate = app
        .request_authenticated(
            Method::POST,
            "/api/v1/properties",
            Some(json!({
                "name": "Oak House",
                "address": "2 Other Road",
                "postcode": "M3 3CC",
                "property_type": "flat",
            })),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn whitespace_only_property_fields_are_rejected() {
    let app = TestApp::new().await;

    for (field, value) in [("name", "   "), ("address", "\t"), ("postcode", "  ")] {
        let mut body = json!({
            "name": "Ash Lodge",
            "address": "4 Mill Lane",
            "postcode": "M4 4DD",
            "property_type": "house",
        });
        body[field] = json!(value);
        let response = app
            .request_authenticated(Method::POST, "/api/v1/properties", Some(body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", field);
    }

    let padded = app
        .ok(
            Method::POST,
            "/api/v1/properties",
            Some(json!({
                "name": "  Ash Lodge ",
                "address": " 4 Mill Lane",
                "postcode": "M4 4DD ",
                "property_type": "house",
            })),
        )
        .await;
    assert_eq!(padded["data"]["name"], "Ash Lodge");
    assert_eq!(padded["data"]["address"], "4 Mill Lane");
    assert_eq!(padded["data"]["postcode"], "M4 4DD");
}
