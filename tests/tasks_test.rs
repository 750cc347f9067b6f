mod common;

use axum::http::{Method, StatusCode};
use common::{Part, TestApp};
use serde_json::{json, Value};

async fn create_task(app: &TestApp, property_id: &str, job_id: &str, extra: Value) -> String {
    let mut body = json!({
        "job_id": job_id,
        "property_id": property_id,
        "date_issue_reported": "2024-03-01",
        "description_of_issue": "Leaking tap in kitchen",
    });
    if let (Some(target), Some(fields)) = (body.as_object_mut(), extra.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    let created = app.ok(Method::POST, "/api/v1/tasks", Some(body)).await;
    assert_eq!(created["message"], "Task created successfully!");
    created["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn job_ids_are_unique() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Alder House", json!({})).await;
    create_task(&app, &property_id, "JOB-001", json!({})).await;

    let duplicate = app
        .request_authenticated(
            Method::POST,
            "/api/v1/tasks",
            Some(json!({
                "job_id": "JOB-001",
                "property_id": property_id,
                "date_issue_reported": "2024-03-02",
                "description_of_issue": "Boiler pressure low",
            })),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_property_is_a_validation_error() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/tasks",
            Some(json!({
                "job_id": "JOB-404",
                "property_id": uuid::Uuid::new_v4(),
                "date_issue_reported": "2024-03-02",
                "description_of_issue": "Broken window",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logbook_sorts_open_jobs_first() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Beech Villa", json!({})).await;
    create_task(
        &app,
        &property_id,
        "JOB-A",
        json!({ "date_completed": "2024-03-05", "job_allocated": "Ruth" }),
    )
    .await;
    create_task(
        &app,
        &property_id,
        "JOB-B",
        json!({ "date_issue_reported": "2024-02-01" }),
    )
    .await;
    create_task(
        &app,
        &property_id,
        "JOB-C",
        json!({ "date_issue_reported": "2024-04-01" }),
    )
    .await;

    let pending = app
        .ok(Method::GET, "/api/v1/logbook?sort_by=pending", None)
        .await;
    assert_eq!(pending["data"]["current_sort"], "pending");
    let order: Vec<&str> = pending["data"]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["job_id"].as_str().unwrap())
        .collect();
    assert_eq!(order, ["JOB-C", "JOB-B", "JOB-A"]);
    assert_eq!(pending["data"]["tasks"][0]["pending"], true);
    assert_eq!(pending["data"]["tasks"][2]["property_name"], "Beech Villa");

    let fallback = app
        .ok(Method::GET, "/api/v1/logbook?sort_by=colour", None)
        .await;
    assert_eq!(fallback["data"]["current_sort"], "job_id_asc");
    assert_eq!(fallback["data"]["tasks"][0]["job_id"], "JOB-A");
}

#[tokio::test]
async fn task_photos_are_grouped_and_removed_with_the_task() {
    let app = TestApp::new().await;
    let property_id = app.create_property("Holly Court", json!({})).await;
    let tenant_id = app.create_tenant("Sam", "Reid").await;
    let task_id = create_task(&app, &property_id, "JOB-77", json!({ "tenant_id": tenant_id })).await;
    let uri = format!("/api/v1/tasks/{}/images", task_id);

    let not_image = app
        .post_multipart(
            &uri,
            &[
                Part::File("image", "invoice.pdf", b"%PDF"),
                Part::Text("image_type", "dominic"),
            ],
        )
        .await;
    assert_eq!(not_image.status(), StatusCode::BAD_REQUEST);

    let bad_type = app
        .post_multipart(
            &uri,
            &[
                Part::File("image", "sink.png", b"\x89PNG"),
                Part::Text("image_type", "after"),
            ],
        )
        .await;
    assert_eq!(bad_type.status(), StatusCode::BAD_REQUEST);
    assert!(app.storage.is_empty());

    for (file, stage) in [("before.png", "pre-inspection"), ("done.jpg", "confirmation")] {
        let response = app
            .post_multipart(
                &uri,
                &[
                    Part::File("image", file, b"\x89PNG"),
                    Part::Text("image_type", stage),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let record = app
        .ok(Method::GET, &format!("/api/v1/tasks/{}", task_id), None)
        .await;
    assert_eq!(record["data"]["tenant_name"], "Sam Reid");
    assert_eq!(record["data"]["pre_inspection_images"].as_array().unwrap().len(), 1);
    assert!(record["data"]["dominic_images"].as_array().unwrap().is_empty());
    assert_eq!(record["data"]["confirmation_images"].as_array().unwrap().len(), 1);
    assert_eq!(app.storage.len(), 2);

    let deleted = app
        .ok(Method::DELETE, &format!("/api/v1/tasks/{}", task_id), None)
        .await;
    assert_eq!(deleted["message"], "Task deleted successfully.");
    assert!(app.storage.is_empty());
}
