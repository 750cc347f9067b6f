mod common;

use axum::http::Method;
use chrono::{Datelike, Duration, Utc};
use common::TestApp;
use serde_json::{json, Value};

fn names(bucket: &Value) -> Vec<(String, String)> {
    bucket
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["property_name"].as_str().unwrap().to_string(),
                e["certificate_type"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn certificates_are_bucketed_relative_to_today() {
    let app = TestApp::new().await;
    let today = Utc::now().date_naive();

    app.create_property(
        "Oak House",
        json!({
            "gas_certificate_expiry_date": (today - Duration::days(1)).to_string(),
            "electric_certificate_expiry_date": today.to_string(),
            "epc_certificate_expiry_date": (today + Duration::days(7)).to_string(),
            "fra_certificate_expiry_date": (today + Duration::days(8)).to_string(),
        }),
    )
    .await;
    app.create_property("Bare Cottage", json!({})).await;

    let dashboard = app.ok(Method::GET, "/api/v1/dashboard", None).await;
    let data = &dashboard["data"];

    assert_eq!(
        names(&data["expired"]),
        [("Oak House".to_string(), "Gas Certificate".to_string())]
    );
    assert_eq!(
        names(&data["due_today"]),
        [("Oak House".to_string(), "Electric Certificate".to_string())]
    );
    assert_eq!(
        names(&data["expiring_soon"]),
        [("Oak House".to_string(), "EPC Certificate".to_string())]
    );
    assert_eq!(data["today"], today.to_string());
    assert_eq!(data["selected_month"], today.month());
    assert_eq!(data["selected_year"], today.year());
    assert_eq!(data["months"].as_array().unwrap().len(), 12);
    assert!(data["notices"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn month_filter_selects_certificates_in_that_month() {
    let app = TestApp::new().await;
    app.create_property(
        "Elm Court",
        json!({
            "gas_certificate_expiry_date": "2031-05-14",
            "building_insurance_expiry_date": "2031-05-02",
            "epc_certificate_expiry_date": "2031-06-01",
        }),
    )
    .await;

    let dashboard = app
        .ok(Method::GET, "/api/v1/dashboard?month=5&year=2031", None)
        .await;
    let data = &dashboard["data"];
    assert_eq!(data["selected_month_name"], "May");
    let filtered = names(&data["month_filtered"]);
    assert_eq!(
        filtered,
        [
            ("Elm Court".to_string(), "Building Insurance".to_string()),
            ("Elm Court".to_string(), "Gas Certificate".to_string()),
        ]
    );
}

#[tokio::test]
async fn invalid_period_falls_back_to_current_month() {
    let app = TestApp::new().await;
    let today = Utc::now().date_naive();

    for query in ["month=13&year=2031", "month=may&year=2031", "month=5&year=1800"] {
        let dashboard = app
            .ok(Method::GET, &format!("/api/v1/dashboard?{}", query), None)
            .await;
        let data = &dashboard["data"];
        assert_eq!(data["selected_month"], today.month(), "{}", query);
        assert_eq!(
            data["notices"],
            json!(["Invalid month or year selected for filtering."])
        );
    }

    // half a pair is not a selection and not an error
    let partial = app
        .ok(Method::GET, "/api/v1/dashboard?month=5", None)
        .await;
    assert!(partial["data"]["notices"].as_array().unwrap().is_empty());
}
