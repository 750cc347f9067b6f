#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use pynnacle_api::{
    auth::{hash_password, user},
    config::AppConfig,
    db,
    logging::discard_logger,
    storage::InMemoryFileStorage,
    AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str =
    "Qm9vdHN0cmFwLXNlY3JldC1mb3ItaW50ZWdyYXRpb24tdGVzdHMtb25seS1yb3RhdGUtaW4tcHJvZC00MjE";
pub const STAFF_USERNAME: &str = "ruth";
pub const STAFF_PASSWORD: &str = "correct horse battery staple";

const BOUNDARY: &str = "pynnacle-test-boundary";

/// One part of a multipart request body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Full router over a throwaway SQLite file and in-memory file storage.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub storage: Arc<InMemoryFileStorage>,
    token: String,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir for test database");
        let db_path = db_dir.path().join("test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.storage.backend = "memory".to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let password_hash = hash_password(STAFF_PASSWORD).expect("hash test password");
        user::upsert_account(&pool, STAFF_USERNAME, "ruth@pynnacle.test", password_hash)
            .await
            .expect("seed staff account");

        let storage = Arc::new(InMemoryFileStorage::new("/media"));
        let state = AppState::new(Arc::new(pool), cfg, storage.clone(), &discard_logger());
        let router = pynnacle_api::app_router(state.clone());

        let mut app = Self {
            router,
            state,
            storage,
            token: String::new(),
            _db_dir: db_dir,
        };
        app.token = app.login(STAFF_USERNAME, STAFF_PASSWORD).await;
        app
    }

    /// Signs in through the API and returns the bearer token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/login",
                Some(json!({ "username": username, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login should succeed");
        let body = response_json(response).await;
        body["data"]["access_token"]
            .as_str()
            .expect("access token in login response")
            .to_string()
    }

    /// Access the bearer token for the seeded staff account.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Authenticated JSON request that must succeed; returns the envelope.
    pub async fn ok(&self, method: Method, uri: &str, body: Option<Value>) -> Value {
        let response = self.request_authenticated(method.clone(), uri, body).await;
        let status = response.status();
        let json = response_json(response).await;
        assert_eq!(status, StatusCode::OK, "{} {} failed: {}", method, uri, json);
        json
    }

    /// Authenticated multipart POST.
    pub async fn post_multipart(&self, uri: &str, parts: &[Part<'_>]) -> Response {
        let mut payload = Vec::new();
        for part in parts {
            payload.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    payload.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    payload.extend_from_slice(value.as_bytes());
                }
                Part::File(name, file_name, bytes) => {
                    payload.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                            name, file_name
                        )
                        .as_bytes(),
                    );
                    payload.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
                    payload.extend_from_slice(bytes);
                }
            }
            payload.extend_from_slice(b"\r\n");
        }
        payload.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.token()))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(payload))
            .expect("failed to build multipart request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Creates a property and returns its id.
    pub async fn create_property(&self, name: &str, extra: Value) -> String {
        let mut body = json!({
            "name": name,
            "address": format!("{} Street", name),
            "postcode": "M1 1AA",
            "property_type": "house",
        });
        if let (Some(target), Some(fields)) = (body.as_object_mut(), extra.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        let created = self.ok(Method::POST, "/api/v1/properties", Some(body)).await;
        created["data"]["id"].as_str().expect("property id").to_string()
    }

    /// Creates a tenant and returns its id.
    pub async fn create_tenant(&self, first_name: &str, last_name: &str) -> String {
        let created = self
            .ok(
                Method::POST,
                "/api/v1/tenants",
                Some(json!({
                    "first_name": first_name,
                    "last_name": last_name,
                    "phone": "07700900000",
                    "email": format!("{}@example.com", first_name.to_lowercase()),
                    "address": "1 Test Road",
                    "postcode": "M2 2BB",
                })),
            )
            .await;
        created["data"]["id"].as_str().expect("tenant id").to_string()
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
