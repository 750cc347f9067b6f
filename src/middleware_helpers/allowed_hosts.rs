use crate::{config::AppConfig, errors::ServiceError};
use axum::{
    extract::{Request, State},
    http::header::HOST,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Host names the service answers for.
///
/// Entries match exactly, `.example.com` also matches any subdomain and `*`
/// matches everything. Ports are ignored.
#[derive(Debug, Clone)]
pub struct AllowedHosts {
    patterns: Vec<String>,
}

impl AllowedHosts {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Local development hosts accepted when debug is on and nothing is configured.
    pub fn local_development() -> Self {
        Self::new(vec![
            "localhost".to_string(),
            "127.0.0.1".to_string(),
            "[::1]".to_string(),
        ])
    }

    /// Host check for `config`; `None` when no check applies.
    ///
    /// An explicit `allowed_hosts` list always wins. With nothing configured,
    /// debug mode only answers on loopback names and other modes skip the check.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let configured = config.allowed_host_list();
        if !configured.is_empty() {
            Some(Self::new(configured))
        } else if config.debug {
            Some(Self::local_development())
        } else {
            None
        }
    }

    pub fn is_allowed(&self, host_header: &str) -> bool {
        let host = strip_port(host_header.trim()).to_ascii_lowercase();
        if host.is_empty() {
            return false;
        }

        self.patterns.iter().any(|pattern| {
            if pattern == "*" {
                true
            } else if let Some(domain) = pattern.strip_prefix('.') {
                host == domain || host.ends_with(pattern.as_str())
            } else {
                host == *pattern
            }
        })
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal, keep the brackets
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Rejects requests whose Host header is not in the configured list.
pub async fn allowed_hosts_middleware(
    State(allowed): State<Arc<AllowedHosts>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().host().map(str::to_string))
        .unwrap_or_default();

    if !allowed.is_allowed(&host) {
        tracing::warn!(host = %host, "rejected request for disallowed host");
        return ServiceError::BadRequest(format!("Invalid HTTP_HOST header: '{}'", host))
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use rstest::rstest;
    use tower::ServiceExt;

    #[rstest]
    #[case("pynnacle.example", true)]
    #[case("pynnacle.example:8080", true)]
    #[case("PYNNACLE.EXAMPLE", true)]
    #[case("files.lettings.example", true)]
    #[case("lettings.example", true)]
    #[case("evil.example", false)]
    #[case("", false)]
    fn host_matching(#[case] host: &str, #[case] expected: bool) {
        let allowed = AllowedHosts::new(vec![
            "pynnacle.example".to_string(),
            ".lettings.example".to_string(),
        ]);
        assert_eq!(allowed.is_allowed(host), expected);
    }

    #[test]
    fn ipv6_literal_port_is_stripped() {
        let allowed = AllowedHosts::local_development();
        assert!(allowed.is_allowed("[::1]:8080"));
        assert!(allowed.is_allowed("localhost:3000"));
    }

    #[test]
    fn debug_only_narrows_hosts_when_none_are_configured() {
        let mut config = AppConfig::new(
            "sqlite://pynnacle.db?mode=memory".into(),
            "unused".into(),
            3600,
            "127.0.0.1".into(),
            8080,
            "development".into(),
        );
        assert!(AllowedHosts::from_config(&config).is_none());

        config.debug = true;
        let local = AllowedHosts::from_config(&config).unwrap();
        assert!(local.is_allowed("localhost:8000"));
        assert!(!local.is_allowed("pynnacle.example"));

        config.allowed_hosts = Some("pynnacle.example".into());
        let configured = AllowedHosts::from_config(&config).unwrap();
        assert!(configured.is_allowed("pynnacle.example"));
        assert!(!configured.is_allowed("localhost"));
    }

    #[tokio::test]
    async fn middleware_rejects_unknown_host() {
        let allowed = Arc::new(AllowedHosts::new(vec!["pynnacle.example".to_string()]));
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                allowed,
                allowed_hosts_middleware,
            ));

        let ok = app
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .header(HOST, "pynnacle.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let rejected = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .header(HOST, "attacker.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    }
}
