//! CORS policy at the gateway edge.
//!
//! Only installed when `CORS_ALLOWED_ORIGINS` is set. Without it the gateway
//! does not speak CORS at all: `OPTIONS` requests go through the authentication
//! filter (which lets them pass untouched) and are answered by the upstream.
//!
//! With an allowlist the layer owns every `OPTIONS` request, so preflights are
//! answered here and never reach the upstream.
//!
//! Policy:
//! - Exact-match allowlist from `CORS_ALLOWED_ORIGINS`, WITHOUT credentials.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::middleware::http::REQUEST_ID_HEADER;

pub fn apply(router: Router, config: &Config) -> Router {
    match layer(config) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn layer(config: &Config) -> Option<CorsLayer> {
    if config.cors_allowed_origins.is_empty() {
        return None;
    }

    let allowed: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _req| allowed.iter().any(|v| v == origin),
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(std::time::Duration::from_secs(60 * 10));

    Some(cors)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use url::Url;

    use super::*;
    use crate::config::AppEnv;
    use crate::services::auth::AuthorizationPolicy;

    fn config(origins: &[&str]) -> Config {
        Config {
            addr: "127.0.0.1:0".parse().unwrap(),
            app_env: AppEnv::Production,
            cors_allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
            jwt_secret: "fixture-secret-fixture-secret-0123456789".to_string(),
            jwt_leeway_seconds: 0,
            excluded_paths: Vec::new(),
            access_policy: AuthorizationPolicy::employer_default(),
            upstream_base_url: Url::parse("http://127.0.0.1:9").unwrap(),
            request_timeout: Duration::from_secs(5),
            request_body_limit_bytes: 1024,
        }
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::options("/api/vacancies")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    }

    // Stands in for the rest of the gateway.
    fn router() -> Router {
        Router::new().fallback(|| async { StatusCode::IM_A_TEAPOT })
    }

    #[test]
    fn no_allowlist_means_no_layer() {
        assert!(layer(&config(&[])).is_none());
    }

    #[tokio::test]
    async fn unconfigured_gateway_passes_preflight_through() {
        let response = apply(router(), &config(&[]))
            .oneshot(preflight("https://app.example.com"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn allowlisted_origin_preflight_is_answered_here() {
        let response = apply(router(), &config(&["https://app.example.com"]))
            .oneshot(preflight("https://app.example.com"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
    }

    #[tokio::test]
    async fn unlisted_origin_gets_no_allow_origin() {
        let response = apply(router(), &config(&["https://app.example.com"]))
            .oneshot(preflight("https://evil.example.com"))
            .await
            .unwrap();

        assert!(
            !response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }
}
