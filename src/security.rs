use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, warn};

use crate::config::SecurityConfig;

const X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Headers attached to every response.
const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (X_XSS_PROTECTION, "1; mode=block"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (
        header::CONTENT_SECURITY_POLICY,
        "default-src 'self'; object-src 'none'",
    ),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
];

/// Decorates every response with the security header set and the
/// configured CORS origin. When `force_https` is on, plain-HTTP requests
/// are redirected first.
pub async fn apply_security_headers(
    State(config): State<SecurityConfig>,
    request: Request,
    next: Next,
) -> Response<Body> {
    let mut response = match https_redirect(&config, &request) {
        Some(redirect) => redirect,
        None => next.run(request).await,
    };

    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin_value(&config));
    response
}

fn https_redirect(config: &SecurityConfig, request: &Request) -> Option<Response<Body>> {
    if !config.force_https || is_https(request) {
        return None;
    }
    let Some(host) = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
    else {
        warn!(uri = %request.uri(), "cannot redirect to https without a host");
        return None;
    };
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = format!("https://{host}{path}");
    debug!(%target, "redirecting to https");
    Some(
        (
            StatusCode::FOUND,
            [(header::LOCATION, target)],
        )
            .into_response(),
    )
}

fn is_https(request: &Request) -> bool {
    request.uri().scheme_str() == Some("https")
        || request
            .headers()
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

fn allow_origin_value(config: &SecurityConfig) -> HeaderValue {
    HeaderValue::from_str(&config.allowed_origin).unwrap_or_else(|e| {
        warn!(error = %e, origin = %config.allowed_origin, "invalid allowed origin; using *");
        HeaderValue::from_static("*")
    })
}

/// Answers CORS preflight requests.
pub fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    let origin = match allow_origin_value(config) {
        value if value == "*" => AllowOrigin::any(),
        value => AllowOrigin::exact(value),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::Request as HttpRequest, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    fn app(config: SecurityConfig) -> Router {
        Router::new()
            .route("/test", get(|| async { "test response" }))
            .fallback(|| async { StatusCode::NOT_FOUND })
            .layer(cors_layer(&config))
            .layer(from_fn_with_state(config.clone(), apply_security_headers))
    }

    fn plain_http() -> SecurityConfig {
        SecurityConfig {
            force_https: false,
            ..SecurityConfig::default()
        }
    }

    fn assert_fixed_headers(response: &Response<Body>) {
        let headers = response.headers();
        assert_eq!(headers.get("X-Frame-Options").unwrap(), "SAMEORIGIN");
        assert_eq!(headers.get("X-XSS-Protection").unwrap(), "1; mode=block");
        assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
        assert_eq!(
            headers.get("Content-Security-Policy").unwrap(),
            "default-src 'self'; object-src 'none'"
        );
        assert_eq!(
            headers.get("Referrer-Policy").unwrap(),
            "strict-origin-when-cross-origin"
        );
        assert_eq!(headers.get("Access-Control-Allow-Origin").unwrap(), "*");
    }

    #[tokio::test]
    async fn adds_headers_to_success_responses() {
        let response = app(plain_http())
            .oneshot(HttpRequest::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_fixed_headers(&response);
    }

    #[tokio::test]
    async fn adds_headers_to_unmatched_routes() {
        let response = app(plain_http())
            .oneshot(HttpRequest::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_fixed_headers(&response);
    }

    #[tokio::test]
    async fn force_https_redirects_plain_http() {
        let response = app(SecurityConfig::default())
            .oneshot(
                HttpRequest::builder()
                    .uri("/test?x=1")
                    .header(header::HOST, "accounts.local")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://accounts.local/test?x=1"
        );
        assert_fixed_headers(&response);
    }

    #[tokio::test]
    async fn force_https_serves_forwarded_https() {
        let response = app(SecurityConfig::default())
            .oneshot(
                HttpRequest::builder()
                    .uri("/test")
                    .header(header::HOST, "accounts.local")
                    .header("X-Forwarded-Proto", "https")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_fixed_headers(&response);
    }

    #[tokio::test]
    async fn exact_origin_is_echoed() {
        let config = SecurityConfig {
            force_https: false,
            allowed_origin: "https://shop.example".into(),
        };
        let response = app(config)
            .oneshot(
                HttpRequest::builder()
                    .uri("/test")
                    .header(header::ORIGIN, "https://shop.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://shop.example"
        );
    }
}
