/// CORS layer
///
/// A `*` entry mirrors the request origin. Configuration refuses `*` together
/// with credentials, since that would hand the session cookie to any site.

use axum::http::{HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::CorsConfig;

/// Builds the CORS layer from configuration
///
/// Entries that do not parse are skipped with a warning.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        if config.allow_credentials {
            warn!("Wildcard CORS origin with credentials exposes sessions to every origin");
        }
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(parse_all::<HeaderValue>(&config.allowed_origins, "origin"))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(parse_all::<Method>(&config.allowed_methods, "method"))
        .allow_headers(parse_all::<HeaderName>(&config.allowed_headers, "header"))
        .allow_credentials(config.allow_credentials)
        .max_age(Duration::from_secs(config.max_age_seconds))
}

fn parse_all<T: std::str::FromStr>(values: &[String], what: &str) -> Vec<T> {
    values
        .iter()
        .filter_map(|value| match value.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!(value = %value, kind = what, "Ignoring invalid CORS entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::Request, http::header, routing::get, Router};
    use tower::ServiceExt;

    fn app(config: &CorsConfig) -> Router {
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(cors_layer(config))
    }

    async fn preflight(config: &CorsConfig, origin: &str) -> axum::http::HeaderMap {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/health")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();

        app(config).oneshot(request).await.unwrap().headers().clone()
    }

    #[tokio::test]
    async fn test_allowed_origin_with_credentials() {
        let headers = preflight(&CorsConfig::default(), "http://localhost:3000").await;

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
        let methods = headers
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(methods.contains("PUT"));
    }

    #[tokio::test]
    async fn test_unknown_origin_not_echoed() {
        let headers = preflight(&CorsConfig::default(), "https://evil.example").await;
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_wildcard_mirrors_origin() {
        let config = CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
            ..Default::default()
        };
        let headers = preflight(&config, "https://app.rios.com").await;

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.rios.com"
        );
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }
}
