use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::health;
use super::middleware::metrics_middleware;
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create the full router with application state
///
/// The metrics endpoint is merged only when a Prometheus recorder was installed.
pub fn create_router(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    if let Some(m) = metrics {
        router = router.merge(create_metrics_router(m));
    }

    router
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::geo::{
        AddressSuggestion, Coordinates, GeoLocation, MockGeoProvider, StructuredAddress,
    };
    use crate::domain::DomainError;
    use crate::infrastructure::embedding::EmbeddingStrategy;
    use crate::infrastructure::geo_cache::InMemoryGeoCache;
    use crate::infrastructure::services::{GeocodingService, GeocodingServiceConfig};

    fn shaniwar_wada() -> GeoLocation {
        GeoLocation::new(
            Coordinates::new(18.5195, 73.8553).unwrap(),
            "Shaniwar Wada, Shaniwar Peth, Pune",
        )
        .with_address(
            StructuredAddress::new()
                .with_area("Shaniwar Peth")
                .with_city("Pune"),
        )
    }

    fn app(geo: MockGeoProvider) -> Router {
        let service = GeocodingService::with_config(
            Arc::new(InMemoryGeoCache::new(100)),
            Arc::new(geo),
            EmbeddingStrategy::fallback_only(64),
            GeocodingServiceConfig::default().with_lookup_timeout(Duration::from_millis(200)),
        );

        create_router(AppState::new(Arc::new(service)), None)
    }

    fn resolving_provider() -> MockGeoProvider {
        let mut geo = MockGeoProvider::new();
        geo.expect_geocode()
            .returning(|address| {
                if address.contains("Wada") {
                    Ok(Some(shaniwar_wada()))
                } else {
                    Ok(None)
                }
            });
        geo.expect_reverse_geocode()
            .returning(|_| Ok(Some(shaniwar_wada())));
        geo.expect_autocomplete().returning(|_, _| {
            Ok(vec![AddressSuggestion {
                display_name: "Shaniwar Wada, Pune".to_string(),
                address: StructuredAddress::default(),
            }])
        });
        geo.expect_provider_name().return_const("mock");
        geo
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = app(MockGeoProvider::new());

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&app, Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"][0]["name"], "geo_cache");

        let (status, _) = send(&app, Method::GET, "/live", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_geocode_provider_then_cache() {
        let app = app(resolving_provider());
        let body = serde_json::json!({"address": "Shaniwar Wada, Pune"});

        let (status, first) = send(&app, Method::POST, "/v1/geocode", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["source"], "provider");
        assert_eq!(first["coordinates"]["lat"], 18.5195);
        assert_eq!(first["address"]["city"], "Pune");

        let (status, second) = send(&app, Method::POST, "/v1/geocode", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["source"], "cache");
    }

    #[tokio::test]
    async fn test_geocode_miss_is_404() {
        let app = app(resolving_provider());

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/geocode",
            Some(serde_json::json!({"address": "Atlantis"})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "no_match");
    }

    #[tokio::test]
    async fn test_geocode_blank_address_is_400() {
        let app = app(MockGeoProvider::new());

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/geocode",
            Some(serde_json::json!({"address": "  "})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["param"], "address");
    }

    #[tokio::test]
    async fn test_geocode_malformed_body_is_json_error() {
        let app = app(MockGeoProvider::new());

        let (status, body) =
            send(&app, Method::POST, "/v1/geocode", Some(serde_json::json!({"addr": 1}))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "json_parse_error");
    }

    #[tokio::test]
    async fn test_reverse_geocode() {
        let app = app(resolving_provider());
        let body = serde_json::json!({"lat": 18.5195, "lng": 73.8553});

        let (status, first) = send(&app, Method::POST, "/v1/reverse", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["source"], "provider");

        let nearby = serde_json::json!({"lat": 18.5198, "lng": 73.8554});
        let (status, second) = send(&app, Method::POST, "/v1/reverse", Some(nearby)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["source"], "cache");
    }

    #[tokio::test]
    async fn test_reverse_out_of_range_is_400() {
        let app = app(MockGeoProvider::new());

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/reverse",
            Some(serde_json::json!({"lat": 18.5, "lng": 190.0})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_autocomplete() {
        let app = app(resolving_provider());

        let (status, body) =
            send(&app, Method::GET, "/v1/autocomplete?q=Shaniwar", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestions"][0]["display_name"], "Shaniwar Wada, Pune");
    }

    #[tokio::test]
    async fn test_cache_admin_endpoints() {
        let app = app(resolving_provider());
        send(
            &app,
            Method::POST,
            "/v1/geocode",
            Some(serde_json::json!({"address": "Shaniwar Wada"})),
        )
        .await;

        let (status, stats) = send(&app, Method::GET, "/v1/cache/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["entries"], 1);
        assert_eq!(stats["misses"], 1);

        let (status, cleanup) = send(&app, Method::POST, "/v1/cache/cleanup", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleanup["removed"], 0);

        let (status, _) = send(&app, Method::DELETE, "/v1/cache", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, stats) = send(&app, Method::GET, "/v1/cache/stats", None).await;
        assert_eq!(stats["entries"], 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_404_not_500() {
        let mut geo = MockGeoProvider::new();
        geo.expect_geocode()
            .returning(|_| Err(DomainError::provider("mock", "connection refused")));
        geo.expect_provider_name().return_const("mock");
        let app = app(geo);

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/geocode",
            Some(serde_json::json!({"address": "Shaniwar Wada"})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
