//! API route definitions
//!
//! - /api/v1/status - Buffer and ingestion counters
//! - /api/v1/window - Buffer snapshot (GET) or reset (DELETE)
//! - /api/v1/analysis - Spectral, wavelet and statistical report

use axum::{routing::get, Router};

use super::handlers::{self, ApiState};

/// Versioned API routes, nested under `/api/v1`
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(handlers::get_status))
        .route(
            "/window",
            get(handlers::get_window).delete(handlers::clear_window),
        )
        .route("/analysis", get(handlers::get_analysis))
        .with_state(state)
}

/// Liveness endpoint at root level
pub fn health_routes() -> Router {
    Router::new().route("/health", get(handlers::get_health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::pipeline::{IngestionStats, WindowBuffer};
    use crate::types::VibrationSample;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use std::f64::consts::PI;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state(samples: usize) -> ApiState {
        let buffer = Arc::new(WindowBuffer::new(1000));
        for i in 0..samples {
            let t = i as f64 / 1600.0;
            buffer.append(VibrationSample::new((2.0 * PI * 100.0 * t).sin(), 0.0, 1.0));
        }
        ApiState::new(
            buffer,
            Arc::new(IngestionStats::default()),
            AnalysisConfig::default(),
            256,
        )
    }

    async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(health_routes(), Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_counts_buffer() {
        let app = api_routes(create_test_state(10));
        let (status, body) = call(app, Method::GET, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["buffered"], 10);
        assert_eq!(body["data"]["capacity"], 1000);
        assert_eq!(body["data"]["accepted"], 0);
    }

    #[tokio::test]
    async fn test_window_default_and_explicit_count() {
        let state = create_test_state(300);

        let (status, body) = call(api_routes(state.clone()), Method::GET, "/window").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["count"], 256);

        let (_, body) = call(api_routes(state.clone()), Method::GET, "/window?count=5").await;
        assert_eq!(body["data"]["count"], 5);
        assert_eq!(body["data"]["samples"].as_array().unwrap().len(), 5);

        let (status, body) = call(api_routes(state), Method::GET, "/window?count=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_clear_window() {
        let state = create_test_state(20);
        let (status, body) = call(api_routes(state.clone()), Method::DELETE, "/window").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["cleared"], 20);
        assert!(state.buffer.is_empty());
    }

    #[tokio::test]
    async fn test_analysis_report() {
        let app = api_routes(create_test_state(500));
        let (status, body) = call(app, Method::GET, "/analysis?axis=x&count=400").await;
        assert_eq!(status, StatusCode::OK);

        let report = &body["data"];
        assert_eq!(report["axis"], "x");
        assert_eq!(report["sample_count"], 400);
        assert_eq!(report["window"]["status"], "complete");
        assert!(report["spectrum"]["ok"]["magnitudes"].is_array());
        assert_eq!(
            report["wavelet"]["ok"]["coefficients"].as_array().unwrap().len(),
            5
        );
        assert!((report["peak"]["frequency"].as_f64().unwrap() - 100.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_analysis_short_buffer_is_incomplete() {
        let app = api_routes(create_test_state(100));
        let (status, body) = call(app, Method::GET, "/analysis?count=400").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["sample_count"], 100);
        assert_eq!(body["data"]["window"]["status"], "incomplete");
        assert_eq!(body["data"]["window"]["reason"], "insufficient_data");
    }

    #[tokio::test]
    async fn test_analysis_empty_buffer_unavailable() {
        let app = api_routes(create_test_state(0));
        let (status, body) = call(app, Method::GET, "/analysis").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_analysis_bad_axis() {
        let app = api_routes(create_test_state(50));
        let (status, _) = call(app, Method::GET, "/analysis?axis=w").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
