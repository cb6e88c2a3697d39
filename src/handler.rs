use std::sync::Arc;

use axum::{
    Json, Router,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::APIResponse;
use crate::fallback::SpaFallback;

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(APIResponse::new_from_msg("ok"))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(APIResponse::new_from_msg("not found")))
}

pub fn api_routes() -> Router {
    Router::new().route("/health", get(healthcheck))
}

/// Builds the full router: API routes under the configured prefix, a JSON 404
/// for everything else, and the SPA fallback wrapped around both.
pub fn app(fallback: Arc<SpaFallback>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let router = Router::new()
        .nest(fallback.api_prefix(), api_routes())
        .fallback(not_found);

    fallback.mount(router).layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn project(with_index: bool) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let base_dir = temp_dir.path().join("Backend");
        std::fs::create_dir_all(&base_dir).unwrap();
        if with_index {
            let build = temp_dir.path().join("Frontend/build");
            std::fs::create_dir_all(&build).unwrap();
            std::fs::write(build.join("index.html"), "<html>App</html>").unwrap();
        }
        (temp_dir, base_dir)
    }

    async fn get_path(app: Router, path: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_healthcheck() {
        let (_tmp, base_dir) = project(false);
        let app = app(Arc::new(SpaFallback::new(&base_dir)));

        let (status, body) = get_path(app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_unknown_api_route_is_json_404() {
        let (_tmp, base_dir) = project(true);

        let app = app(Arc::new(SpaFallback::new(&base_dir)));
        let (status, body) = get_path(app, "/api/users").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, r#"{"status":"not found"}"#);
    }

    #[tokio::test]
    async fn test_frontend_route_gets_index() {
        let (_tmp, base_dir) = project(true);

        let response = app(Arc::new(SpaFallback::new(&base_dir)))
            .oneshot(Request::builder().uri("/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
    }

    #[tokio::test]
    async fn test_app_from_config_with_custom_prefix() {
        let (_tmp, base_dir) = project(true);
        let yaml = format!(
            "app:\n  port: 8000\n  base_dir: {}\n  api_prefix: /v1\n",
            base_dir.display()
        );
        let cfg = crate::config::Config::from_yaml(&yaml).unwrap();
        let fallback = Arc::new(SpaFallback::from_config(&cfg.app));

        let (status, body) = get_path(app(fallback.clone()), "/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok"}"#);

        let (status, body) = get_path(app(fallback), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<html>App</html>");
    }

    #[tokio::test]
    async fn test_frontend_route_without_build_is_404() {
        let (_tmp, base_dir) = project(false);
        let app = app(Arc::new(SpaFallback::new(&base_dir)));

        let (status, body) = get_path(app, "/dashboard").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, r#"{"status":"not found"}"#);
    }
}
