pub mod cors;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::WebConfig;
use state::AppState;

/// Turns a panic that escaped a handler into `500 {"detail": ...}`.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Unhandled error in request: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": detail })),
    )
        .into_response()
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors::cors_layer(&state.config.web);

    Router::new()
        .merge(routes::root_routes())
        .merge(routes::api_routes())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub async fn run_server(config: WebConfig, state: Arc<AppState>) -> std::io::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{FakeLlm, RecordingExecutor};
    use crate::agent::SqlAgent;
    use crate::config::{AppConfig, CliArgs};
    use crate::db::executor::tests::seeded_executor;
    use crate::db::executor::{QueryOutcome, SqlExecutor};
    use crate::llm::TextGenerator;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_config() -> AppConfig {
        AppConfig::from_sources(
            &CliArgs::default(),
            Some(":memory:".to_string()),
            Some("test-key".to_string()),
        )
        .unwrap()
    }

    fn test_app(llm: Arc<dyn TextGenerator>, executor: Arc<dyn SqlExecutor>) -> Router {
        let state = AppState::new(test_config(), SqlAgent::new(llm, executor));
        build_router(Arc::new(state))
    }

    fn chat_request(message: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "message": message }).to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn show_all_users_returns_table() {
        let app = test_app(
            Arc::new(FakeLlm::answering("SELECT * FROM users;")),
            Arc::new(seeded_executor()),
        );

        let (status, body) = send(app, chat_request("Show me all users")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["columns"], json!(["id", "name", "email", "created_at"]));
        assert_eq!(body["rows"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn write_returns_confirmation_message() {
        let app = test_app(
            Arc::new(FakeLlm::answering(
                "INSERT INTO users (id, name, email, created_at) VALUES (3, 'Alice', 'alice@example.com', TIMESTAMP '2024-03-01 10:00:00');",
            )),
            Arc::new(seeded_executor()),
        );

        let (status, body) = send(app, chat_request("Add Alice")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "statement executed successfully" }));
    }

    #[tokio::test]
    async fn database_failure_is_a_200_error_payload() {
        let app = test_app(
            Arc::new(FakeLlm::answering("SELECT nickname FROM users;")),
            Arc::new(seeded_executor()),
        );

        let (status, body) = send(app, chat_request("nicknames please")).await;

        assert_eq!(status, StatusCode::OK);
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with("database error: "), "{error}");
    }

    #[tokio::test]
    async fn unsafe_statement_is_rejected_before_execution() {
        fn unreachable_rows() -> Result<QueryOutcome, crate::db::executor::DbError> {
            Ok(QueryOutcome::Executed { affected: 0 })
        }
        let executor = Arc::new(RecordingExecutor::new(unreachable_rows));
        let app = test_app(
            Arc::new(FakeLlm::answering("DROP TABLE users;")),
            executor.clone(),
        );

        let (status, body) = send(app, chat_request("drop the users table")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "error": "generated statement contains disallowed operations; only SELECT/INSERT/UPDATE/DELETE permitted" })
        );
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn generation_failure_is_a_200_error_payload() {
        let app = test_app(
            Arc::new(FakeLlm::failing("quota exceeded")),
            Arc::new(seeded_executor()),
        );

        let (status, body) = send(app, chat_request("Show me all users")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "error": "unexpected error: LLM response error: quota exceeded" })
        );
    }

    #[tokio::test]
    async fn escaped_panic_becomes_500_detail() {
        let app = test_app(Arc::new(FakeLlm::panicking()), Arc::new(seeded_executor()));

        let (status, body) = send(app, chat_request("anything")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "detail": "model client blew up" }));
    }

    #[tokio::test]
    async fn root_is_a_health_check() {
        let app = test_app(Arc::new(FakeLlm::answering("")), Arc::new(seeded_executor()));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Welcome to the SQL Chat API!" }));
    }

    #[tokio::test]
    async fn status_reports_model_and_version() {
        let app = test_app(Arc::new(FakeLlm::answering("")), Arc::new(seeded_executor()));
        let request = Request::builder().uri("/api/status").body(Body::empty()).unwrap();

        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], "fake-model");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn preflight_mirrors_request_with_credentials() {
        let app = test_app(Arc::new(FakeLlm::answering("")), Arc::new(seeded_executor()));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/chat")
            .header(header::ORIGIN, "http://localhost:8000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let headers = response.headers();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:8000"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "600");
    }

    #[tokio::test]
    async fn preflight_from_unknown_origin_is_not_allowed() {
        let app = test_app(Arc::new(FakeLlm::answering("")), Arc::new(seeded_executor()));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/chat")
            .header(header::ORIGIN, "http://evil.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
