//! HTTP API server.
//!
//! Exposes summary, quiz and topic generation as JSON endpoints.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::TubetalkError;
use crate::orchestrator::Orchestrator;
use crate::study::{Quiz, SummaryReport, TopicOutline, VideoSummary};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    preflight::check(Operation::Generate)?;

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Orchestrator::new(settings)?;
    let app = router(Arc::new(AppState { orchestrator }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("TubeTalk API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Summary", "POST /summarize");
    Output::kv("Quiz", "POST /quiz");
    Output::kv("Topics", "POST /topics");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/summarize", post(summarize))
        .route("/quiz", post(quiz))
        .route("/topics", post(topics))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct VideoRequest {
    input_url: String,
    /// Cache the result under this thread.
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    regenerate: bool,
}

#[derive(Serialize)]
struct SummarizeResponse {
    summary: SummaryReport,
    parsed_output: VideoSummary,
    model_response: Option<String>,
}

#[derive(Serialize)]
struct QuizResponse {
    response: Quiz,
}

#[derive(Serialize)]
struct TopicsResponse {
    topics: TopicOutline,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(e: TubetalkError) -> Response {
    let status = match &e {
        TubetalkError::InvalidUrl(_) | TubetalkError::MissingInput(_) => StatusCode::BAD_REQUEST,
        TubetalkError::TranscriptFetch(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TubetalkError::ThreadVideoMismatch { .. } => StatusCode::CONFLICT,
        TubetalkError::MalformedResponse(_) | TubetalkError::OpenAI(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("Request failed ({}): {}", status, e);
    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn summarize(State(state): State<Arc<AppState>>, Json(req): Json<VideoRequest>) -> Response {
    match state
        .orchestrator
        .summary(&req.input_url, req.thread_id.as_deref(), req.regenerate)
        .await
    {
        Ok(generated) => Json(SummarizeResponse {
            parsed_output: generated.value.summary.clone(),
            summary: generated.value,
            model_response: generated.model_response,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn quiz(State(state): State<Arc<AppState>>, Json(req): Json<VideoRequest>) -> Response {
    match state
        .orchestrator
        .quiz(&req.input_url, req.thread_id.as_deref(), req.regenerate)
        .await
    {
        Ok(generated) => Json(QuizResponse {
            response: generated.value,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn topics(State(state): State<Arc<AppState>>, Json(req): Json<VideoRequest>) -> Response {
    match state
        .orchestrator
        .topics(&req.input_url, req.thread_id.as_deref(), req.regenerate)
        .await
    {
        Ok(generated) => Json(TopicsResponse {
            topics: generated.value,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{orchestrator, CannedModel, StubFetcher};
    use crate::transcript::TranscriptSegment;

    const SUMMARY: &str = r#"{"title": "Intro", "overview": "An intro.", "key_points": [],
        "main_topics": [{"topic": "Intro", "timestamp": 0.0}], "duration_summary": "Brief."}"#;

    fn state(reply: &str) -> Arc<AppState> {
        let fetcher = Arc::new(StubFetcher::new(vec![TranscriptSegment::new("intro", 0.0, 3.0)]));
        Arc::new(AppState {
            orchestrator: orchestrator(fetcher, Arc::new(CannedModel::new(reply))),
        })
    }

    fn request(url: &str) -> Json<VideoRequest> {
        Json(VideoRequest {
            input_url: url.to_string(),
            thread_id: None,
            regenerate: false,
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_summarize_endpoint() {
        let response = summarize(
            State(state(SUMMARY)),
            request("https://www.youtube.com/watch?v=abc12345678"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["summary"]["title"], "Intro");
        assert_eq!(body["summary"]["total_segments"], 1);
        assert_eq!(body["parsed_output"]["main_topics"][0]["topic"], "Intro");
        assert_eq!(body["model_response"], SUMMARY);
    }

    #[tokio::test]
    async fn test_invalid_url_is_bad_request() {
        let response = quiz(State(state("{}")), request("not a video")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("not a video"));
    }

    #[tokio::test]
    async fn test_serve_requires_api_key() {
        std::env::remove_var("OPENAI_API_KEY");
        let err = run_serve(Some("127.0.0.1".to_string()), Some(0), Settings::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_malformed_model_output_is_bad_gateway() {
        let response = topics(
            State(state("no json")),
            request("https://youtu.be/abc12345678"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
