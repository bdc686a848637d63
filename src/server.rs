use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::browser::BrowserSession;
use crate::flow::orchestrator::{self, EngineContext};
use crate::flow::{FlowConfig, RunResult};

/// Everything a request handler needs: the shared browser plus the
/// engine-wide context.
pub struct EngineState {
    pub session: BrowserSession,
    pub context: EngineContext,
}

/// Build the engine's HTTP surface: `POST /` runs a flow, `/resources`
/// serves artifacts, CORS admits every origin, anything else on `/` gets a
/// method-not-allowed envelope.
pub fn router(state: Arc<EngineState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::POST,
            Method::GET,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/", post(run_flow).fallback(method_not_allowed))
        .nest_service(
            "/resources",
            ServeDir::new(state.context.dirs.resources.clone()),
        )
        .layer(cors)
        .with_state(state)
}

/// Decode the flow request and hand it to the orchestrator. Malformed
/// bodies are the one fatal request error: they answer 400 with the
/// decoder's text.
async fn run_flow(State(state): State<Arc<EngineState>>, body: String) -> Response {
    let request: FlowConfig = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let result = orchestrator::run_flow(&state.session, &state.context, request).await;
    Json(result).into_response()
}

async fn method_not_allowed() -> Json<RunResult> {
    Json(RunResult {
        code: 400,
        message: "Method not allowed for this request".to_string(),
        ..Default::default()
    })
}
