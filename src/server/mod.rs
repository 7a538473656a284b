use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::post,
    Router,
    Json,
    extract::State,
    response::IntoResponse,
    http::StatusCode,
};
use serde::{ Deserialize, Serialize };
use tower_http::cors::{ Any, CorsLayer };
use log::{ error, info };

use crate::agent::RelayAgent;
use crate::error::RelayError;

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Serialize)]
struct MessageResponse {
    output: Vec<OutputItem>,
}

#[derive(Serialize)]
struct OutputItem {
    content: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct ResetResponse {
    message: String,
}

#[derive(Clone)]
struct AppState {
    agent: Arc<RelayAgent>,
}

pub fn router(agent: Arc<RelayAgent>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/message", post(message_handler))
        .route("/api/reset", post(reset_handler))
        .layer(cors)
        .with_state(AppState { agent })
}

pub async fn start_http_server(
    port: u16,
    agent: Arc<RelayAgent>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", port).parse::<SocketAddr>()?;
    info!("Server running on port {}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(agent).into_make_service()).await?;
    Ok(())
}

async fn message_handler(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>
) -> impl IntoResponse {
    match state.agent.handle_message(&req.message).await {
        Ok(reply) =>
            (
                StatusCode::OK,
                Json(MessageResponse {
                    output: vec![OutputItem { content: reply }],
                }),
            ).into_response(),
        Err(RelayError::Validation(reason)) =>
            (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: reason })).into_response(),
        Err(e) => {
            // Log the real cause; the caller only sees a generic message so
            // internal endpoints and credentials stay server-side.
            error!("Error communicating with watsonx: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to reach the assistant".to_string(),
                }),
            ).into_response()
        }
    }
}

async fn reset_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.agent.handle_reset().await;
    Json(ResetResponse {
        message: "Chat history cleared.".to_string(),
    })
}
