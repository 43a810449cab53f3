//! Prompt store HTTP server.
//!
//! JSON endpoints for creating prompts and responses, fetching a prompt with
//! its responses, and semantic search. Backend error details are logged and
//! never returned; callers get a generic message per route.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::{CreatedPrompt, CreatedResponse, PromptWithResponses, SearchResults, ServerConfig};
use crate::services::{IngestionService, RetrievalService};

/// Request to create a prompt.
#[derive(Debug, Deserialize)]
pub struct CreatePromptRequest {
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Request to attach a response to a prompt.
#[derive(Debug, Deserialize)]
pub struct CreateResponseRequest {
    pub text: String,
}

/// Request for semantic search.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub text: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared state for the prompt HTTP server.
struct AppState {
    ingestion: IngestionService,
    retrieval: RetrievalService,
}

/// Prompt store HTTP server.
pub struct PromptsHttpServer {
    config: ServerConfig,
    ingestion: IngestionService,
    retrieval: RetrievalService,
}

impl PromptsHttpServer {
    pub fn new(ingestion: IngestionService, retrieval: RetrievalService, config: ServerConfig) -> Self {
        Self {
            config,
            ingestion,
            retrieval,
        }
    }

    /// Build the router.
    pub fn build_router(self) -> Router {
        let enable_cors = self.config.enable_cors;
        let state = Arc::new(AppState {
            ingestion: self.ingestion,
            retrieval: self.retrieval,
        });

        let app = Router::new()
            .route("/api/prompts", post(create_prompt))
            .route("/api/prompts/search", post(search_prompts))
            .route("/api/prompts/{id}", get(get_prompt))
            .route("/api/prompts/{id}/responses", post(create_response))
            .route("/health", get(health_check))
            .with_state(state);

        if enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.config.host, self.config.port).parse()
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(
        self,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self.addr()?;
        let router = self.build_router();

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Hors-Texte HTTP server listening on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

// Handler functions

async fn health_check() -> &'static str {
    "OK"
}

async fn create_prompt(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreatePromptRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedPrompt>), ApiError> {
    let Json(req) = body.map_err(bad_json)?;

    state
        .ingestion
        .create_prompt(req.title, req.text)
        .await
        .map(|created| (StatusCode::CREATED, Json(created)))
        .map_err(|e| api_error(&e, "Failed to create prompt", "CREATE_PROMPT_ERROR"))
}

async fn create_response(
    State(state): State<Arc<AppState>>,
    Path(prompt_id): Path<String>,
    body: Result<Json<CreateResponseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let prompt_id = Uuid::parse_str(&prompt_id).map_err(|_| {
        validation_error(format!("invalid prompt id: {}", prompt_id))
    })?;
    let Json(req) = body.map_err(bad_json)?;

    state
        .ingestion
        .create_response(prompt_id, req.text)
        .await
        .map(|created| (StatusCode::CREATED, Json(created)))
        .map_err(|e| api_error(&e, "Failed to create response", "CREATE_RESPONSE_ERROR"))
}

async fn get_prompt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PromptWithResponses>, ApiError> {
    // An id that is not a UUID can never have been issued.
    let Ok(id) = Uuid::parse_str(&id) else {
        return Err(not_found());
    };

    state
        .retrieval
        .get_prompt(id)
        .await
        .map(Json)
        .map_err(|e| api_error(&e, "Failed to retrieve prompt", "GET_PROMPT_ERROR"))
}

async fn search_prompts(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResults>, ApiError> {
    let Json(req) = body.map_err(bad_json)?;

    state
        .retrieval
        .search_prompts(&req.text, req.limit)
        .await
        .map(Json)
        .map_err(|e| api_error(&e, "Failed to search prompts", "SEARCH_ERROR"))
}

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Prompt not found".to_string(),
            code: "NOT_FOUND".to_string(),
        }),
    )
}

fn validation_error(message: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message,
            code: "VALIDATION_ERROR".to_string(),
        }),
    )
}

fn bad_json(rejection: JsonRejection) -> ApiError {
    validation_error(rejection.body_text())
}

/// Map a pipeline error to a status. Only client errors carry their message.
fn api_error(err: &DomainError, message: &str, code: &str) -> ApiError {
    match err {
        DomainError::BlockNotFound(_) => not_found(),
        DomainError::ValidationFailed(msg) => validation_error(msg.clone()),
        other => {
            tracing::error!(error = %other, "{}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: message.to_string(),
                    code: code.to_string(),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_errors_are_generic() {
        let (status, Json(body)) = api_error(
            &DomainError::EmbeddingFailed("secret upstream detail".to_string()),
            "Failed to create prompt",
            "CREATE_PROMPT_ERROR",
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Failed to create prompt");
        assert!(!body.error.contains("secret"));
    }

    #[test]
    fn test_client_errors_keep_status() {
        let (status, _) = api_error(&DomainError::BlockNotFound(Uuid::nil()), "x", "X");
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, Json(body)) = api_error(&DomainError::ValidationFailed("text cannot be empty".to_string()), "x", "X");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "text cannot be empty");
    }
}
