use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{delete, get, post},
};
use companion_engine::{
    CachedServiceCatalog, ConversationEngine, EngineResponse, FallbackRecommendationProvider,
    InMemoryExpenseLedger, InMemorySessionStore, StaticServiceCatalog,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Clone)]
struct AppState {
    engine: Arc<ConversationEngine>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    session_id: Option<String>,
    user_id: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: String,
    #[serde(flatten)]
    response: EngineResponse,
}

/// Initialize structured JSON tracing based on environment variables
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "companion_service=debug,companion_engine=debug,tower_http=debug".into());

    match log_format.as_str() {
        "pretty" => {
            // Human-readable logging for development
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            // Structured JSON logging for production
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let session_ttl = Duration::from_secs(env_u64("SESSION_TTL_SECS", 1800));
    let store = Arc::new(InMemorySessionStore::with_ttl(session_ttl));

    // Idle sessions are reclaimed by a periodic sweep.
    let sweeper = store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let dropped = sweeper.sweep();
            if dropped > 0 {
                info!(dropped, "swept idle sessions");
            }
        }
    });

    let catalog = Arc::new(CachedServiceCatalog::new(Arc::new(StaticServiceCatalog)));
    let engine = Arc::new(ConversationEngine::new(
        store,
        Arc::new(InMemoryExpenseLedger::new()),
        catalog,
        Arc::new(FallbackRecommendationProvider),
    ));

    let app_state = AppState { engine };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .route("/session/{id}", delete(reset_session))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(correlation_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state);

    let port = env_u64("PORT", 3000);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    info!("Server running on http://0.0.0.0:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    if request.message.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    // First turn without a session id gets a fresh one; the client carries it
    // forward for the rest of the conversation.
    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(
        session_id = %session_id,
        user_id = request.user_id,
        message_length = request.message.len(),
        "Processing chat request"
    );

    let response = state
        .engine
        .process_message(&session_id, request.user_id, &request.message)
        .await;

    Ok(Json(ChatResponse {
        session_id,
        response,
    }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    match state.engine.reset_session(&session_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to reset session");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
