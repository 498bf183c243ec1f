//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! [`start_server`] loads configuration, prepares the database, builds the
//! chat hub and serves the router until Ctrl+C or SIGTERM. On shutdown every
//! live chat session is closed before the listener stops.

// region: --- Imports
use crate::chat::ChatHub;
use crate::handlers;
use crate::middleware::{log_requests, stamp_req, RequestStamp};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::{routing::get, Json, Router};
use lib_core::{create_pool, Config, DbPool};
use lib_utils::{get_env_or, get_env_parse_or};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub chat: Arc<ChatHub>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let chat = Arc::new(ChatHub::from_config(&config));
        Self { db, config, chat }
    }
}

impl axum::extract::FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ChatHub> {
    fn from_ref(state: &AppState) -> Self {
        state.chat.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
const DEFAULT_CLIENT_ORIGINS: [&str; 2] = ["http://client:3000", "http://localhost:3000"];

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Bind address (e.g., "localhost:3001")
    pub bind_address: String,
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
    /// Database migrations path
    pub migrations_path: &'static str,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "localhost:3001".to_string(),
            allowed_origins: DEFAULT_CLIENT_ORIGINS.iter().map(|o| o.to_string()).collect(),
            migrations_path: "./migrations",
        }
    }
}

impl ServerConfig {
    /// Read `API_HOST`, `PORT` and `CLIENT_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        let host = get_env_or("API_HOST", "localhost");
        let port: u16 = get_env_parse_or("PORT", 3001)?;

        let mut allowed_origins = Vec::new();
        if let Ok(client_url) = lib_utils::get_env("CLIENT_URL") {
            allowed_origins.push(client_url);
        }
        for origin in DEFAULT_CLIENT_ORIGINS {
            if !allowed_origins.iter().any(|o| o == origin) {
                allowed_origins.push(origin.to_string());
            }
        }

        Ok(Self {
            bind_address: format!("{}:{}", host, port),
            allowed_origins,
            ..Self::default()
        })
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - The tracing subscriber cannot be installed
/// - Configuration loading or validation fails
/// - Database connection or migrations fail
/// - Server binding fails
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_level = get_env_or("LOG_LEVEL", "info").to_lowercase();
    let filter = match log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => tracing_subscriber::EnvFilter::new(&log_level),
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global tracing subscriber: {}", e))?;

    info!(" CHATGENIUS BACKEND STARTING");
    info!(" Log level: {}", log_level);

    info!("Loading configuration...");
    let app_config = Config::from_env()?;
    app_config.validate()?;
    info!(
        database_url = %app_config.database_url,
        responder_delay_ms = app_config.responder_delay_ms,
        guest_name_range = app_config.guest_name_range,
        "Configuration loaded"
    );

    ensure_sqlite_dir(&app_config.database_url)?;

    info!("Connecting to database...");
    let pool = create_pool(&app_config.database_url).await?;

    info!(" Running database migrations from: {}", config.migrations_path);
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(config.migrations_path)).await?;
    migrator.run(&pool).await?;
    info!(" Migrations complete");

    let state = AppState::new(pool, app_config);
    let hub = Arc::clone(&state.chat);
    let app = create_router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    info!(" SERVER READY: http://{}", config.bind_address);
    log_server_info();

    // ConnectInfo is required by the WebSocket handler
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(hub))
        .await?;

    info!(" Server stopped");
    Ok(())
}

/// Create the parent directory of a file-backed SQLite database.
fn ensure_sqlite_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let db_path = rest.trim_start_matches("//");
    let db_path = db_path.split('?').next().unwrap_or(db_path);

    if db_path.is_empty() || db_path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            info!("Created database directory: {:?}", parent);
        }
    }
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM, after telling every chat session to close.
async fn shutdown_signal(hub: Arc<ChatHub>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }

    warn!(" Shutting down, closing chat sessions");
    hub.shutdown();
}

/// Create the main application router with all routes
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/api/health", get(handlers::health::health))
        .route("/api/participants", get(handlers::participants::list_participants))
        .route("/api/ws/chat", get(handlers::websocket::chat_websocket))
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route - returning 404");
            (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
        })
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_failure(|error: tower_http::classify::ServerErrorsFailureClass, latency: std::time::Duration, _span: &tracing::Span| {
                    tracing::error!(
                        error = ?error,
                        latency_ms = latency.as_millis() as u64,
                        "[HTTP FAILURE]"
                    );
                }),
        )
        // Outermost so the stamp is visible to the trace span and the logger
        .layer(axum::middleware::from_fn(stamp_req))
        .layer(cors)
}

/// Log server information
fn log_server_info() {
    info!(" CHAT:");
    info!("   • GET  /api/ws/chat (WebSocket)");
    info!("   • GET  /api/participants");
    info!(" HEALTH:");
    info!("   • GET  /");
    info!("   • GET  /api/health");
}
// endregion: --- Server Setup

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_router(AppState::new(pool, Config::default()), &ServerConfig::default().allowed_origins)
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_banner() {
        let (status, headers, body) = fetch(test_app().await, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ChatGenius Server Running");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_health_route() {
        let (status, _, body) = fetch(test_app().await, "/api/health").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["database"], "connected");
    }

    #[tokio::test]
    async fn test_participants_route_lists_responder() {
        let (status, _, body) = fetch(test_app().await, "/api/participants").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["displayName"], "AI Assistant");
        assert_eq!(json[0]["isSynthetic"], true);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, _, body) = fetch(test_app().await, "/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, r#"{"error":"Not Found"}"#);
    }

    #[test]
    fn test_ensure_sqlite_dir_skips_memory() {
        assert!(ensure_sqlite_dir("sqlite::memory:").is_ok());
        assert!(ensure_sqlite_dir("postgres://localhost/db").is_ok());
    }
}
