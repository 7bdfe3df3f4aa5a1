//! HTTP router, server loop and shared state.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::generator::{self, GeneratorRef};
use crate::store::{self, SharedStore};

use super::goals;
use super::grids as grids_api;
use super::types::*;

pub const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Client-Info, Apikey";

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Produces grid drafts from goal text
    pub generator: GeneratorRef,
    /// Goal persistence
    pub store: SharedStore,
}

impl AppState {
    pub fn new(config: Config, generator: GeneratorRef, store: SharedStore) -> Self {
        Self {
            config,
            generator,
            store,
        }
    }
}

/// Build the application router.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/api/health", get(health))
        .route(
            "/functions/v1/generate-harada-goal",
            post(goals::generate_grid),
        )
        .route("/api/generate", post(goals::generate_grid))
        .route("/api/goals", post(goals::create_goal))
        .route("/api/goals/:id/visibility", put(goals::set_visibility))
        .route("/api/gallery", get(grids_api::gallery))
        .nest("/api/grids", grids_api::routes())
        .layer(cors)
        .layer(middleware::from_fn(cors_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answer any OPTIONS request and stamp the allowed methods and headers on
/// every response.
async fn cors_headers(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    response
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let generator = generator::from_config(&config);
    let store = store::from_config(&config.storage)?;

    tracing::info!(
        "Using {} generator with {} storage",
        generator.name(),
        store.name()
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, generator, store));
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for SIGTERM/SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        generator: state.generator.name().to_string(),
        storage: state.store.name().to_string(),
    })
}
