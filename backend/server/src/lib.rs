//! Documentation of a calorie tracking backend.
//!
//! # Overview
//! - Food entries (dish, calories, fat, ingredients) live in one collection
//! - Every route is a one-to-one mapping from an HTTP verb to a single document operation
//! - No request touches more than one document, Redis gives us single document atomicity
//! - Every storage call is bounded by `REQUEST_TIMEOUT_SECS`, no retries
//!
//!
//!
//! # Routes
//!
//! | Verb | Path | Body | Response |
//! |------|------|------|----------|
//! | POST | `/entry/create` | entry fields | created entry |
//! | GET | `/entries` | | all entries |
//! | GET | `/entry/{id}` | | entry |
//! | GET | `/ingredient/{ingredient}` | | entries listing that exact ingredient |
//! | PUT | `/entry/update/{id}` | any subset of entry fields | `{"modifiedCount": n}` |
//! | PUT | `/ingredient/update/{id}` | `{"ingredients": [...]}` | `{"modifiedCount": n}` |
//! | DELETE | `/entry/delete/{id}` | | deleted count |
//!
//! Errors come back as `{"error": "..."}`. Bad ids, bad JSON and failed validation are 400,
//! missing entries 404, storage failures 500, timeouts 504.
//!
//!
//!
//! # Environment
//! - `PORT`: default 8000
//! - `REDIS_URL`: default `redis://127.0.0.1:6379`
//! - `REQUEST_TIMEOUT_SECS`: default 10
//! - `STORE_BACKEND`: `redis` or `memory`, default `redis`
//! - `RUST_LOG`: tracing filter, e.g. `server=debug,tower_http=info`
//!
//!
//!
//! # Setup
//!
//! Run against a local Redis.
//! ```sh
//! docker run -d -p 6379:6379 redis:7
//! cargo run -p calories
//! ```
//!
//! Run without Redis.
//! ```sh
//! STORE_BACKEND=memory cargo run -p calories
//! ```
//!
//! Smoke test a running server.
//! ```sh
//! cargo run -p tester -- http://localhost:8000
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{delete, get, post, put},
};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod entry;
pub mod error;
pub mod memory;
pub mod repository;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use config::Config;
use error::ServerError;
use routes::{
    create_handler, delete_handler, get_handler, ingredient_handler, list_handler,
    update_handler, update_ingredients_handler,
};
use state::AppState;

pub async fn start_server() -> Result<(), ServerError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(12 * 60 * 60));

    Router::new()
        .route("/entry/create", post(create_handler))
        .route("/entries", get(list_handler))
        .route("/entry/{id}", get(get_handler))
        .route("/ingredient/{ingredient}", get(ingredient_handler))
        .route("/entry/update/{id}", put(update_handler))
        .route("/ingredient/update/{id}", put(update_ingredients_handler))
        .route("/entry/delete/{id}", delete(delete_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
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
}
