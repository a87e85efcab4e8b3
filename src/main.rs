use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod models;
mod validation;

use database::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

#[derive(Parser)]
#[command(name = "netops-api", about = "Inventory tracking API for network infrastructure")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (the default when no subcommand is given)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::config();
    tracing::info!(environment = ?cfg.environment, "starting netops-api");

    let db = Database::connect(&cfg.database)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            db.migrate().await?;
            tracing::info!("migrations applied");
            db.close().await;
        }
        Command::Serve => serve(db).await?,
    }

    Ok(())
}

async fn serve(db: Database) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", config::config().server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    // Migrations run in the background; the server answers (and health
    // reports the degraded state) while the database is unreachable.
    let migrator = db.clone();
    tokio::spawn(async move {
        match migrator.migrate().await {
            Ok(()) => tracing::info!("migrations applied"),
            Err(err) => tracing::error!("Failed to run migrations: {}", err),
        }
    });

    let state = AppState { db };
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth_public_routes())
        .merge(protected_routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
}

/// Everything below here requires a valid bearer token; writes additionally
/// require the admin role.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .merge(site_routes())
        .merge(container_routes())
        .merge(device_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ))
}

fn site_routes() -> Router<AppState> {
    use axum::routing::{post, put};
    use handlers::sites;

    let writes = Router::new()
        .route("/api/sites", post(sites::create_site))
        .route(
            "/api/sites/:id",
            put(sites::update_site).delete(sites::delete_site),
        )
        .route_layer(axum::middleware::from_fn(middleware::require_admin));

    Router::new()
        .route("/api/sites", get(sites::list_sites))
        .route("/api/sites/:id", get(sites::get_site))
        .merge(writes)
}

fn container_routes() -> Router<AppState> {
    use axum::routing::{post, put};
    use handlers::containers;

    let writes = Router::new()
        .route("/api/containers", post(containers::create_container))
        .route(
            "/api/containers/:id",
            put(containers::update_container).delete(containers::delete_container),
        )
        .route_layer(axum::middleware::from_fn(middleware::require_admin));

    Router::new()
        .route("/api/containers", get(containers::list_containers))
        .route("/api/containers/:id", get(containers::get_container))
        .merge(writes)
}

fn device_routes() -> Router<AppState> {
    use axum::routing::{post, put};
    use handlers::devices;

    let writes = Router::new()
        .route("/api/devices", post(devices::create_device))
        .route(
            "/api/devices/:id",
            put(devices::update_device).delete(devices::delete_device),
        )
        .route_layer(axum::middleware::from_fn(middleware::require_admin));

    Router::new()
        .route("/api/devices", get(devices::list_devices))
        .route("/api/devices/:id", get(devices::get_device))
        .merge(writes)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "database": "connected",
                "timestamp": Utc::now().to_rfc3339(),
            })),
        ),
        Err(err) => {
            tracing::error!("Database health check failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "database": "disconnected",
                    "timestamp": Utc::now().to_rfc3339(),
                })),
            )
        }
    }
}
