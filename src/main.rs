// Define data modules
mod config;         // Runtime settings from the environment
mod error;          // Shared error type + HTTP mapping
mod models;         // Data structures (Subject, Timetable, Db, etc.)
mod store;          // Persistent storage (load/save db.json)
mod logic;          // Scoring, allocation and timetable assembly
mod packing;        // Three-pass session packing
mod replan;         // Missed-day reschedule and day locking
mod routes_subjects; // HTTP handlers for subjects & availability
mod routes_plan;    // HTTP handlers for timetable, reschedule & locks

use std::sync::Arc;

// Import axum routing utilities and Router
use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::services::ServeDir; // Used to serve static files (HTML/CSS/JS)
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::PlannerError;

// Shared handler state.
// Writes hold `write_lock` across load -> modify -> save.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    let api = Router::new()
        // subjects
        .route("/subjects", get(routes_subjects::get_subjects).post(routes_subjects::create_subject))
        .route("/subjects/:id", delete(routes_subjects::delete_subject))
        // availability
        .route(
            "/availability",
            get(routes_subjects::get_availability).put(routes_subjects::put_availability),
        )
        // timetable
        .route(
            "/timetable",
            get(routes_plan::get_timetable)
                .post(routes_plan::create_timetable)
                .delete(routes_plan::reset_timetable),
        )
        .route("/timetable/reschedule", post(routes_plan::reschedule))
        // locks
        .route("/locks", get(routes_plan::get_locks))
        .route("/locks/:day/toggle", post(routes_plan::toggle_lock))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .nest_service("/", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<(), PlannerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("revision_planner=info,tower_http=info")),
        )
        .with_target(true)
        .init();

    let config = Config::from_env()?;
    let addr = config.addr;

    info!("Server running at http://{}", addr);
    info!("Static files: {}", config.static_dir.display());
    info!("State file:   {}", config.db_path.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(AppState::new(config))).await?;
    Ok(())
}
