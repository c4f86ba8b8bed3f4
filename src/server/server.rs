use anyhow::{Context, Result};
use std::time::Duration;

use tracing::info;

use axum::{extract::State, middleware, routing::get, Json, Router};
use serde::Serialize;

use super::error::{ApiError, ApiResult};
use super::metrics::run_metrics_server;
use super::{
    auth_routes::make_auth_routes, library_routes::make_library_routes, log_requests,
    state::*, user_routes::make_user_routes, ServerConfig,
};
use crate::library::EntityKind;

#[derive(Serialize)]
struct LibraryCounts {
    pub artists: usize,
    pub albums: usize,
    pub tracks: usize,
}

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub storage: String,
    pub counts: LibraryCounts,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> ApiResult<Json<ServerStats>> {
    let library = &state.library;
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        storage: library.backend_name().to_string(),
        counts: LibraryCounts {
            artists: library.count(EntityKind::Artist)?,
            albums: library.count(EntityKind::Album)?,
            tracks: library.count(EntityKind::Track)?,
        },
    };
    Ok(Json(stats))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

pub fn make_app(
    config: ServerConfig,
    library: GuardedLibraryStore,
    user_manager: GuardedUserManager,
) -> Router {
    let state = ServerState::new(config, library, user_manager);

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let mut app: Router = home_router
        .nest("/auth", make_auth_routes(state.clone()))
        .merge(make_library_routes(state.clone()))
        .merge(make_user_routes(state.clone()))
        .fallback(route_not_found);

    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    app
}

/// Serves the API and the metrics endpoint until either one fails.
pub async fn run_server(
    config: ServerConfig,
    library: GuardedLibraryStore,
    user_manager: GuardedUserManager,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, library, user_manager);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Could not bind port {}", port))?;
    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::try_join!(
        async { axum::serve(listener, app).await.map_err(anyhow::Error::from) },
        run_metrics_server(metrics_port),
    )?;
    Ok(())
}
