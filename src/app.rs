use crate::config::Config;
use crate::error::ProxyError;
use crate::models::{MovieDetails, MoviesResponse};
use crate::tmdb::{CatalogError, TmdbApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const POPULAR_FAILED: &str = "Failed to fetch popular movies";
const DETAILS_FAILED: &str = "Failed to fetch movie details";
const SEARCH_FAILED: &str = "Failed to search movies";

#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured.
    pub tmdb: Option<Arc<dyn TmdbApi>>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let tmdb = match &config.tmdb_api_key {
            Some(key) => {
                let client: Arc<dyn TmdbApi> =
                    Arc::new(TmdbClient::new(key.clone(), config.tmdb_base_url.clone())?);
                Some(client)
            }
            None => None,
        };
        Ok(Self { tmdb })
    }

    fn catalog(&self) -> Result<&Arc<dyn TmdbApi>, ProxyError> {
        self.tmdb.as_ref().ok_or_else(|| {
            error!("API Key not found");
            ProxyError::MissingApiKey
        })
    }
}

/// Pairs keep repeated keys, so `?q=a&q=b` resolves to the first `q`.
type QueryPairs = Vec<(String, String)>;

pub async fn run_server(config: Config) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/movie", get(list_popular))
        .route("/api/movies/", get(details_without_id))
        .route("/api/movies/search", get(search))
        .route("/api/movies/:id", get(movie_details))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn list_popular(State(state): State<AppState>) -> Result<Json<MoviesResponse>, ProxyError> {
    let tmdb = state.catalog()?;
    let movies = tmdb
        .popular_movies()
        .await
        .map_err(|e| catalog_failure(e, POPULAR_FAILED, false))?;
    info!("Serving {} popular movies", movies.len());
    Ok(Json(MoviesResponse { movies }))
}

async fn details_without_id() -> ProxyError {
    warn!("Rejecting details request without a movie id");
    ProxyError::Validation("Movie ID is required")
}

async fn movie_details(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<MovieDetails>, ProxyError> {
    let id = match &id {
        Ok(Path(id)) => id.trim(),
        Err(rejection) => {
            warn!("Unreadable movie id: {}", rejection.body_text());
            ""
        }
    };
    if id.is_empty() {
        warn!("Rejecting details request without a movie id");
        return Err(ProxyError::Validation("Movie ID is required"));
    }
    let tmdb = state.catalog()?;
    let details = tmdb
        .movie_details(id)
        .await
        .map_err(|e| catalog_failure(e, DETAILS_FAILED, true))?;
    info!(movie_id = details.id(), "Serving movie details");
    Ok(Json(details))
}

async fn search(
    State(state): State<AppState>,
    params: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<Json<MoviesResponse>, ProxyError> {
    let params = match params {
        Ok(Query(pairs)) => pairs,
        Err(rejection) => {
            warn!("Unreadable search query: {}", rejection.body_text());
            Vec::new()
        }
    };
    let query = params
        .iter()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.trim())
        .unwrap_or_default();
    if query.is_empty() {
        warn!("Rejecting search without a query");
        return Err(ProxyError::Validation("Query parameter is required"));
    }
    let tmdb = state.catalog()?;
    let movies = tmdb
        .search_movies(query)
        .await
        .map_err(|e| catalog_failure(e, SEARCH_FAILED, true))?;
    info!(query = %query, "Search returned {} movies", movies.len());
    Ok(Json(MoviesResponse { movies }))
}

/// Popular listings always report 500; details and search pass the upstream
/// status through, which is what the existing browser client expects.
fn catalog_failure(err: CatalogError, message: &'static str, forward_status: bool) -> ProxyError {
    error!("{}: {}", message, err);
    match err {
        CatalogError::Status(status) if forward_status => ProxyError::Upstream { status, message },
        CatalogError::Status(_) => ProxyError::Upstream {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        },
        CatalogError::Request(_) | CatalogError::Decode(_) => ProxyError::Internal(message),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
