// Crypto List - Web Server
// JSON API over one shared reconciliation session

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use crypto_list::config::DEFAULT_CONFIG_FILE;
use crypto_list::{AppConfig, Coin, FilterOption, FilterPanel, Session};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    session: Arc<Session>,
    panel: Arc<Mutex<FilterPanel>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

/// Coin response: business fields plus derived display state
#[derive(Serialize)]
struct CoinResponse {
    name: Option<String>,
    symbol: Option<String>,
    is_new: bool,
    is_active: bool,
    #[serde(rename = "type")]
    coin_type: Option<String>,
    image_key: Option<String>,
    badge_color: crypto_list::BadgeColor,
    show_badge: bool,
}

impl From<Coin> for CoinResponse {
    fn from(coin: Coin) -> Self {
        Self {
            name: coin.name,
            symbol: coin.symbol,
            is_new: coin.is_new,
            is_active: coin.is_active,
            coin_type: coin.coin_type,
            image_key: coin.display.image_key,
            badge_color: coin.display.badge_color,
            show_badge: coin.display.show_badge,
        }
    }
}

#[derive(Serialize)]
struct ListResponse {
    coins: Vec<CoinResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty_message: Option<&'static str>,
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

fn list_response(state: &AppState, coins: Vec<Coin>) -> ListResponse {
    let empty_message = state.session.engine.empty_state().map(|s| s.message());
    ListResponse {
        coins: coins.into_iter().map(CoinResponse::from).collect(),
        empty_message,
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/coins - Currently displayed coins
async fn get_coins(State(state): State<AppState>) -> impl IntoResponse {
    let coins = state.session.engine.displayed();
    let body = list_response(&state, coins);

    match state.session.engine.last_error() {
        Some(e) => (StatusCode::BAD_GATEWAY, Json(ApiResponse::err(body, e))).into_response(),
        None => (StatusCode::OK, Json(ApiResponse::ok(body))).into_response(),
    }
}

/// POST /api/refresh - Reset filters and reload (cache, then network)
async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    reset_panel(&state);

    if let Err(e) = state.session.refresh().await {
        error!(error = %e, "Load task failed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(list_response(&state, Vec::new()), e.to_string())),
        )
            .into_response();
    }

    get_coins(State(state)).await.into_response()
}

/// GET /api/coins/search?q= - Search the displayed list
async fn search_coins(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let coins = state.session.engine.search(&params.q);
    (StatusCode::OK, Json(ApiResponse::ok(list_response(&state, coins))))
}

/// GET /api/filters - Filter options with selection state
async fn get_filters(State(state): State<AppState>) -> impl IntoResponse {
    let options: Vec<FilterOption> = match state.panel.lock() {
        Ok(panel) => panel.options().to_vec(),
        Err(_) => Vec::new(),
    };
    Json(ApiResponse::ok(options))
}

/// POST /api/filters/:index/toggle - Tap a filter option
async fn toggle_filter(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> impl IntoResponse {
    let selected = match state.panel.lock() {
        Ok(mut panel) => {
            if index >= panel.options().len() {
                return (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::err(
                        list_response(&state, Vec::new()),
                        format!("No filter option at index {}", index),
                    )),
                )
                    .into_response();
            }
            panel.toggle(index)
        }
        Err(_) => Vec::new(),
    };

    let coins = state.session.engine.apply_filter(&selected);
    (StatusCode::OK, Json(ApiResponse::ok(list_response(&state, coins)))).into_response()
}

/// POST /api/filters/reset - Deselect every option
async fn reset_filters(State(state): State<AppState>) -> impl IntoResponse {
    let coins = reset_panel(&state);
    (StatusCode::OK, Json(ApiResponse::ok(list_response(&state, coins))))
}

fn reset_panel(state: &AppState) -> Vec<Coin> {
    if let Ok(mut panel) = state.panel.lock() {
        panel.reset();
    }
    state.session.engine.apply_filter(&[])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = AppConfig::load(&config_path)?;
    config.logging.init();

    let session = Arc::new(Session::build(&config, false)?);
    // Detached: requests served before it lands see the cached (or empty) list
    let _initial_load = session.spawn_refresh();

    let state = AppState {
        session,
        panel: Arc::new(Mutex::new(FilterPanel::default())),
    };

    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/coins", get(get_coins))
        .route("/api/coins/search", get(search_coins))
        .route("/api/refresh", post(refresh))
        .route("/api/filters", get(get_filters))
        .route("/api/filters/:index/toggle", post(toggle_filter))
        .route("/api/filters/reset", post(reset_filters))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state);

    let addr = "127.0.0.1:3000";
    info!(addr, "Crypto List server listening");
    println!("🚀 Crypto List server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
