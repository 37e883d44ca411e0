use analytics::DashboardEngine;
use axum::{
    routing::{get, post},
    Router,
};
use core_types::TopN;
use database::{PriceRepository, PriceStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub store: PriceStore,
    pub engine: DashboardEngine,
    pub default_top_n: TopN,
}

/// The main function to configure and run the web server.
///
/// Tracing is expected to be initialized by the calling binary; this function
/// only attaches the HTTP trace layer.
pub async fn run_server(addr: SocketAddr, default_top_n: TopN) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let db_pool = database::connect().await?;
    let store = PriceStore::new(PriceRepository::new(db_pool));

    let app_state = Arc::new(AppState {
        store,
        engine: DashboardEngine::new(),
        default_top_n,
    });
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    // --- DEFINE THE APPLICATION ROUTES ---
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/filters", get(handlers::get_filter_options))
        .route("/api/dashboard", post(handlers::compute_dashboard))
        .route("/api/cache/invalidate", post(handlers::invalidate_cache))
        .with_state(app_state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http());

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
