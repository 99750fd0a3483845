use axum::{
    routing::{delete, get, post},
    Router,
};
use marketplace_backend::{
    config::{get_config, init_config, StoreBackend},
    routes,
    store::{JsonFileStore, MemoryStore, SharedStore, SqliteStore},
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let store: SharedStore = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(JsonFileStore::new(&config.store_path)?),
        StoreBackend::Sqlite => {
            let url = config
                .store_database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("STORE_DATABASE_URL is not set"))?;
            Arc::new(SqliteStore::connect(url).await?)
        }
    };
    info!("Using {:?} store backend", config.store_backend);

    let app_state = AppState::new(store);

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                state.swipe_service.sweep_expired().await;
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route(
            "/api/public/listings",
            get(routes::listings::browse_listings),
        )
        .route(
            "/api/public/listings/:id",
            get(routes::listings::get_public_listing),
        )
        .layer(axum::middleware::from_fn_with_state(
            marketplace_backend::middleware::rate_limit::new_rps_state(config.public_rps),
            marketplace_backend::middleware::rate_limit::rps_middleware,
        ));

    let seeker_api = Router::new()
        .route(
            "/api/swipe/session",
            get(routes::swipe::current_state).post(routes::swipe::start_session),
        )
        .route("/api/swipe/gesture", post(routes::swipe::gesture))
        .route("/api/swipe/act", post(routes::swipe::act))
        .route("/api/swipe/undo", post(routes::swipe::undo))
        .route("/api/swipe/fullscreen", post(routes::swipe::toggle_fullscreen))
        .route(
            "/api/actions/:category",
            get(routes::swipe::list_actioned_listings),
        )
        .route(
            "/api/actions/:category/:id",
            delete(routes::swipe::remove_action),
        )
        .route("/api/points/summary", get(routes::points::get_summary))
        .route("/api/points/history", get(routes::points::get_history))
        .route(
            "/api/applications",
            get(routes::applications::list_my_applications),
        )
        .route(
            "/api/applications/:id/history",
            get(routes::applications::get_status_history),
        )
        .route(
            "/api/applications/:id/messages",
            get(routes::applications::get_thread).post(routes::applications::send_message),
        )
        .route(
            "/api/applications/:id/messages/read",
            post(routes::applications::mark_thread_read),
        )
        .route(
            "/api/applications/:id/messages/unread",
            get(routes::applications::get_unread_count),
        )
        .route(
            "/api/notifications",
            get(routes::notifications::poll_notifications),
        )
        .route(
            "/api/notifications/:id/read",
            post(routes::notifications::mark_notification_read),
        )
        .route(
            "/api/notifications/read-all",
            post(routes::notifications::mark_all_read),
        )
        .layer(axum::middleware::from_fn(
            marketplace_backend::middleware::auth::require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            marketplace_backend::middleware::rate_limit::new_rps_state(config.api_rps),
            marketplace_backend::middleware::rate_limit::rps_middleware,
        ));

    let employer_api = Router::new()
        .route(
            "/api/employer/listings",
            get(routes::listings::list_my_listings).post(routes::listings::create_listing),
        )
        .route(
            "/api/employer/listings/:id",
            axum::routing::patch(routes::listings::update_listing)
                .delete(routes::listings::delete_listing),
        )
        .route(
            "/api/employer/listings/:id/feature",
            post(routes::listings::feature_listing),
        )
        .route(
            "/api/employer/listings/:id/applicants",
            get(routes::applications::list_applicants),
        )
        .route(
            "/api/applications/:id/status",
            post(routes::applications::update_status),
        )
        .layer(axum::middleware::from_fn(
            marketplace_backend::middleware::auth::require_employer,
        ))
        .layer(axum::middleware::from_fn_with_state(
            marketplace_backend::middleware::rate_limit::new_rps_state(config.api_rps),
            marketplace_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(public_api)
        .merge(seeker_api)
        .merge(employer_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
