//! tally gateway
//!
//! - Counts requests per minute, resynchronized across restarts
//! - Tracks a rolling response-time average per route
//! - Snapshots state to disk on view failure and on shutdown

use tracing_subscriber::{fmt, EnvFilter};

use tally_core::StoreCell;
use tally_gateway::{app_state, config, context::Context, router};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "tally.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen = cfg.server.listen_addr().expect("server.listen must be a valid SocketAddr");

    let stores = StoreCell::new();
    let ctx = Context::open(stores.instance(), &cfg.state);

    let state = app_state::AppState::new(ctx.clone()).expect("app state init failed");
    let app = router::build_router(state.clone());

    tracing::info!(%listen, rpm = ctx.rpm(), "tally-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .expect("server failed");

    ctx.shutdown();
    match ctx.flush() {
        Ok(()) => tracing::info!(path = %ctx.persistence().path().display(), "state saved"),
        Err(e) => tracing::error!(error = %e, "state flush on shutdown failed"),
    }
}

async fn shutdown_signal(state: app_state::AppState) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    state.set_draining();
    tracing::info!("interrupt received, draining and saving state");
}
