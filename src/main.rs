use std::{net::SocketAddr, sync::Arc};

use stagehand::{
    common::{
        banner::{BuildInfo, print_banner},
        logger,
        types::{AnyResult, now_ms},
    },
    configs::Config,
    controls::{ControlRenderer, QueuePaginator, SessionRouter, Synchronizer},
    messaging::DiscordTransport,
    playback::SnapshotStore,
    server::{AppState, SessionRegistry},
    transport,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> AnyResult<()> {
    print_banner(&BuildInfo::default());

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };
    logger::init(&config);

    let store = Arc::new(SnapshotStore::new());
    let discord = Arc::new(DiscordTransport::new(&config.discord)?);
    let synchronizer = Arc::new(Synchronizer::new(
        store.clone(),
        discord,
        ControlRenderer::new(&config.controls),
    ));
    let registry = Arc::new(SessionRegistry::new(
        synchronizer,
        config.controls.refresh_interval(),
    ));

    let (events_tx, events_rx) = flume::unbounded();
    let router = Arc::new(SessionRouter::new(registry.clone()));
    let router_task = tokio::spawn(router.run(events_rx));

    let address: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = Arc::new(AppState {
        paginator: QueuePaginator::from_config(&config.controls),
        config,
        registry: registry.clone(),
        store,
        events: events_tx,
        started_at: now_ms(),
    });

    let app = transport::http_server::router(state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Stagehand listening on {}", address);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("HTTP server stopped: {}", e);
    }

    router_task.abort();

    info!("removing {} live control message(s)", registry.len());
    registry.shutdown_all().await;
    info!("Stagehand stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let term = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = term => {},
    }

    warn!("shutdown signal received");
}
