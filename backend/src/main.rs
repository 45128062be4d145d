use clap::Parser;
use dare_backend::config::Config;
use dare_backend::rooms::RoomHub;
use dare_backend::store::{FileRoomStore, MemoryRoomStore, RoomStore};
use dare_backend::{app, AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn serve<S: RoomStore>(config: &Config, store: S) -> std::io::Result<()> {
    let hub = RoomHub::with_seed(store, config.channel_capacity, config.seed);
    let app = app(AppState::new(hub));
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "listening");
    axum::serve(listener, app).await
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::parse();
    let result = match &config.persist_path {
        Some(path) => {
            let store = FileRoomStore::open(path).await;
            info!(path = %path.display(), rooms = store.len().await, "room directory loaded");
            serve(&config, store).await
        }
        None => serve(&config, MemoryRoomStore::new()).await,
    };

    if let Err(err) = result {
        error!(%err, "server stopped");
        std::process::exit(1);
    }
}
