use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use serde::{de::DeserializeOwned, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::{
    guests::GuestService,
    remote::{HttpReservationClient, ReservationClient, ServiceResolver, StaticServiceResolver},
    rooms::RoomService,
    storage::EntityStore,
};

use crate::crud::CrudController;
use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Config file first; environment variables (`SERVER_HOST`, `SERVER_PORT`, `MS_RESERVAS_URL`, ...) otherwise.
pub fn load_config() -> Result<AppConfig, StartupError> {
    match AppConfig::load_and_validate() {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            warn!(error = %e, "config file unusable, falling back to environment");
            AppConfig::from_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))
        }
    }
}

async fn open_store<V>(data_dir: Option<&str>, file: &str) -> Result<Arc<EntityStore<V>>, StartupError>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    match data_dir {
        Some(dir) => Ok(EntityStore::open(Path::new(dir).join(file)).await?),
        None => Ok(EntityStore::in_memory()),
    }
}

/// Wire stores, the reservations client and both domain services.
pub async fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    let resolver: Arc<dyn ServiceResolver> = Arc::new(StaticServiceResolver::from_config(&cfg.remote));
    let reservations: Arc<dyn ReservationClient> =
        Arc::new(HttpReservationClient::from_config(&cfg.remote, resolver)?);

    let data_dir = cfg.storage.data_dir.as_deref();
    let rooms = RoomService::new(open_store(data_dir, "rooms.json").await?, Arc::clone(&reservations));
    let guests = GuestService::new(open_store(data_dir, "guests.json").await?, reservations);

    Ok(AppState {
        rooms: CrudController::new("room", Arc::new(rooms)),
        guests: CrudController::new("guest", Arc::new(guests)),
    })
}

pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let state = build_state(cfg).await?;
    Ok(routes::build_router(state, build_cors()))
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = load_config()?;
    if !cfg.remote.services.contains_key(configs::RESERVATIONS_SERVICE) {
        warn!(service = configs::RESERVATIONS_SERVICE, "no address configured; deletes will answer 503");
    }
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, data_dir = ?cfg.storage.data_dir, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
