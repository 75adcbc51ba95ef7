use axum::{
    extract::State,
    http::{Method, Uri},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::{
    ServiceError,
    guests::{GuestRequest, GuestResponse, GuestService},
    rooms::{RoomRequest, RoomResponse, RoomService},
    CrudService,
};

use crate::crud::CrudController;
use crate::errors::{panic_response, ApiError};
use crate::extract::PositiveId;
use crate::observability;

pub type RoomController = CrudController<RoomRequest, RoomResponse, RoomService>;
pub type GuestController = CrudController<GuestRequest, GuestResponse, GuestService>;

#[derive(Clone)]
pub struct AppState {
    pub rooms: RoomController,
    pub guests: GuestController,
}

#[derive(Serialize, Debug)]
pub struct ReservedStatus {
    pub id: i64,
    pub reserved: bool,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (axum::http::StatusCode, String) {
    observability::encode_metrics()
}

/// Whether the reservations service references the room; reached on the concrete service.
async fn room_reserved(State(state): State<AppState>, PositiveId(id): PositiveId) -> Result<Json<ReservedStatus>, ApiError> {
    let reserved = state.rooms.service().related_exists(id).await?;
    Ok(Json(ReservedStatus { id, reserved }))
}

async fn guest_reserved(State(state): State<AppState>, PositiveId(id): PositiveId) -> Result<Json<ReservedStatus>, ApiError> {
    let reserved = state.guests.service().related_exists(id).await?;
    Ok(Json(ReservedStatus { id, reserved }))
}

/// Unmatched path: answered like any other lookup miss.
async fn route_not_found(uri: Uri) -> ApiError {
    ApiError(ServiceError::NotFound(format!("no route for {}", uri.path())))
}

/// Known path, unsupported method: goes through the catch-all.
async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError(ServiceError::Other(anyhow::anyhow!(
        "método {method} no soportado para {}",
        uri.path()
    )))
}

/// Build the application router: one generic CRUD surface per domain plus health and metrics.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let rooms = state
        .rooms
        .clone()
        .router::<AppState>()
        .route("/:id/reserved", get(room_reserved));
    let guests = state
        .guests
        .clone()
        .router::<AppState>()
        .route("/:id/reserved", get(guest_reserved));

    let router = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .nest("/rooms", rooms)
        .nest("/guests", guests)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);
    with_layers(router, cors)
}

/// Panic, CORS and trace layers shared by every route.
pub fn with_layers(router: Router, cors: CorsLayer) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx responses are logged at ERROR
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
