use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::contract::CrudService;
use crate::errors::ServiceError;
use crate::remote::ReservationClient;
use crate::storage::{EntityStore, Guarded};
use crate::validation::{self, FieldErrors, Validate};

/// Create/update payload of a room.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoomRequest {
    pub number: String,
    pub kind: String,
    pub price: f64,
    pub capacity: u32,
}

impl Validate for RoomRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errs = FieldErrors::new();
        validation::not_blank(&mut errs, "number", &self.number);
        validation::max_len(&mut errs, "number", &self.number, 10);
        validation::not_blank(&mut errs, "kind", &self.kind);
        validation::max_len(&mut errs, "kind", &self.kind, 40);
        validation::positive_f64(&mut errs, "price", self.price);
        validation::range_u32(&mut errs, "capacity", self.capacity, 1, 10);
        errs.into_result()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoomResponse {
    pub id: i64,
    pub number: String,
    pub kind: String,
    pub price: f64,
    pub capacity: u32,
    pub created_at: DateTime<Utc>,
}

/// Rooms backed by an [`EntityStore`]; deletion is refused while reservations reference the room.
pub struct RoomService {
    store: Arc<EntityStore<RoomResponse>>,
    reservations: Arc<dyn ReservationClient>,
}

impl RoomService {
    pub fn new(store: Arc<EntityStore<RoomResponse>>, reservations: Arc<dyn ReservationClient>) -> Self {
        Self { store, reservations }
    }

}

fn number_taken() -> ServiceError {
    let mut errs = FieldErrors::new();
    errs.push("number", "ya existe una habitación con este número");
    errs.into()
}

#[async_trait]
impl CrudService<RoomRequest, RoomResponse> for RoomService {
    async fn list(&self) -> Result<Vec<RoomResponse>, ServiceError> {
        Ok(self.store.list().await)
    }

    async fn get_by_id(&self, id: i64) -> Result<RoomResponse, ServiceError> {
        self.store.get(id).await.ok_or_else(|| ServiceError::not_found("room", id))
    }

    #[instrument(skip(self, request), fields(number = %request.number))]
    async fn create(&self, request: RoomRequest) -> Result<RoomResponse, ServiceError> {
        let number = request.number.trim().to_string();
        let outcome = self
            .store
            .insert_unless(
                |r| r.number.eq_ignore_ascii_case(&number),
                |id| RoomResponse {
                    id,
                    number: number.clone(),
                    kind: request.kind.trim().to_string(),
                    price: request.price,
                    capacity: request.capacity,
                    created_at: Utc::now(),
                },
            )
            .await?;
        let Guarded::Applied(created) = outcome else {
            return Err(number_taken());
        };
        info!(id = created.id, "room created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    async fn update(&self, request: RoomRequest, id: i64) -> Result<RoomResponse, ServiceError> {
        let number = request.number.trim().to_string();
        let outcome = self
            .store
            .update_unless(
                id,
                |r| r.number.eq_ignore_ascii_case(&number),
                |room| {
                    room.number = number.clone();
                    room.kind = request.kind.trim().to_string();
                    room.price = request.price;
                    room.capacity = request.capacity;
                },
            )
            .await?;
        match outcome {
            Guarded::Applied(room) => Ok(room),
            Guarded::Missing => Err(ServiceError::not_found("room", id)),
            Guarded::Refused => Err(number_taken()),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<RoomResponse, ServiceError> {
        self.get_by_id(id).await?;
        if self.reservations.room_is_present(id).await? {
            return Err(ServiceError::Conflict(format!(
                "No se puede eliminar la habitación {id} porque tiene reservaciones asociadas"
            )));
        }
        let removed = self.store.remove(id).await?.ok_or_else(|| ServiceError::not_found("room", id))?;
        info!(id, "room deleted");
        Ok(removed)
    }

    async fn related_exists(&self, id: i64) -> Result<bool, ServiceError> {
        self.reservations.room_is_present(id).await
    }
}
