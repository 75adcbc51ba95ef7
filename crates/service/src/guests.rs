use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::contract::CrudService;
use crate::errors::ServiceError;
use crate::remote::ReservationClient;
use crate::storage::EntityStore;
use crate::validation::{self, FieldErrors, Validate};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GuestRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Validate for GuestRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errs = FieldErrors::new();
        validation::not_blank(&mut errs, "name", &self.name);
        validation::max_len(&mut errs, "name", &self.name, 100);
        validation::email(&mut errs, "email", &self.email);
        validation::digits(&mut errs, "phone", &self.phone, 10, 10);
        errs.into_result()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GuestResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

pub struct GuestService {
    store: Arc<EntityStore<GuestResponse>>,
    reservations: Arc<dyn ReservationClient>,
}

impl GuestService {
    pub fn new(store: Arc<EntityStore<GuestResponse>>, reservations: Arc<dyn ReservationClient>) -> Self {
        Self { store, reservations }
    }
}

#[async_trait]
impl CrudService<GuestRequest, GuestResponse> for GuestService {
    async fn list(&self) -> Result<Vec<GuestResponse>, ServiceError> {
        Ok(self.store.list().await)
    }

    async fn get_by_id(&self, id: i64) -> Result<GuestResponse, ServiceError> {
        self.store.get(id).await.ok_or_else(|| ServiceError::not_found("guest", id))
    }

    #[instrument(skip_all)]
    async fn create(&self, request: GuestRequest) -> Result<GuestResponse, ServiceError> {
        let created = self
            .store
            .insert_with(|id| GuestResponse {
                id,
                name: request.name.trim().to_string(),
                email: request.email.trim().to_ascii_lowercase(),
                phone: request.phone.trim().to_string(),
                created_at: Utc::now(),
            })
            .await?;
        info!(id = created.id, "guest created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    async fn update(&self, request: GuestRequest, id: i64) -> Result<GuestResponse, ServiceError> {
        self.store
            .update_with(id, |guest| {
                guest.name = request.name.trim().to_string();
                guest.email = request.email.trim().to_ascii_lowercase();
                guest.phone = request.phone.trim().to_string();
            })
            .await?
            .ok_or_else(|| ServiceError::not_found("guest", id))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<GuestResponse, ServiceError> {
        self.get_by_id(id).await?;
        if self.reservations.guest_is_present(id).await? {
            return Err(ServiceError::Conflict(format!(
                "No se puede eliminar el huésped {id} porque tiene reservaciones asociadas"
            )));
        }
        let removed = self.store.remove(id).await?.ok_or_else(|| ServiceError::not_found("guest", id))?;
        info!(id, "guest deleted");
        Ok(removed)
    }

    async fn related_exists(&self, id: i64) -> Result<bool, ServiceError> {
        self.reservations.guest_is_present(id).await
    }
}
