use std::marker::PhantomData;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use service::validation::Validate;
use service::CrudService;
use tracing::info;

use crate::errors::ApiError;
use crate::extract::{PositiveId, ValidatedJson};

/// Generic CRUD surface over one domain service.
///
/// `Rq` is the create/update payload, `Rs` the returned representation and `S` the
/// service all five operations delegate to. The service reference is fixed at
/// construction; ids and bodies are checked by the extractors before any call.
pub struct CrudController<Rq, Rs, S> {
    service: Arc<S>,
    resource: &'static str,
    _payloads: PhantomData<fn(Rq) -> Rs>,
}

impl<Rq, Rs, S> Clone for CrudController<Rq, Rs, S> {
    fn clone(&self) -> Self {
        Self { service: Arc::clone(&self.service), resource: self.resource, _payloads: PhantomData }
    }
}

impl<Rq, Rs, S> CrudController<Rq, Rs, S>
where
    Rq: DeserializeOwned + Validate + Send + 'static,
    Rs: Serialize + Send + 'static,
    S: CrudService<Rq, Rs> + 'static,
{
    pub fn new(resource: &'static str, service: Arc<S>) -> Self {
        Self { service, resource, _payloads: PhantomData }
    }

    /// The concrete service, for domain operations the generic surface does not route.
    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    pub async fn list(&self) -> Result<Json<Vec<Rs>>, ApiError> {
        Ok(Json(self.service.list().await?))
    }

    pub async fn get_by_id(&self, PositiveId(id): PositiveId) -> Result<Json<Rs>, ApiError> {
        Ok(Json(self.service.get_by_id(id).await?))
    }

    pub async fn create(&self, ValidatedJson(request): ValidatedJson<Rq>) -> Result<(StatusCode, Json<Rs>), ApiError> {
        let created = self.service.create(request).await?;
        info!(resource = self.resource, "resource created");
        Ok((StatusCode::CREATED, Json(created)))
    }

    pub async fn update(
        &self,
        PositiveId(id): PositiveId,
        ValidatedJson(request): ValidatedJson<Rq>,
    ) -> Result<Json<Rs>, ApiError> {
        Ok(Json(self.service.update(request, id).await?))
    }

    pub async fn delete(&self, PositiveId(id): PositiveId) -> Result<Json<Rs>, ApiError> {
        let removed = self.service.delete(id).await?;
        info!(resource = self.resource, id, "resource deleted");
        Ok(Json(removed))
    }

    /// `GET /`, `POST /`, `GET|PUT|DELETE /:id`, ready to be nested under a prefix.
    pub fn router<St>(self) -> Router<St>
    where
        St: Clone + Send + Sync + 'static,
    {
        Router::new()
            .route("/", get(list_handler::<Rq, Rs, S>).post(create_handler::<Rq, Rs, S>))
            .route(
                "/:id",
                get(get_handler::<Rq, Rs, S>)
                    .put(update_handler::<Rq, Rs, S>)
                    .delete(delete_handler::<Rq, Rs, S>),
            )
            .with_state(self)
    }
}

async fn list_handler<Rq, Rs, S>(State(c): State<CrudController<Rq, Rs, S>>) -> Result<Json<Vec<Rs>>, ApiError>
where
    Rq: DeserializeOwned + Validate + Send + 'static,
    Rs: Serialize + Send + 'static,
    S: CrudService<Rq, Rs> + 'static,
{
    c.list().await
}

async fn get_handler<Rq, Rs, S>(
    State(c): State<CrudController<Rq, Rs, S>>,
    id: PositiveId,
) -> Result<Json<Rs>, ApiError>
where
    Rq: DeserializeOwned + Validate + Send + 'static,
    Rs: Serialize + Send + 'static,
    S: CrudService<Rq, Rs> + 'static,
{
    c.get_by_id(id).await
}

async fn create_handler<Rq, Rs, S>(
    State(c): State<CrudController<Rq, Rs, S>>,
    body: ValidatedJson<Rq>,
) -> Result<(StatusCode, Json<Rs>), ApiError>
where
    Rq: DeserializeOwned + Validate + Send + 'static,
    Rs: Serialize + Send + 'static,
    S: CrudService<Rq, Rs> + 'static,
{
    c.create(body).await
}

async fn update_handler<Rq, Rs, S>(
    State(c): State<CrudController<Rq, Rs, S>>,
    id: PositiveId,
    body: ValidatedJson<Rq>,
) -> Result<Json<Rs>, ApiError>
where
    Rq: DeserializeOwned + Validate + Send + 'static,
    Rs: Serialize + Send + 'static,
    S: CrudService<Rq, Rs> + 'static,
{
    c.update(id, body).await
}

async fn delete_handler<Rq, Rs, S>(
    State(c): State<CrudController<Rq, Rs, S>>,
    id: PositiveId,
) -> Result<Json<Rs>, ApiError>
where
    Rq: DeserializeOwned + Validate + Send + 'static,
    Rs: Serialize + Send + 'static,
    S: CrudService<Rq, Rs> + 'static,
{
    c.delete(id).await
}
