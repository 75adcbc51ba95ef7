use async_trait::async_trait;

use crate::errors::ServiceError;

/// Business operations every domain service offers to the generic CRUD surface.
///
/// `Rq` is the caller-supplied payload for create/update, `Rs` the representation
/// handed back. Ids reaching these methods are already known to be positive.
#[async_trait]
pub trait CrudService<Rq, Rs>: Send + Sync
where
    Rq: Send + 'static,
    Rs: Send + 'static,
{
    /// All resources, ordered by id.
    async fn list(&self) -> Result<Vec<Rs>, ServiceError>;

    async fn get_by_id(&self, id: i64) -> Result<Rs, ServiceError>;

    async fn create(&self, request: Rq) -> Result<Rs, ServiceError>;

    async fn update(&self, request: Rq, id: i64) -> Result<Rs, ServiceError>;

    /// Remove and return the resource. Fails with `Conflict` while other entities reference it.
    async fn delete(&self, id: i64) -> Result<Rs, ServiceError>;

    /// Domain-specific: whether an entity related to `id` is known elsewhere
    /// (for rooms and guests, whether the reservations service references it).
    /// Not routed by the generic handler.
    async fn related_exists(&self, id: i64) -> Result<bool, ServiceError>;
}
