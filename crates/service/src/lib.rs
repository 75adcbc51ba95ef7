//! Service layer shared by the hotel microservices.
//! - `contract` defines what every domain service must offer to the generic CRUD surface.
//! - `errors` is the single failure taxonomy the HTTP boundary normalizes.
//! - `remote` talks to the reservations service by logical name.
//! - `rooms` and `guests` are reference domains built on the in-memory/JSON `storage`.

pub mod errors;
pub mod validation;
pub mod contract;
pub mod remote;
pub mod storage;
pub mod rooms;
pub mod guests;
#[cfg(test)]
pub mod test_support;

pub use contract::CrudService;
pub use errors::ServiceError;
