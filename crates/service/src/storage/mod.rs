//! Storage for the reference domains.
//!
//! A small id-keyed table, in memory or persisted as JSON, standing in for the
//! persistence layer each real microservice brings.

pub mod entity_store;

pub use entity_store::{EntityStore, Guarded};
