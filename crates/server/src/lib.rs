pub mod errors;
pub mod extract;
pub mod crud;
pub mod observability;
pub mod routes;
pub mod startup;

pub use startup::run;
