//! Tariff catalog: rate types, rates, margins, commissions and cost concepts.
//!
//! The catalog is loaded per energy type from the backoffice database and
//! served from an in-memory snapshot.

pub mod catalog;
pub mod models;
pub mod queries;
pub mod responses;
pub mod routes;
pub mod rows;

pub use catalog::TariffCatalog;
pub use routes::router;
