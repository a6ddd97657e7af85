//! Saving-study engine.
//!
//! Turns a client's consumption profile into a ranked list of priced rate
//! suggestions and tracks the study through to the accepted offer.

pub mod calculators;
pub mod eligibility;
pub mod models;
pub mod profile;
pub mod requests;
pub mod resolver;
pub mod responses;
pub mod routes;
pub mod services;
pub mod store;

// Re-export commonly used items
pub use calculators::round_money;
pub use models::{SavingStudy, StudyState, SuggestedRate};
pub use routes::router;
pub use services::{EngineParams, StudyService, SuggestedRateFilter};
pub use store::StudyStore;
