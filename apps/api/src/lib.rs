//! Interview registration API: candidate registrations, interview answers and
//! the HR review workflow, served over HTTP from PostgreSQL.

pub mod config;
pub mod db;
pub mod errors;
pub mod extract;
pub mod models;
pub mod registrations;
pub mod routes;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use routes::build_router;
pub use state::AppState;
